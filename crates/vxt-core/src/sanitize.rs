//! Filesystem-safe names for download folders and files

use regex::Regex;

/// Length cap applied to video titles.
pub const MAX_TITLE_LEN: usize = 120;

/// Length cap applied to video identifiers.
pub const MAX_ID_LEN: usize = 40;

const FALLBACK_NAME: &str = "video";

/// Turn arbitrary text into a name safe for any filesystem.
///
/// Characters illegal on Windows (plus `!`) are removed, whitespace runs
/// become a single underscore, `&` becomes `and`, apostrophes vanish and
/// repeated underscores collapse. The result is trimmed of underscores,
/// truncated to `max_len` characters and never empty.
pub fn sanitize_filename(name: &str, max_len: usize) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    let forbidden = Regex::new(r#"[\\/*?:"<>|!]"#).unwrap();
    let whitespace = Regex::new(r"\s+").unwrap();
    let underscores = Regex::new(r"_+").unwrap();

    let cleaned = forbidden.replace_all(trimmed, "");
    let cleaned = whitespace.replace_all(&cleaned, " ");
    let cleaned = cleaned
        .replace(' ', "_")
        .replace('&', "and")
        .replace('\'', "");
    let cleaned = underscores.replace_all(&cleaned, "_");
    let cleaned = cleaned.trim_matches('_');

    if cleaned.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    if cleaned.chars().count() > max_len {
        let cut: String = cleaned.chars().take(max_len).collect();
        return cut.trim_end_matches('_').to_string();
    }

    cleaned.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_forbidden_characters() {
        assert_eq!(sanitize_filename("My Video!", MAX_TITLE_LEN), "My_Video");
        assert_eq!(
            sanitize_filename("a/b\\c:d*e?f\"g<h>i|j", MAX_TITLE_LEN),
            "abcdefghij"
        );
    }

    #[test]
    fn collapses_whitespace_and_underscores() {
        assert_eq!(
            sanitize_filename("  hello   world  ", MAX_TITLE_LEN),
            "hello_world"
        );
        assert_eq!(sanitize_filename("a __ b", MAX_TITLE_LEN), "a_b");
    }

    #[test]
    fn rewrites_ampersand_and_apostrophe() {
        assert_eq!(
            sanitize_filename("Tom & Jerry's", MAX_TITLE_LEN),
            "Tom_and_Jerrys"
        );
    }

    #[test]
    fn falls_back_when_nothing_survives() {
        assert_eq!(sanitize_filename("", MAX_TITLE_LEN), "video");
        assert_eq!(sanitize_filename("   ", MAX_TITLE_LEN), "video");
        assert_eq!(sanitize_filename("???!", MAX_TITLE_LEN), "video");
    }

    #[test]
    fn truncates_and_trims_the_cut() {
        let long = "a".repeat(130);
        assert_eq!(sanitize_filename(&long, MAX_TITLE_LEN).len(), 120);

        let awkward = format!("{}_tail", "b".repeat(119));
        assert_eq!(sanitize_filename(&awkward, MAX_TITLE_LEN), "b".repeat(119));
    }

    #[test]
    fn short_ids_pass_through() {
        assert_eq!(sanitize_filename("abc123", MAX_ID_LEN), "abc123");
        assert_eq!(sanitize_filename("dQw4w9WgXcQ", MAX_ID_LEN), "dQw4w9WgXcQ");
    }

    #[test]
    fn is_idempotent() {
        for input in ["My Video!", "Tom & Jerry's", "  x  ", "a/b", "déjà vu"] {
            let once = sanitize_filename(input, MAX_TITLE_LEN);
            assert_eq!(sanitize_filename(&once, MAX_TITLE_LEN), once);
        }
    }
}
