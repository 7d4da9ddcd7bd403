//! Output locations: root directory resolution and per-video folders

use crate::config::Config;
use crate::error::OutputError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Pick the root directory all downloads go under.
///
/// A configured `output_dir` wins and is created if missing. Otherwise a
/// `downloads/` directory beside the executable is used when it proves
/// writable, with `~/Downloads/video_xtractor` as the last resort.
pub fn resolve_output_root(config: &Config) -> Result<PathBuf, OutputError> {
    if let Some(dir) = &config.output_dir {
        fs::create_dir_all(dir).map_err(|source| OutputError::CreateFailed {
            dir: dir.display().to_string(),
            source,
        })?;
        return Ok(dir.clone());
    }

    if let Some(dir) = exe_adjacent_downloads() {
        return Ok(dir);
    }

    let home = dirs::home_dir().ok_or(OutputError::NoHomeDir)?;
    let fallback = home.join("Downloads").join("video_xtractor");
    fs::create_dir_all(&fallback).map_err(|source| OutputError::CreateFailed {
        dir: fallback.display().to_string(),
        source,
    })?;
    Ok(fallback)
}

/// `downloads/` beside the executable, if it can actually be written to.
fn exe_adjacent_downloads() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let candidate = exe.parent()?.join("downloads");
    if let Err(e) = fs::create_dir_all(&candidate) {
        debug!("Cannot create {}: {}", candidate.display(), e);
        return None;
    }

    let probe = candidate.join(".write_test");
    match fs::write(&probe, "ok") {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            Some(candidate)
        }
        Err(e) => {
            debug!("{} is not writable: {}", candidate.display(), e);
            None
        }
    }
}

/// Create `root/name`, or `root/name_2`, `root/name_3`, ... if taken.
///
/// The returned directory did not exist before this call; existing folders
/// for the same video are left untouched.
pub fn create_unique_dir(root: &Path, name: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(root)?;

    let first = root.join(name);
    match fs::create_dir(&first) {
        Ok(()) => return Ok(first),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
        Err(e) => return Err(e),
    }

    let mut suffix = 2u32;
    loop {
        let candidate = root.join(format!("{name}_{suffix}"));
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
            Err(e) => return Err(e),
        }
    }
}
