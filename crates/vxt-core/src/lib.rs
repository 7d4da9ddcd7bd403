//! vxt-core: download pipeline turning video URLs into audio and video derivatives

pub mod config;
pub mod convert;
pub mod error;
pub mod extractor;
pub mod output;
pub mod pipeline;
pub mod sanitize;
pub mod tools;

pub use config::Config;
pub use error::{Result, VxtError};
pub use pipeline::{Pipeline, PipelineOutcome, PipelineStage};
