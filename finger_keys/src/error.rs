//! Application and sink errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use finger_code::TableError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("reading {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("parsing {}: {source}", path.display())]
    Json { path: PathBuf, source: serde_json::Error },

    #[error("configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("window: {0}")]
    Window(String),

    #[error("landmark source: {0}")]
    Source(String),
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("key injection failed: {0}")]
    Inject(String),
}
