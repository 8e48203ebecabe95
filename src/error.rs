use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Failed to open log output {path}: {source}")]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid logger configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to flush log output: {0}")]
    Sync(#[source] io::Error),
}

/// Returned when a level name is not one of debug, info, warn, error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized level: {0:?}")]
pub struct ParseLevelError(pub String);

pub type Result<T> = std::result::Result<T, LoggerError>;
