//! Error types for logrotor

use std::path::PathBuf;

/// logrotor error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Write failed after {written} bytes: {source}")]
    Write {
        written: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to close log file {path}: {source}")]
    Close {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rotation failed after writing {written} bytes: {source}")]
    Rotate {
        written: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Log file is closed")]
    InvalidState,

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Result type alias for logrotor
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::ConfigError(msg.into())
    }

    pub fn layout<S: Into<String>>(msg: S) -> Self {
        Error::InvalidLayout(msg.into())
    }

    /// Bytes that reached the file before the error was raised.
    ///
    /// A failed append may still have written part of the buffer, and a
    /// size-triggered rotation fails only after the whole buffer landed.
    pub fn bytes_written(&self) -> usize {
        match self {
            Error::Write { written, .. } | Error::Rotate { written, .. } => *written,
            _ => 0,
        }
    }

    /// Convert into an `std::io::Error`, keeping the original kind where there is one
    pub fn into_io(self) -> std::io::Error {
        use std::io::ErrorKind;

        match self {
            Error::Open { source, .. }
            | Error::Write { source, .. }
            | Error::Close { source, .. }
            | Error::IoError(source) => source,
            Error::InvalidState => std::io::Error::new(ErrorKind::Other, Error::InvalidState),
            Error::Rotate { source, .. } => source.into_io(),
            other => std::io::Error::new(ErrorKind::InvalidInput, other),
        }
    }
}
