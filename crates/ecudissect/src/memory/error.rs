//! Error types for dump loading and extraction.

use blockfmt::FormatError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while dissecting a dump.
#[derive(Error, Debug)]
pub enum DumpError {
    /// An offset is not backed by the layer.
    #[error("Invalid offset {offset:#x} in layer '{layer_name}': {message}")]
    InvalidOffset {
        layer_name: String,
        offset: u64,
        message: String,
    },

    /// The dump is not the size this layout expects.
    #[error("Dump '{path}' is {actual:#x} bytes, expected {expected:#x}")]
    InvalidDumpSize {
        path: PathBuf,
        actual: u64,
        expected: u64,
    },

    /// Writing an extracted block failed.
    #[error("Failed to write artifact '{path}': {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Address translation or block decoding failed.
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Report serialization failed: {0}")]
    Report(#[from] serde_json::Error),
}

impl DumpError {
    /// Create an InvalidOffset error.
    pub fn invalid_offset(layer_name: impl Into<String>, offset: u64, msg: impl Into<String>) -> Self {
        DumpError::InvalidOffset {
            layer_name: layer_name.into(),
            offset,
            message: msg.into(),
        }
    }

    /// Create an Artifact error.
    pub fn artifact(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DumpError::Artifact {
            path: path.into(),
            source,
        }
    }
}

/// Result type for dump operations.
pub type DumpResult<T> = Result<T, DumpError>;
