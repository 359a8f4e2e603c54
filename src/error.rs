//! Error types for the Kohonen3D self-organizing map engine.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Kohonen3D operations.
#[derive(Error, Debug)]
pub enum KohonenError {
    /// A grid extent, input size, epoch count, learning rate or sigma is not positive.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A vector length does not match the configured input size.
    #[error("Dimension mismatch: expected {expected} values, got {actual}")]
    DimensionMismatch {
        /// The configured input size.
        expected: usize,
        /// The length that was supplied.
        actual: usize,
    },

    /// Malformed header or row in a delimited data file.
    #[error("Data format error at line {line}: {message}")]
    DataFormat {
        /// 1-based line number in the file (the header is line 1).
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// Training was requested on a dataset without samples.
    #[error("Empty dataset: nothing to train on")]
    EmptyDataset,

    /// Batch size must be at least one.
    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(usize),

    /// A file could not be opened or created.
    #[error("Resource unavailable: {}: {source}", .path.display())]
    ResourceUnavailable {
        /// The path that could not be opened.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl KohonenError {
    /// Builds a `ResourceUnavailable` error for `path`.
    pub(crate) fn unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KohonenError::ResourceUnavailable {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for Kohonen3D operations.
pub type Result<T> = std::result::Result<T, KohonenError>;

impl From<bincode::Error> for KohonenError {
    fn from(err: bincode::Error) -> Self {
        KohonenError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_context() {
        let err = KohonenError::DataFormat {
            line: 7,
            message: "expected 4 features, got 3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Data format error at line 7: expected 4 features, got 3"
        );

        let err = KohonenError::DimensionMismatch { expected: 784, actual: 10 };
        assert!(err.to_string().contains("784"));
    }

    #[test]
    fn test_unavailable_keeps_path() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = KohonenError::unavailable("data/train.csv", io);
        assert!(err.to_string().contains("data/train.csv"));
    }
}
