//! Custom error types for imgkit.

use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of an [`Error`], for callers that branch on the
/// kind of failure rather than the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An input violated a documented precondition; nothing was computed.
    Precondition,
    /// The operation was called with input it cannot present.
    Usage,
    /// Reading or writing the filesystem failed.
    Io,
}

/// Main error type for the imgkit library.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to load the font used for figure titles.
    #[error("failed to load font from {path}: {reason}")]
    FontLoad { path: PathBuf, reason: String },

    /// Two images that must share a shape do not.
    #[error("image shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize, usize),
        actual: (usize, usize, usize),
    },

    /// Two images that must share a channel count do not.
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The input cannot be used by the requested operation.
    #[error("usage error: {0}")]
    Usage(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ShapeMismatch { .. }
            | Self::ChannelMismatch { .. }
            | Self::InvalidParameter { .. } => ErrorKind::Precondition,
            Self::Usage(_) => ErrorKind::Usage,
            Self::ImageLoad { .. } | Self::ImageSave { .. } | Self::FontLoad { .. } | Self::Io(_) => {
                ErrorKind::Io
            }
        }
    }

    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for imgkit operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err = Error::ShapeMismatch {
            expected: (2, 2, 3),
            actual: (2, 3, 3),
        };
        assert_eq!(err.kind(), ErrorKind::Precondition);

        assert_eq!(
            Error::ChannelMismatch {
                expected: 3,
                actual: 1
            }
            .kind(),
            ErrorKind::Precondition
        );
        assert_eq!(Error::Usage("no".into()).kind(), ErrorKind::Usage);

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(Error::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_display_mentions_shapes() {
        let err = Error::ShapeMismatch {
            expected: (4, 5, 3),
            actual: (4, 6, 3),
        };
        let msg = err.to_string();
        assert!(msg.contains("(4, 5, 3)"));
        assert!(msg.contains("(4, 6, 3)"));
    }
}
