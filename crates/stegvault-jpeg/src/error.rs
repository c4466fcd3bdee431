//! Error types of the JPEG transcoder.

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, JpegError>;

#[derive(Error)]
pub enum JpegError {
    /// The data violates the JPEG structure, for example a truncated segment
    #[error("malformed JPEG: {reason}")]
    Malformed { reason: String },

    /// A valid JPEG that uses a coding process we cannot transcode
    #[error("unsupported JPEG feature: {feature}")]
    Unsupported { feature: String },

    /// The entropy coded data ended in the middle of a block
    #[error("unexpected end of entropy coded data")]
    UnexpectedEndOfScan,
}

impl JpegError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        JpegError::Malformed {
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(feature: impl Into<String>) -> Self {
        JpegError::Unsupported {
            feature: feature.into(),
        }
    }
}

impl fmt::Debug for JpegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // same text as Display
        write!(f, "{self}")
    }
}
