use std::fmt;

use stegvault_cipher::CipherError;
use stegvault_jpeg::JpegError;
use thiserror::Error;

/// The closed set of failure categories every [`StegError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    UnsupportedFormat,
    CorruptCarrier,
    CapacityExceeded,
    IntegrityFailure,
    IoError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::UnsupportedFormat => "unsupported format",
            ErrorKind::CorruptCarrier => "corrupt carrier",
            ErrorKind::CapacityExceeded => "capacity exceeded",
            ErrorKind::IntegrityFailure => "integrity failure",
            ErrorKind::IoError => "I/O error",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum StegError {
    /// Represents a caller mistake, for example an empty password or an out of range slot
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Represents a carrier whose signature matches none of the supported formats
    #[error("Carrier format is not supported")]
    UnsupportedFormat,

    /// Represents a recognized format that uses a feature we cannot handle, for example a progressive JPEG
    #[error("Carrier uses an unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Represents a carrier that cannot be decoded or carries no valid header
    #[error("Carrier is corrupt: {0}")]
    CorruptCarrier(String),

    /// Represents a payload that does not fit into the carrier
    #[error("Capacity exceeded: {required} slots required but the carrier offers only {available}")]
    CapacityExceeded { required: u64, available: u64 },

    /// Represents an authentication tag mismatch, caused by a wrong password or a modified carrier
    #[error("Integrity check failed, wrong password or tampered carrier")]
    IntegrityFailure,

    /// Represents a failure of the key derivation or cipher backend
    #[error("Cryptography error")]
    Crypto(#[source] CipherError),

    /// Represents a failure to read the carrier or payload.
    #[error("Read error")]
    ReadError { source: std::io::Error },

    /// Represents a failure to write the target file.
    #[error("Write error")]
    WriteError { source: std::io::Error },

    /// Represents all other cases of `std::io::Error`.
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("No carrier set")]
    CarrierNotSet,

    #[error("No target file set")]
    TargetNotSet,

    #[error("No payload set")]
    PayloadNotSet,

    #[error("No password set")]
    PasswordNotSet,
}

impl StegError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StegError::InvalidInput(_)
            | StegError::Crypto(_)
            | StegError::CarrierNotSet
            | StegError::TargetNotSet
            | StegError::PayloadNotSet
            | StegError::PasswordNotSet => ErrorKind::InvalidInput,
            StegError::UnsupportedFormat | StegError::UnsupportedFeature(_) => {
                ErrorKind::UnsupportedFormat
            }
            StegError::CorruptCarrier(_) => ErrorKind::CorruptCarrier,
            StegError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            StegError::IntegrityFailure => ErrorKind::IntegrityFailure,
            StegError::ReadError { .. } | StegError::WriteError { .. } | StegError::IoError(_) => {
                ErrorKind::IoError
            }
        }
    }

    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        StegError::CorruptCarrier(reason.into())
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        StegError::InvalidInput(reason.into())
    }
}

impl From<CipherError> for StegError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::Authentication => StegError::IntegrityFailure,
            CipherError::EmptyPassword => StegError::invalid("password must not be empty"),
            other => StegError::Crypto(other),
        }
    }
}

impl From<JpegError> for StegError {
    fn from(e: JpegError) -> Self {
        match e {
            JpegError::Unsupported { feature } => StegError::UnsupportedFeature(feature),
            other => StegError::CorruptCarrier(other.to_string()),
        }
    }
}

impl From<image::ImageError> for StegError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(source)
                if source.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                StegError::corrupt("image data ends unexpectedly")
            }
            image::ImageError::IoError(source) => StegError::IoError(source),
            image::ImageError::Unsupported(u) => StegError::UnsupportedFeature(u.to_string()),
            other => StegError::CorruptCarrier(other.to_string()),
        }
    }
}
