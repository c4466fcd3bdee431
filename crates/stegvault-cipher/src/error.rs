pub use aes_gcm::Error as AeadError;
pub use argon2::Error as Argon2Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CipherError {
    /// The password was empty, nothing can be derived from it
    #[error("Password must not be empty")]
    EmptyPassword,

    /// The work factor given for the key derivation is not accepted by argon2
    #[error("Key derivation parameter error: {0}")]
    KeyDerivationParams(Argon2Error),

    #[error("Key derivation error: {0}")]
    KeyDerivation(Argon2Error),

    /// Expanding the master secret into key and seed failed
    #[error("Key expansion error")]
    KeyExpansion,

    #[error("Encryption error")]
    Encryption(AeadError),

    /// The authentication tag did not match, either the key is wrong or the data was tampered with
    #[error("Authentication failed, wrong password or tampered data")]
    Authentication,
}
