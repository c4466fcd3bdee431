//! # Stegvault Cipher
//!
//! Cryptographic building blocks of stegvault-core:
//! - [`KeyDerivation`] turns a password and a salt into a cipher key and a
//!   permutation seed (Argon2id + HKDF-SHA256)
//! - [`encrypt`] / [`decrypt`] seal the payload with AES-256-GCM
//!
//! ```rust
//! use stegvault_cipher::{decrypt, encrypt, random_nonce, random_salt, KdfParams, KeyDerivation};
//!
//! let salt = random_salt();
//! let keys = KeyDerivation::new(KdfParams::new(64, 1, 1))
//!     .derive(b"hunter2", &salt)
//!     .expect("key derivation failed");
//!
//! let nonce = random_nonce();
//! let sealed = encrypt(keys.key(), &nonce, b"attack at dawn").expect("encryption failed");
//! assert_eq!(decrypt(keys.key(), &nonce, &sealed).unwrap(), b"attack at dawn");
//! ```

use rand::rngs::OsRng;
use rand::RngCore;

mod aead;
pub mod error;
mod kdf;

pub use crate::aead::{decrypt, encrypt};
pub use crate::error::CipherError;
pub use crate::kdf::{KdfParams, KeyDerivation, SessionKeys};

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const KEY_LEN: usize = 32;
pub const SEED_LEN: usize = 32;
pub const TAG_LEN: usize = 16;

pub type Result<T> = std::result::Result<T, CipherError>;

/// Fresh salt from the operating system RNG.
pub fn random_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Fresh nonce from the operating system RNG.
pub fn random_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}
