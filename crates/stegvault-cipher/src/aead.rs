//! AES-256-GCM payload sealing.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use crate::{CipherError, Result, KEY_LEN, NONCE_LEN};

/// Encrypt `plaintext`, the 16 byte authentication tag is appended.
pub fn encrypt(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key))
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(CipherError::Encryption)
}

/// Decrypt and authenticate `ciphertext` as produced by [`encrypt`].
///
/// A wrong key, a wrong nonce and any modified byte all surface as
/// [`CipherError::Authentication`].
pub fn decrypt(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key))
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CipherError::Authentication)
}
