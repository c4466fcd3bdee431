//! Password based key derivation.
//!
//! Argon2id stretches the password and salt into a master secret, HKDF-SHA256
//! then expands that secret into two independent outputs: the cipher key and
//! the seed of the embedding permutation.

use std::fmt::{self, Debug, Formatter};

use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{CipherError, Result, KEY_LEN, SALT_LEN, SEED_LEN};

const CIPHER_KEY_INFO: &[u8] = b"stegvault/v1/cipher-key";
const PERMUTATION_SEED_INFO: &[u8] = b"stegvault/v1/permutation-seed";

/// Argon2id work factor.
///
/// The parameters are not stored inside the carrier, the same values have to
/// be used for hiding and for unveiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes over the memory
    pub iterations: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl KdfParams {
    pub const fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::new(19 * 1024, 2, 1)
    }
}

/// Key material of one session, wiped from memory on drop.
pub struct SessionKeys {
    key: Zeroizing<[u8; KEY_LEN]>,
    seed: Zeroizing<[u8; SEED_LEN]>,
}

impl SessionKeys {
    /// The symmetric key for the payload cipher.
    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// The seed for the embedding permutation.
    pub fn seed(&self) -> &[u8; SEED_LEN] {
        &self.seed
    }
}

impl Debug for SessionKeys {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("key", &"<redacted>")
            .field("seed", &"<redacted>")
            .finish()
    }
}

/// Turns a password plus salt into [`SessionKeys`].
#[derive(Debug, Clone, Default)]
pub struct KeyDerivation {
    params: KdfParams,
}

impl KeyDerivation {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Derive the cipher key and the permutation seed.
    ///
    /// Deterministic for equal password, salt and parameters. Fails only for
    /// an empty password or unusable parameters.
    pub fn derive(&self, password: &[u8], salt: &[u8; SALT_LEN]) -> Result<SessionKeys> {
        if password.is_empty() {
            return Err(CipherError::EmptyPassword);
        }

        let mut master = Zeroizing::new([0u8; KEY_LEN]);
        self.argon()?
            .hash_password_into(password, salt, &mut master[..])
            .map_err(CipherError::KeyDerivation)?;

        let expander = Hkdf::<Sha256>::new(None, &master[..]);
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        expander
            .expand(CIPHER_KEY_INFO, &mut key[..])
            .map_err(|_| CipherError::KeyExpansion)?;
        expander
            .expand(PERMUTATION_SEED_INFO, &mut seed[..])
            .map_err(|_| CipherError::KeyExpansion)?;

        Ok(SessionKeys { key, seed })
    }

    fn argon(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.params.memory_kib,
            self.params.iterations,
            self.params.parallelism,
            Some(KEY_LEN),
        )
        .map_err(CipherError::KeyDerivationParams)?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}
