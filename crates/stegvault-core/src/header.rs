//! Fixed-size header stored in the first slots of every carrier.
//!
//! Layout, all integers big endian:
//!
//! | bytes | field                         |
//! |-------|-------------------------------|
//! | 4     | magic `SVLT`                  |
//! | 1     | version                       |
//! | 16    | salt                          |
//! | 4     | ciphertext length in bytes    |
//! | 12    | nonce                         |

use std::io::{Cursor, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use stegvault_cipher::{NONCE_LEN, SALT_LEN};

use crate::{Result, StegError};

pub const MAGIC: [u8; 4] = *b"SVLT";
pub const VERSION: u8 = 1;
pub const HEADER_LEN: usize = MAGIC.len() + 1 + SALT_LEN + 4 + NONCE_LEN;
/// One slot per header bit.
pub const HEADER_SLOTS: u64 = HEADER_LEN as u64 * 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub salt: [u8; SALT_LEN],
    pub cipher_len: u32,
    pub nonce: [u8; NONCE_LEN],
}

impl Header {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.write_all(&MAGIC)?;
        out.write_u8(VERSION)?;
        out.write_all(&self.salt)?;
        out.write_u32::<BigEndian>(self.cipher_len)?;
        out.write_all(&self.nonce)?;

        Ok(out)
    }

    /// Parses a header, wrong magic or version means there is nothing hidden.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(StegError::corrupt("header is truncated"));
        }

        let mut rdr = Cursor::new(bytes);
        let mut magic = [0u8; 4];
        rdr.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(StegError::corrupt("no hidden data found, header magic mismatch"));
        }
        let version = rdr.read_u8()?;
        if version != VERSION {
            return Err(StegError::corrupt(format!(
                "header version {version} is not supported"
            )));
        }

        let mut salt = [0u8; SALT_LEN];
        rdr.read_exact(&mut salt)?;
        let cipher_len = rdr.read_u32::<BigEndian>()?;
        let mut nonce = [0u8; NONCE_LEN];
        rdr.read_exact(&mut nonce)?;

        Ok(Self {
            salt,
            cipher_len,
            nonce,
        })
    }
}
