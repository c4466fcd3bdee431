//! Keyed pseudo-random permutation of slot indices.
//!
//! An alternating Feistel network over `k` bits, with AES-256 keyed by the
//! permutation seed as round function, is a bijection on `[0, 2^k)`. Values
//! that fall outside the domain are skipped (cycle walking), which turns it
//! into a sequence of distinct indices below the domain size.
//!
//! Positions are produced on demand, so nothing proportional to the domain
//! size is ever allocated.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes256;
use stegvault_cipher::SEED_LEN;

use crate::options::PermutationOptions;
use crate::{Result, StegError};

/// Largest domain the round function encoding supports.
pub const MAX_DOMAIN: u64 = 1 << 48;

pub struct Permutator {
    cipher: Aes256,
    domain: u64,
    bits: u32,
    left_bits: u32,
    right_bits: u32,
    rounds: u32,
}

impl Permutator {
    pub fn new(seed: &[u8; SEED_LEN], domain: u64, options: &PermutationOptions) -> Result<Self> {
        if domain > MAX_DOMAIN {
            return Err(StegError::invalid(format!(
                "permutation domain of {domain} exceeds the maximum of {MAX_DOMAIN}"
            )));
        }
        let bits = bits_for(domain);
        let rounds = options.rounds_for(bits);
        if rounds < 2 || rounds % 2 != 0 {
            return Err(StegError::invalid(format!(
                "permutation rounds must be even and at least 2, got {rounds}"
            )));
        }

        Ok(Self {
            cipher: Aes256::new(GenericArray::from_slice(seed)),
            domain,
            bits,
            left_bits: bits - bits / 2,
            right_bits: bits / 2,
            rounds,
        })
    }

    pub fn domain(&self) -> u64 {
        self.domain
    }

    /// Bijection on `[0, 2^k)`, where `2^k` is the smallest power of two (at least 2) not below the domain.
    pub fn permute(&self, value: u64) -> u64 {
        let mut left = value >> self.right_bits;
        let mut right = value & mask(self.right_bits);

        for round in 0..self.rounds {
            if round % 2 == 0 {
                left ^= self.round_function(round, right) & mask(self.left_bits);
            } else {
                right ^= self.round_function(round, left) & mask(self.right_bits);
            }
        }

        (left << self.right_bits) | right
    }

    /// The first `length` distinct indices of the keyed walk over the domain.
    pub fn sequence(self, length: u64) -> Result<Sequence> {
        if length > self.domain {
            return Err(StegError::invalid(format!(
                "cannot draw {length} distinct positions from a domain of {}",
                self.domain
            )));
        }

        Ok(Sequence {
            permutator: self,
            counter: 0,
            remaining: length,
        })
    }

    fn round_function(&self, round: u32, half: u64) -> u64 {
        let mut block = [0u8; 16];
        block[0] = round as u8;
        block[1] = self.bits as u8;
        block[2..8].copy_from_slice(&self.domain.to_be_bytes()[2..]);
        block[8..].copy_from_slice(&half.to_be_bytes());

        let mut block = GenericArray::from(block);
        self.cipher.encrypt_block(&mut block);

        let mut word = [0u8; 8];
        word.copy_from_slice(&block[..8]);
        u64::from_be_bytes(word)
    }
}

/// Iterator over the positions of one embedding, see [`Permutator::sequence`].
pub struct Sequence {
    permutator: Permutator,
    counter: u64,
    remaining: u64,
}

impl Iterator for Sequence {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        loop {
            let candidate = self.permutator.permute(self.counter);
            self.counter += 1;
            if candidate < self.permutator.domain {
                self.remaining -= 1;
                return Some(candidate);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Sequence {}

/// Shorthand for `Permutator::new(..)?.sequence(length)`.
pub fn sequence(
    seed: &[u8; SEED_LEN],
    domain: u64,
    length: u64,
    options: &PermutationOptions,
) -> Result<Sequence> {
    Permutator::new(seed, domain, options)?.sequence(length)
}

fn bits_for(domain: u64) -> u32 {
    match domain {
        0..=2 => 1,
        n => 64 - (n - 1).leading_zeros(),
    }
}

fn mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1 << bits) - 1
    }
}
