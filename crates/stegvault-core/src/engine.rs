//! Hiding and unveiling of encrypted payloads.
//!
//! A carrier holds the [`Header`] in its first [`HEADER_SLOTS`] slots in
//! natural order. The ciphertext follows bit by bit in the remaining slots,
//! in the order given by the password keyed [`Permutator`]. The header is
//! readable without the password, the payload is not.
//!
//! Sessions follow `open -> embed | extract -> finalized`, expressed as
//! [`Session<Embed>`] and [`Session<Extract>`] whose operations consume them.

use std::marker::PhantomData;
use std::path::Path;

use log::{debug, trace};
use stegvault_cipher::{
    decrypt, encrypt, random_nonce, random_salt, KeyDerivation, SessionKeys, TAG_LEN,
};

use crate::bits::{collect_bytes, BitIterator};
use crate::device::{CarrierFormat, Device, SlotDevice};
use crate::header::{Header, HEADER_SLOTS};
use crate::loader;
use crate::options::EngineOptions;
use crate::permutator::Permutator;
use crate::{Result, StegError};

/// Session mode for hiding a payload.
#[derive(Debug)]
pub struct Embed;

/// Session mode for unveiling a payload.
#[derive(Debug)]
pub struct Extract;

/// An open carrier, bound to one operation.
#[derive(Debug)]
pub struct Session<Mode> {
    device: Device,
    options: EngineOptions,
    mode: PhantomData<Mode>,
}

impl<Mode> Session<Mode> {
    pub fn open<P: AsRef<Path>>(carrier: P, options: &EngineOptions) -> Result<Self> {
        Ok(Self::with_device(loader::open(carrier, &options.device)?, options))
    }

    pub fn from_bytes(carrier: Vec<u8>, options: &EngineOptions) -> Result<Self> {
        Ok(Self::with_device(
            loader::open_bytes(carrier, &options.device)?,
            options,
        ))
    }

    pub fn with_device(device: Device, options: &EngineOptions) -> Self {
        Self {
            device,
            options: *options,
            mode: PhantomData,
        }
    }

    pub fn capacity(&self) -> Capacity {
        Capacity::of(self.device.capacity())
    }

    pub fn format(&self) -> CarrierFormat {
        self.device.format()
    }

    fn derive(&self, password: &[u8], salt: &[u8; stegvault_cipher::SALT_LEN]) -> Result<SessionKeys> {
        Ok(KeyDerivation::new(self.options.kdf).derive(password, salt)?)
    }

    fn positions(&self, keys: &SessionKeys, cipher_bits: u64) -> Result<impl Iterator<Item = u64>> {
        let domain = self.device.capacity() - HEADER_SLOTS;
        Ok(Permutator::new(keys.seed(), domain, &self.options.permutation)?
            .sequence(cipher_bits)?
            .map(|position| HEADER_SLOTS + position))
    }
}

impl Session<Embed> {
    /// Encrypts `payload` and writes it into the carrier.
    ///
    /// The carrier is only modified once the payload is known to fit, and it
    /// is encoded into its original format before the session is released.
    pub fn embed(mut self, password: &[u8], payload: &[u8]) -> Result<Sealed> {
        let salt = random_salt();
        let nonce = random_nonce();
        let keys = self.derive(password, &salt)?;
        let ciphertext = encrypt(keys.key(), &nonce, payload)?;

        let capacity = self.device.capacity();
        let cipher_bits = ciphertext.len() as u64 * 8;
        let required = HEADER_SLOTS + cipher_bits;
        if required > capacity {
            return Err(StegError::CapacityExceeded {
                required,
                available: capacity,
            });
        }
        let cipher_len = u32::try_from(ciphertext.len())
            .map_err(|_| StegError::invalid("payload does not fit the length field"))?;

        let header = Header {
            salt,
            cipher_len,
            nonce,
        };
        let header_bytes = header.to_bytes()?;
        for (slot, bit) in (0..HEADER_SLOTS).zip(BitIterator::new(&header_bytes[..])) {
            self.device.write_bit(slot, bit)?;
        }
        debug!("header written, {cipher_len} ciphertext bytes");

        let positions = self.positions(&keys, cipher_bits)?;
        let mut written = 0u64;
        for (slot, bit) in positions.zip(BitIterator::new(&ciphertext[..])) {
            self.device.write_bit(slot, bit)?;
            written += 1;
        }
        trace!("{written} ciphertext bits written");
        debug!(
            "embedded {} payload bytes into {} of {capacity} slots",
            payload.len(),
            required
        );

        let format = self.device.format();
        let bytes = self.device.flush()?;

        Ok(Sealed { bytes, format })
    }
}

impl Session<Extract> {
    /// Reads the header, locates the ciphertext and authenticates it.
    ///
    /// Fails with [`StegError::CorruptCarrier`] when no header is present and
    /// with [`StegError::IntegrityFailure`] for a wrong password.
    pub fn extract(self, password: &[u8]) -> Result<Vec<u8>> {
        let capacity = self.device.capacity();
        if capacity < HEADER_SLOTS {
            return Err(StegError::corrupt(format!(
                "carrier has {capacity} slots, too few to hold a header"
            )));
        }

        let header_bytes = collect_bytes((0..HEADER_SLOTS).map(|slot| self.device.read_bit(slot)))?;
        let header = Header::from_bytes(&header_bytes)?;
        debug!("header found, {} ciphertext bytes announced", header.cipher_len);

        let cipher_len = header.cipher_len as u64;
        let cipher_bits = cipher_len * 8;
        if cipher_len < TAG_LEN as u64 || HEADER_SLOTS + cipher_bits > capacity {
            return Err(StegError::corrupt(format!(
                "header announces {cipher_len} ciphertext bytes, the carrier cannot hold them"
            )));
        }

        let keys = self.derive(password, &header.salt)?;
        let ciphertext = collect_bytes(
            self.positions(&keys, cipher_bits)?
                .map(|slot| self.device.read_bit(slot)),
        )?;
        let payload = decrypt(keys.key(), &header.nonce, &ciphertext)?;
        debug!("extracted {} payload bytes", payload.len());

        Ok(payload)
    }
}

/// A carrier with an embedded payload, encoded and ready to be stored.
#[derive(Debug)]
pub struct Sealed {
    bytes: Vec<u8>,
    format: CarrierFormat,
}

impl Sealed {
    pub fn format(&self) -> CarrierFormat {
        self.format
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Atomically writes the carrier to `output`.
    pub fn save<P: AsRef<Path>>(&self, output: P) -> Result<()> {
        loader::persist(&self.bytes, output)
    }
}

/// Slot accounting of a carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    /// All usable slots
    pub slots: u64,
    /// Slots taken by the header
    pub header_slots: u64,
    /// Largest payload in bytes that still fits
    pub max_payload_bytes: u64,
}

impl Capacity {
    pub fn of(slots: u64) -> Self {
        let max_payload_bytes = (slots.saturating_sub(HEADER_SLOTS) / 8).saturating_sub(TAG_LEN as u64);
        Self {
            slots,
            header_slots: HEADER_SLOTS,
            max_payload_bytes,
        }
    }
}

/// Hides `payload` inside `carrier` and writes the result to `output`.
///
/// `output` is written atomically and stays untouched on any failure.
pub fn embed<C: AsRef<Path>, O: AsRef<Path>>(
    carrier: C,
    password: &[u8],
    payload: &[u8],
    output: O,
    options: &EngineOptions,
) -> Result<()> {
    Session::<Embed>::open(carrier, options)?
        .embed(password, payload)?
        .save(output)
}

/// Unveils the payload hidden inside `carrier`.
pub fn extract<C: AsRef<Path>>(
    carrier: C,
    password: &[u8],
    options: &EngineOptions,
) -> Result<Vec<u8>> {
    Session::<Extract>::open(carrier, options)?.extract(password)
}

/// Slot accounting of `carrier` without touching it.
pub fn capacity<C: AsRef<Path>>(carrier: C, options: &EngineOptions) -> Result<Capacity> {
    Ok(Session::<Extract>::open(carrier, options)?.capacity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{KdfParams, RasterOptions};
    use crate::ErrorKind;

    fn options() -> EngineOptions {
        EngineOptions::default()
            .with_kdf(KdfParams::new(64, 1, 1))
            .with_raster(RasterOptions {
                channels_per_pixel: Some(1),
                ..Default::default()
            })
    }

    fn bitmap(width: u32, height: u32) -> Vec<u8> {
        let stride = (width as usize * 3).div_ceil(4) * 4;
        let size = 54 + stride * height as usize;
        let mut data = Vec::with_capacity(size);
        data.extend_from_slice(b"BM");
        data.extend_from_slice(&(size as u32).to_le_bytes());
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(&54u32.to_le_bytes());
        data.extend_from_slice(&40u32.to_le_bytes());
        data.extend_from_slice(&(width as i32).to_le_bytes());
        data.extend_from_slice(&(height as i32).to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&24u16.to_le_bytes());
        data.extend_from_slice(&[0; 24]);
        data.extend((0..size - 54).map(|i| (i * 7 % 256) as u8));
        data
    }

    #[test]
    fn capacity_accounting() {
        let c = Capacity::of(65_536);

        assert_eq!(c.header_slots, 296);
        assert_eq!(c.max_payload_bytes, (65_536 - 296) / 8 - 16);
        assert_eq!(Capacity::of(10).max_payload_bytes, 0);
    }

    #[test]
    fn round_trip_in_memory() {
        let sealed = Session::<Embed>::from_bytes(bitmap(64, 64), &options())
            .unwrap()
            .embed(b"hunter2", b"a secret")
            .unwrap();
        assert_eq!(sealed.format(), CarrierFormat::Bitmap);

        let payload = Session::<Extract>::from_bytes(sealed.into_bytes(), &options())
            .unwrap()
            .extract(b"hunter2")
            .unwrap();
        assert_eq!(payload, b"a secret");
    }

    #[test]
    fn empty_payload_round_trips() {
        let sealed = Session::<Embed>::from_bytes(bitmap(32, 32), &options())
            .unwrap()
            .embed(b"pw", b"")
            .unwrap();
        let payload = Session::<Extract>::from_bytes(sealed.into_bytes(), &options())
            .unwrap()
            .extract(b"pw")
            .unwrap();

        assert!(payload.is_empty());
    }

    #[test]
    fn pristine_carrier_has_no_header() {
        let result = Session::<Extract>::from_bytes(bitmap(64, 64), &options())
            .unwrap()
            .extract(b"hunter2");

        assert!(matches!(result, Err(StegError::CorruptCarrier(_))));
    }

    #[test]
    fn tiny_carrier_cannot_hold_a_header() {
        let result = Session::<Extract>::from_bytes(bitmap(8, 8), &options())
            .unwrap()
            .extract(b"hunter2");

        assert!(matches!(result, Err(StegError::CorruptCarrier(_))));
    }

    #[test]
    fn empty_password_is_invalid_input() {
        let result = Session::<Embed>::from_bytes(bitmap(64, 64), &options())
            .unwrap()
            .embed(b"", b"data");

        assert_eq!(result.unwrap_err().kind(), crate::ErrorKind::InvalidInput);
    }

    #[test]
    fn header_is_stored_in_natural_order() {
        let sealed = Session::<Embed>::from_bytes(bitmap(64, 64), &options())
            .unwrap()
            .embed(b"hunter2", b"xyz")
            .unwrap();
        let device = loader::open_bytes(sealed.into_bytes(), &options().device).unwrap();
        let magic = collect_bytes((0..32).map(|slot| device.read_bit(slot))).unwrap();

        assert_eq!(magic, b"SVLT");
    }

    /// Embeds "a secret" into a 64x64 bitmap and reopens the result.
    fn sealed_device() -> (Device, Header) {
        let sealed = Session::<Embed>::from_bytes(bitmap(64, 64), &options())
            .unwrap()
            .embed(b"hunter2", b"a secret")
            .unwrap();
        let device = loader::open_bytes(sealed.into_bytes(), &options().device).unwrap();
        let header_bytes =
            collect_bytes((0..HEADER_SLOTS).map(|slot| device.read_bit(slot))).unwrap();
        let header = Header::from_bytes(&header_bytes).unwrap();

        (device, header)
    }

    fn rewrite_header(device: &mut Device, header: &Header) {
        let bytes = header.to_bytes().unwrap();
        for (slot, bit) in (0..HEADER_SLOTS).zip(BitIterator::new(&bytes[..])) {
            device.write_bit(slot, bit).unwrap();
        }
    }

    fn flip(device: &mut Device, slot: u64) {
        let bit = device.read_bit(slot).unwrap();
        device.write_bit(slot, !bit).unwrap();
    }

    fn extract_kind(device: Device) -> ErrorKind {
        Session::<Extract>::with_device(device, &options())
            .extract(b"hunter2")
            .unwrap_err()
            .kind()
    }

    #[test]
    fn untouched_carrier_extracts() {
        let (device, header) = sealed_device();
        assert_eq!(header.cipher_len as usize, b"a secret".len() + TAG_LEN);

        let payload = Session::<Extract>::with_device(device, &options())
            .extract(b"hunter2")
            .unwrap();
        assert_eq!(payload, b"a secret");
    }

    #[test]
    fn length_below_the_tag_is_corrupt() {
        let (mut device, mut header) = sealed_device();
        header.cipher_len = TAG_LEN as u32 / 2;
        rewrite_header(&mut device, &header);

        assert_eq!(extract_kind(device), ErrorKind::CorruptCarrier);
    }

    #[test]
    fn length_beyond_capacity_is_corrupt() {
        let (mut device, mut header) = sealed_device();
        let room = (device.capacity() - HEADER_SLOTS) / 8;

        header.cipher_len = room as u32 + 1;
        rewrite_header(&mut device, &header);
        assert_eq!(extract_kind(device), ErrorKind::CorruptCarrier);

        let (mut device, mut header) = sealed_device();
        header.cipher_len = u32::MAX;
        rewrite_header(&mut device, &header);
        assert_eq!(extract_kind(device), ErrorKind::CorruptCarrier);
    }

    #[test]
    fn altered_length_fails_authentication() {
        let (mut device, mut header) = sealed_device();
        header.cipher_len += 1;
        rewrite_header(&mut device, &header);

        assert_eq!(extract_kind(device), ErrorKind::IntegrityFailure);
    }

    #[test]
    fn flipped_magic_bit_is_corrupt() {
        let (mut device, _) = sealed_device();
        flip(&mut device, 0);

        assert_eq!(extract_kind(device), ErrorKind::CorruptCarrier);
    }

    #[test]
    fn flipped_version_bit_is_corrupt() {
        let (mut device, _) = sealed_device();
        // lowest bit of the version byte
        flip(&mut device, 39);

        assert_eq!(extract_kind(device), ErrorKind::CorruptCarrier);
    }

    #[test]
    fn altered_nonce_fails_authentication() {
        let (mut device, mut header) = sealed_device();
        header.nonce[0] ^= 0x01;
        rewrite_header(&mut device, &header);

        assert_eq!(extract_kind(device), ErrorKind::IntegrityFailure);
    }

    #[test]
    fn flipped_ciphertext_bit_fails_authentication() {
        let (mut device, header) = sealed_device();
        let keys = KeyDerivation::new(options().kdf)
            .derive(b"hunter2", &header.salt)
            .unwrap();
        let domain = device.capacity() - HEADER_SLOTS;
        let first = Permutator::new(keys.seed(), domain, &options().permutation)
            .unwrap()
            .sequence(1)
            .unwrap()
            .next()
            .unwrap();
        flip(&mut device, HEADER_SLOTS + first);

        assert_eq!(extract_kind(device), ErrorKind::IntegrityFailure);
    }
}
