//! Byte to bit conversion, most significant bit first.

use std::io::{self, Read};

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

use crate::Result;

/// Yields the bits of a byte source, most significant bit of every byte first.
pub struct BitIterator<R: Read> {
    reader: BitReader<R, BigEndian>,
}

impl<R: Read> BitIterator<R> {
    pub fn new(source: R) -> Self {
        BitIterator {
            reader: BitReader::endian(source, BigEndian),
        }
    }
}

impl<R: Read> Iterator for BitIterator<R> {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            return match self.reader.read_bit() {
                Ok(bit) => Some(bit),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => None,
            };
        }
    }
}

/// Packs bits back into bytes, the first bit becomes the most significant bit.
///
/// A trailing partial byte is padded with zero bits.
pub fn collect_bytes<I>(bits: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = Result<bool>>,
{
    let mut writer = BitWriter::endian(Vec::new(), BigEndian);
    for bit in bits {
        writer.write_bit(bit?)?;
    }
    writer.byte_align()?;

    Ok(writer.into_writer())
}
