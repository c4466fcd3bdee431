//! Uncompressed Windows bitmaps, parsed by hand so the file is written back byte for byte.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;

use super::{used_channels, Encoding, RasterDevice, SampleLayout, Samples, STORAGE_ORDER};
use crate::options::RasterOptions;
use crate::{Result, StegError};

const FILE_HEADER_LEN: usize = 14;
const INFO_HEADER_MIN_LEN: u32 = 40;
const BI_RGB: u32 = 0;
const BI_BITFIELDS: u32 = 3;
/// Color masks sit right after a 40 byte info header and inside the larger ones.
const MASKS_OFFSET: usize = FILE_HEADER_LEN + INFO_HEADER_MIN_LEN as usize;
const MASKS_END: usize = MASKS_OFFSET + 12;

pub(crate) fn open_bitmap(data: Vec<u8>, options: &RasterOptions) -> Result<RasterDevice> {
    if data.len() < FILE_HEADER_LEN + INFO_HEADER_MIN_LEN as usize {
        return Err(StegError::corrupt("bitmap header is truncated"));
    }
    if &data[..2] != b"BM" {
        return Err(StegError::UnsupportedFormat);
    }

    let mut rdr = Cursor::new(&data[..]);
    rdr.set_position(10);
    let pixel_offset = rdr.read_u32::<LittleEndian>()? as usize;
    let info_len = rdr.read_u32::<LittleEndian>()?;
    let width = rdr.read_i32::<LittleEndian>()?;
    let height = rdr.read_i32::<LittleEndian>()?;
    let _planes = rdr.read_u16::<LittleEndian>()?;
    let bits_per_pixel = rdr.read_u16::<LittleEndian>()?;
    let compression = rdr.read_u32::<LittleEndian>()?;

    if info_len < INFO_HEADER_MIN_LEN {
        return Err(StegError::UnsupportedFeature(format!(
            "bitmap info header of {info_len} bytes"
        )));
    }
    let (channels, channel_order, header_end) = match (bits_per_pixel, compression) {
        (24, BI_RGB) => (3, STORAGE_ORDER, FILE_HEADER_LEN + info_len as usize),
        (32, BI_RGB) => (4, STORAGE_ORDER, FILE_HEADER_LEN + info_len as usize),
        (32, BI_BITFIELDS) => {
            if data.len() < MASKS_END {
                return Err(StegError::corrupt("bitmap color masks are truncated"));
            }
            let order = mask_order(&data[MASKS_OFFSET..MASKS_END])?;
            (4, order, MASKS_END.max(FILE_HEADER_LEN + info_len as usize))
        }
        (24 | 32, c) => {
            return Err(StegError::UnsupportedFeature(format!(
                "bitmap compression {c}"
            )))
        }
        (bpp, _) => {
            return Err(StegError::UnsupportedFeature(format!(
                "bitmap with {bpp} bits per pixel"
            )))
        }
    };
    if width <= 0 || height == 0 {
        return Err(StegError::corrupt(format!(
            "bitmap dimensions {width}x{height}"
        )));
    }

    let width = width as usize;
    let top_down = height < 0;
    let height = height.unsigned_abs() as usize;
    let row_stride = (width * bits_per_pixel as usize).div_ceil(32) * 4;
    let pixel_end = height
        .checked_mul(row_stride)
        .and_then(|len| len.checked_add(pixel_offset))
        .ok_or_else(|| StegError::corrupt("bitmap pixel array size overflows"))?;
    if pixel_offset < header_end || pixel_end > data.len() {
        return Err(StegError::corrupt("bitmap pixel array is out of bounds"));
    }

    debug!(
        "bitmap {width}x{height}, {bits_per_pixel} bpp, {}",
        if top_down { "top-down" } else { "bottom-up" }
    );

    Ok(RasterDevice {
        samples: Samples::Eight(data),
        layout: SampleLayout {
            offset: pixel_offset,
            row_stride,
            width,
            height,
            channels,
            used_channels: used_channels(channels, channels == 4, options)?,
            channel_order,
        },
        encoding: Encoding::Bitmap,
    })
}

/// Maps red, green and blue masks onto byte positions inside a 32 bit pixel.
///
/// Only whole-byte masks are accepted. The color bytes come first in storage
/// order and the leftover byte, usually alpha, comes last.
fn mask_order(masks: &[u8]) -> Result<[usize; 4]> {
    let mut colors = [0usize; 3];
    for (color, mask) in colors.iter_mut().zip(masks.chunks_exact(4)) {
        let mask = u32::from_le_bytes([mask[0], mask[1], mask[2], mask[3]]);
        *color = mask_byte(mask).ok_or_else(|| {
            StegError::UnsupportedFeature(format!("bitmap color mask {mask:#010x}"))
        })?;
    }
    colors.sort_unstable();
    if colors[0] == colors[1] || colors[1] == colors[2] {
        return Err(StegError::UnsupportedFeature(
            "bitmap color masks overlap".to_string(),
        ));
    }

    let spare = (0..4).find(|b| !colors.contains(b)).unwrap_or(3);
    Ok([colors[0], colors[1], colors[2], spare])
}

fn mask_byte(mask: u32) -> Option<usize> {
    (0..4).find(|k| mask == 0xFF << (8 * k))
}
