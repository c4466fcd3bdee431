use std::io::Cursor;

use byteorder::{BigEndian, ByteOrder};
use image::{ColorType, DynamicImage, ImageBuffer, ImageFormat};
use log::debug;

use super::{used_channels, Encoding, RasterDevice, SampleLayout, Samples, STORAGE_ORDER};
use crate::options::RasterOptions;
use crate::{Result, StegError};

const SIGNATURE_LEN: usize = 8;

/// Chunks whose meaning does not depend on the pixel data or color type.
const CARRIED_CHUNKS: [&[u8; 4]; 9] = [
    b"cHRM", b"gAMA", b"iCCP", b"sRGB", b"pHYs", b"tEXt", b"zTXt", b"iTXt", b"tIME",
];

pub(crate) fn open_png(data: &[u8], options: &RasterOptions) -> Result<RasterDevice> {
    let image = image::load_from_memory_with_format(data, ImageFormat::Png)?;
    let ancillary = ancillary_chunks(data)?;
    let (width, height) = (image.width(), image.height());
    let color = image.color();

    let samples = match image {
        DynamicImage::ImageLuma8(b) => Samples::Eight(b.into_raw()),
        DynamicImage::ImageLumaA8(b) => Samples::Eight(b.into_raw()),
        DynamicImage::ImageRgb8(b) => Samples::Eight(b.into_raw()),
        DynamicImage::ImageRgba8(b) => Samples::Eight(b.into_raw()),
        DynamicImage::ImageLuma16(b) => Samples::Sixteen(b.into_raw()),
        DynamicImage::ImageLumaA16(b) => Samples::Sixteen(b.into_raw()),
        DynamicImage::ImageRgb16(b) => Samples::Sixteen(b.into_raw()),
        DynamicImage::ImageRgba16(b) => Samples::Sixteen(b.into_raw()),
        _ => {
            return Err(StegError::UnsupportedFeature(format!(
                "PNG color type {color:?}"
            )))
        }
    };

    let channels = color.channel_count() as usize;
    debug!(
        "png {width}x{height}, {color:?}, {} bytes of metadata chunks",
        ancillary.len()
    );

    Ok(RasterDevice {
        samples,
        layout: SampleLayout {
            offset: 0,
            row_stride: width as usize * channels,
            width: width as usize,
            height: height as usize,
            channels,
            used_channels: used_channels(channels, color.has_alpha(), options)?,
            channel_order: STORAGE_ORDER,
        },
        encoding: Encoding::Png {
            width,
            height,
            color,
            ancillary,
        },
    })
}

/// Collects the metadata chunks worth keeping, verbatim and in file order.
fn ancillary_chunks(data: &[u8]) -> Result<Vec<u8>> {
    let mut kept = Vec::new();
    let mut pos = SIGNATURE_LEN;

    while pos + 8 <= data.len() {
        let len = BigEndian::read_u32(&data[pos..pos + 4]) as usize;
        let kind = &data[pos + 4..pos + 8];
        let end = pos
            .checked_add(12)
            .and_then(|p| p.checked_add(len))
            .filter(|&end| end <= data.len())
            .ok_or_else(|| StegError::corrupt("PNG chunk runs past the end of the file"))?;

        if kind == b"IEND" {
            break;
        }
        if CARRIED_CHUNKS.iter().any(|c| &c[..] == kind) {
            kept.extend_from_slice(&data[pos..end]);
        }
        pos = end;
    }

    Ok(kept)
}

/// Encodes the samples and puts the kept metadata chunks right after `IHDR`.
pub(super) fn encode(
    samples: &Samples,
    width: u32,
    height: u32,
    color: ColorType,
    ancillary: &[u8],
) -> Result<Vec<u8>> {
    let image = match (color, samples) {
        (ColorType::L8, Samples::Eight(s)) => {
            ImageBuffer::from_raw(width, height, s.clone()).map(DynamicImage::ImageLuma8)
        }
        (ColorType::La8, Samples::Eight(s)) => {
            ImageBuffer::from_raw(width, height, s.clone()).map(DynamicImage::ImageLumaA8)
        }
        (ColorType::Rgb8, Samples::Eight(s)) => {
            ImageBuffer::from_raw(width, height, s.clone()).map(DynamicImage::ImageRgb8)
        }
        (ColorType::Rgba8, Samples::Eight(s)) => {
            ImageBuffer::from_raw(width, height, s.clone()).map(DynamicImage::ImageRgba8)
        }
        (ColorType::L16, Samples::Sixteen(s)) => {
            ImageBuffer::from_raw(width, height, s.clone()).map(DynamicImage::ImageLuma16)
        }
        (ColorType::La16, Samples::Sixteen(s)) => {
            ImageBuffer::from_raw(width, height, s.clone()).map(DynamicImage::ImageLumaA16)
        }
        (ColorType::Rgb16, Samples::Sixteen(s)) => {
            ImageBuffer::from_raw(width, height, s.clone()).map(DynamicImage::ImageRgb16)
        }
        (ColorType::Rgba16, Samples::Sixteen(s)) => {
            ImageBuffer::from_raw(width, height, s.clone()).map(DynamicImage::ImageRgba16)
        }
        _ => None,
    }
    .ok_or_else(|| StegError::corrupt("PNG sample buffer does not match its color type"))?;

    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    let mut out = out.into_inner();

    if !ancillary.is_empty() {
        let header_len = out
            .get(SIGNATURE_LEN..SIGNATURE_LEN + 4)
            .map(BigEndian::read_u32)
            .ok_or_else(|| StegError::corrupt("encoded PNG has no header chunk"))?;
        let header_end = (SIGNATURE_LEN + 12 + header_len as usize).min(out.len());
        let rest = out.split_off(header_end);
        out.extend_from_slice(ancillary);
        out.extend_from_slice(&rest);
    }

    Ok(out)
}
