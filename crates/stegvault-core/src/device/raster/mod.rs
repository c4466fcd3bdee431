//! Least significant bit slots in the color samples of uncompressed raster images.
//!
//! Slots run in the natural scan order of the decoded data: rows in storage
//! order, pixels left to right, channels in storage order. Only the first
//! `used_channels` channels of every pixel are slots.

mod bmp;
mod png;

use crate::device::{check_slot, CarrierFormat, SlotDevice};
use crate::options::RasterOptions;
use crate::{Result, StegError};

pub(crate) use self::bmp::open_bitmap;
pub(crate) use self::png::open_png;

#[derive(Debug)]
enum Samples {
    Eight(Vec<u8>),
    Sixteen(Vec<u16>),
}

/// Where the samples of the pixel grid live inside the sample buffer.
#[derive(Debug, Clone, Copy)]
struct SampleLayout {
    offset: usize,
    row_stride: usize,
    width: usize,
    height: usize,
    channels: usize,
    used_channels: usize,
    /// Byte position inside a pixel of every channel, in slot order.
    channel_order: [usize; 4],
}

/// Channels stored in the order they are used.
const STORAGE_ORDER: [usize; 4] = [0, 1, 2, 3];

impl SampleLayout {
    fn slots(&self) -> u64 {
        (self.width * self.height * self.used_channels) as u64
    }

    fn sample_index(&self, slot: usize) -> usize {
        let per_row = self.width * self.used_channels;
        let (row, rest) = (slot / per_row, slot % per_row);
        let (pixel, channel) = (rest / self.used_channels, rest % self.used_channels);

        self.offset + row * self.row_stride + pixel * self.channels + self.channel_order[channel]
    }
}

#[derive(Debug)]
enum Encoding {
    /// The samples are the complete file.
    Bitmap,
    Png {
        width: u32,
        height: u32,
        color: image::ColorType,
        /// Metadata chunks copied from the original file.
        ancillary: Vec<u8>,
    },
}

#[derive(Debug)]
pub struct RasterDevice {
    samples: Samples,
    layout: SampleLayout,
    encoding: Encoding,
}

impl RasterDevice {
    pub fn width(&self) -> usize {
        self.layout.width
    }

    pub fn height(&self) -> usize {
        self.layout.height
    }

    pub fn used_channels(&self) -> usize {
        self.layout.used_channels
    }
}

impl SlotDevice for RasterDevice {
    fn capacity(&self) -> u64 {
        self.layout.slots()
    }

    fn read_bit(&self, slot: u64) -> Result<bool> {
        let index = self.layout.sample_index(check_slot(slot, self.capacity())?);

        Ok(match &self.samples {
            Samples::Eight(s) => s[index] & 1 == 1,
            Samples::Sixteen(s) => s[index] & 1 == 1,
        })
    }

    fn write_bit(&mut self, slot: u64, bit: bool) -> Result<()> {
        let index = self.layout.sample_index(check_slot(slot, self.capacity())?);

        match &mut self.samples {
            Samples::Eight(s) => s[index] = (s[index] & !1) | bit as u8,
            Samples::Sixteen(s) => s[index] = (s[index] & !1) | bit as u16,
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<Vec<u8>> {
        match (&self.encoding, &self.samples) {
            (Encoding::Bitmap, Samples::Eight(bytes)) => Ok(bytes.clone()),
            (
                Encoding::Png {
                    width,
                    height,
                    color,
                    ancillary,
                },
                samples,
            ) => png::encode(samples, *width, *height, *color, ancillary),
            (Encoding::Bitmap, Samples::Sixteen(_)) => {
                Err(StegError::corrupt("bitmap with 16 bit samples"))
            }
        }
    }

    fn format(&self) -> CarrierFormat {
        match self.encoding {
            Encoding::Bitmap => CarrierFormat::Bitmap,
            Encoding::Png { .. } => CarrierFormat::Png,
        }
    }
}

/// Number of channels per pixel that carry bits.
fn used_channels(channels: usize, has_alpha: bool, options: &RasterOptions) -> Result<usize> {
    let color_channels = if has_alpha && options.skip_alpha_channel {
        channels - 1
    } else {
        channels
    };

    match options.channels_per_pixel {
        Some(0) => Err(StegError::invalid("channels per pixel must be at least 1")),
        Some(n) => Ok(n.min(color_channels)),
        None => Ok(color_channels),
    }
}
