//! Carrier devices: a uniform view of an image as an ordered set of one-bit slots.
//!
//! A slot is a carrier element whose least significant bit may be changed
//! without visible effect. Slot `i` always maps to the same element, and
//! writing a slot never changes which elements are slots.

mod coefficient;
pub(crate) mod raster;

use std::fmt;

use enum_dispatch::enum_dispatch;

pub use coefficient::CoefficientDevice;
pub use raster::RasterDevice;

use crate::Result;

/// The carrier file formats the loader recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarrierFormat {
    Bitmap,
    Png,
    Jpeg,
}

impl CarrierFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            CarrierFormat::Bitmap => "bmp",
            CarrierFormat::Png => "png",
            CarrierFormat::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for CarrierFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CarrierFormat::Bitmap => "BMP",
            CarrierFormat::Png => "PNG",
            CarrierFormat::Jpeg => "JPEG",
        };
        f.write_str(name)
    }
}

#[enum_dispatch]
pub trait SlotDevice {
    /// Number of usable slots.
    fn capacity(&self) -> u64;

    /// Least significant bit of the slot, `slot` must be below [`SlotDevice::capacity`].
    fn read_bit(&self, slot: u64) -> Result<bool>;

    /// Sets the least significant bit of the slot and leaves all other bits alone.
    fn write_bit(&mut self, slot: u64, bit: bool) -> Result<()>;

    /// Encodes the carrier with all written bits into the format it was opened from.
    fn flush(&mut self) -> Result<Vec<u8>>;

    fn format(&self) -> CarrierFormat;
}

#[enum_dispatch(SlotDevice)]
#[derive(Debug)]
pub enum Device {
    RasterDevice,
    CoefficientDevice,
}

pub(crate) fn check_slot(slot: u64, capacity: u64) -> Result<usize> {
    if slot >= capacity {
        return Err(crate::StegError::invalid(format!(
            "slot {slot} is out of range, the carrier has {capacity} slots"
        )));
    }
    usize::try_from(slot).map_err(|_| crate::StegError::invalid("slot index overflows usize"))
}
