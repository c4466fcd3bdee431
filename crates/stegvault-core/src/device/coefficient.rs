//! Least significant bit slots in the quantized AC coefficients of baseline JPEGs.
//!
//! A coefficient is a slot when its zig-zag position lies in
//! `1..=highest_frequency` and its value stays inside the eligible set no
//! matter which least significant bit is written. Values 0 and 1 can be
//! excluded to keep the zero runs intact, and -1023 is always excluded because
//! its partner -1024 cannot be entropy coded. Because eligibility only depends
//! on `value & !1`, the slot set found when hiding is the slot set found when
//! unveiling.

use log::debug;
use stegvault_jpeg::JpegImage;

use crate::device::{check_slot, CarrierFormat, SlotDevice};
use crate::options::CoefficientOptions;
use crate::{Result, StegError};

const MIN_VALUE: i16 = -1022;
const MAX_VALUE: i16 = 1023;

#[derive(Debug, Clone, Copy)]
struct SlotRef {
    component: u32,
    index: u32,
}

#[derive(Debug)]
pub struct CoefficientDevice {
    image: JpegImage,
    slots: Vec<SlotRef>,
}

impl CoefficientDevice {
    pub fn decode(data: &[u8], options: &CoefficientOptions) -> Result<Self> {
        if !(1..=63).contains(&options.highest_frequency) {
            return Err(StegError::invalid(format!(
                "highest frequency must be within 1..=63, got {}",
                options.highest_frequency
            )));
        }

        let image = JpegImage::decode(data)?;
        let highest = options.highest_frequency as usize;
        let mut slots = Vec::new();

        for (component, coefficients) in image.components().iter().enumerate() {
            for block in 0..coefficients.block_count() {
                let values = coefficients.block(block);
                for (zigzag, &value) in values.iter().enumerate().take(highest + 1).skip(1) {
                    if is_eligible(value, options) {
                        slots.push(SlotRef {
                            component: component as u32,
                            index: u32::try_from(block * 64 + zigzag).map_err(|_| {
                                StegError::UnsupportedFeature("JPEG is too large".to_string())
                            })?,
                        });
                    }
                }
            }
        }

        debug!(
            "{} coefficient slots in a {}x{} JPEG",
            slots.len(),
            image.width(),
            image.height()
        );
        Ok(Self { image, slots })
    }

    pub fn image(&self) -> &JpegImage {
        &self.image
    }
}

fn is_eligible(value: i16, options: &CoefficientOptions) -> bool {
    if !(MIN_VALUE..=MAX_VALUE).contains(&value) {
        return false;
    }
    !(options.skip_zero_and_one && (value == 0 || value == 1))
}

impl SlotDevice for CoefficientDevice {
    fn capacity(&self) -> u64 {
        self.slots.len() as u64
    }

    fn read_bit(&self, slot: u64) -> Result<bool> {
        let slot = self.slots[check_slot(slot, self.capacity())?];
        let value = self.image.components()[slot.component as usize].data[slot.index as usize];

        Ok(value & 1 == 1)
    }

    fn write_bit(&mut self, slot: u64, bit: bool) -> Result<()> {
        let slot = self.slots[check_slot(slot, self.capacity())?];
        let value =
            &mut self.image.components_mut()[slot.component as usize].data[slot.index as usize];
        *value = (*value & !1) | bit as i16;

        Ok(())
    }

    fn flush(&mut self) -> Result<Vec<u8>> {
        Ok(self.image.encode()?)
    }

    fn format(&self) -> CarrierFormat {
        CarrierFormat::Jpeg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eligibility_is_stable_under_lsb_writes() {
        for options in [
            CoefficientOptions::default(),
            CoefficientOptions {
                skip_zero_and_one: false,
                ..Default::default()
            },
        ] {
            for value in -1024i16..=1024 {
                let low = value & !1;
                let high = low | 1;
                assert_eq!(
                    is_eligible(low, &options),
                    is_eligible(high, &options),
                    "value {value}"
                );
            }
        }
    }

    #[test]
    fn zero_and_one_are_skipped_by_default() {
        let options = CoefficientOptions::default();

        assert!(!is_eligible(0, &options));
        assert!(!is_eligible(1, &options));
        assert!(is_eligible(-1, &options));
        assert!(is_eligible(2, &options));
        assert!(!is_eligible(-1023, &options));
        assert!(is_eligible(-1022, &options));
    }

    #[test]
    fn highest_frequency_is_validated() {
        for highest_frequency in [0, 64] {
            let options = CoefficientOptions {
                highest_frequency,
                ..Default::default()
            };
            assert!(matches!(
                CoefficientDevice::decode(&[0xFF, 0xD8, 0xFF], &options),
                Err(StegError::InvalidInput(_))
            ));
        }
    }
}
