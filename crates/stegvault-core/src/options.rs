//! Tuning knobs of the engine and its devices.
//!
//! All values have defaults, and hiding and unveiling need the same values
//! because none of them is recorded inside the carrier.

pub use stegvault_cipher::KdfParams;

/// Highest zig-zag position a JPEG coefficient may have to carry a bit.
pub const DEFAULT_HIGHEST_FREQUENCY: u8 = 48;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PermutationOptions {
    /// Feistel rounds, even and at least 2. `None` picks [`default_rounds`]
    /// for the bit width of the domain.
    pub rounds: Option<u32>,
}

impl PermutationOptions {
    pub fn rounds_for(&self, bits: u32) -> u32 {
        self.rounds.unwrap_or_else(|| default_rounds(bits))
    }
}

/// Feistel rounds for a domain of `bits` bits.
///
/// Narrow halves mix poorly per round, so small domains get more rounds.
pub fn default_rounds(bits: u32) -> u32 {
    match bits {
        0..=9 => 36,
        10..=13 => 30,
        14..=19 => 24,
        20..=31 => 18,
        _ => 12,
    }
}

/// Which samples of a raster image carry bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    /// Leave the alpha channel untouched
    pub skip_alpha_channel: bool,
    /// Use only the first `n` color channels of every pixel, `None` uses all
    pub channels_per_pixel: Option<usize>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            skip_alpha_channel: true,
            channels_per_pixel: None,
        }
    }
}

/// Which quantized DCT coefficients of a JPEG carry bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoefficientOptions {
    /// Last zig-zag position (1..=63) that is still eligible, DC is never used
    pub highest_frequency: u8,
    /// Exclude coefficients equal to 0 or 1
    pub skip_zero_and_one: bool,
}

impl Default for CoefficientOptions {
    fn default() -> Self {
        Self {
            highest_frequency: DEFAULT_HIGHEST_FREQUENCY,
            skip_zero_and_one: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceOptions {
    pub raster: RasterOptions,
    pub coefficient: CoefficientOptions,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub kdf: KdfParams,
    pub permutation: PermutationOptions,
    pub device: DeviceOptions,
}

impl EngineOptions {
    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// Fixes the Feistel rounds instead of deriving them from the domain width.
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.permutation.rounds = Some(rounds);
        self
    }

    pub fn with_permutation(mut self, permutation: PermutationOptions) -> Self {
        self.permutation = permutation;
        self
    }

    pub fn with_raster(mut self, raster: RasterOptions) -> Self {
        self.device.raster = raster;
        self
    }

    pub fn with_coefficient(mut self, coefficient: CoefficientOptions) -> Self {
        self.device.coefficient = coefficient;
        self
    }
}
