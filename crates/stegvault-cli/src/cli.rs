use clap::{Parser, Subcommand};
use stegvault_core::{
    CoefficientOptions, EngineOptions, KdfParams, Password, PermutationOptions, RasterOptions,
    StegError,
};

use crate::commands::*;
use crate::CliResult;

const PASSWORD_ENV: &str = "STEGVAULT_PASSWORD";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Experimental: Argon2id memory cost in KiB
    #[arg(long = "x-kdf-memory", default_value_t = KdfParams::default().memory_kib, global = true)]
    pub kdf_memory: u32,

    /// Experimental: Argon2id passes
    #[arg(long = "x-kdf-iterations", default_value_t = KdfParams::default().iterations, global = true)]
    pub kdf_iterations: u32,

    /// Experimental: Argon2id lanes
    #[arg(long = "x-kdf-parallelism", default_value_t = KdfParams::default().parallelism, global = true)]
    pub kdf_parallelism: u32,

    /// Experimental: Feistel rounds of the slot permutation, must be even [default: by carrier size]
    #[arg(long = "x-rounds", global = true)]
    pub rounds: Option<u32>,

    /// Experimental: use only the first N color channels of every pixel
    #[arg(long = "x-channels-per-pixel", value_name = "N", global = true)]
    pub channels_per_pixel: Option<usize>,

    /// Experimental: let the alpha channel carry bits too
    #[arg(long = "x-include-alpha", global = true)]
    pub include_alpha: bool,

    /// Experimental: highest zig-zag position of JPEG coefficients that carry bits
    #[arg(long = "x-highest-frequency", default_value_t = CoefficientOptions::default().highest_frequency, global = true)]
    pub highest_frequency: u8,

    /// Experimental: let JPEG coefficients equal to 0 and 1 carry bits
    #[arg(long = "x-include-zero-and-one", global = true)]
    pub include_zero_and_one: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl CliArgs {
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions::default()
            .with_kdf(KdfParams::new(
                self.kdf_memory,
                self.kdf_iterations,
                self.kdf_parallelism,
            ))
            .with_permutation(PermutationOptions {
                rounds: self.rounds,
            })
            .with_raster(RasterOptions {
                skip_alpha_channel: !self.include_alpha,
                channels_per_pixel: self.channels_per_pixel,
            })
            .with_coefficient(CoefficientOptions {
                highest_frequency: self.highest_frequency,
                skip_zero_and_one: !self.include_zero_and_one,
            })
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Insert(insert::InsertArgs),
    Extract(extract::ExtractArgs),
    Capacity(capacity::CapacityArgs),
}

/// Takes the password from the command line, the environment or an interactive prompt.
pub fn resolve_password(given: Option<String>, confirm: bool) -> CliResult<Password> {
    if let Some(password) = given {
        return Ok(password.into());
    }
    if let Some(password) = std::env::var_os(PASSWORD_ENV) {
        if !password.is_empty() {
            return Ok(password.into_encoded_bytes().into());
        }
    }

    ask_for_password(confirm).map(Password::from)
}

fn ask_for_password(confirm: bool) -> CliResult<String> {
    let mut prompt = dialoguer::Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Repeat password", "Passwords do not match");
    }

    prompt.interact().map_err(|e| StegError::ReadError {
        source: std::io::Error::other(e),
    })
}
