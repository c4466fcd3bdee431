use std::path::PathBuf;

use clap::Args;
use stegvault_core::EngineOptions;

use crate::CliResult;

/// Shows how much data an image can hold
#[derive(Args, Debug)]
pub struct CapacityArgs {
    /// Carrier image
    #[arg(short = 'i', long = "in", value_name = "carrier file", required = true)]
    pub carrier: PathBuf,
}

impl CapacityArgs {
    pub fn run(self, options: EngineOptions) -> CliResult<()> {
        let capacity = stegvault_core::commands::capacity(&self.carrier, options)?;

        println!("slots:        {}", capacity.slots);
        println!("header slots: {}", capacity.header_slots);
        println!("max payload:  {} bytes", capacity.max_payload_bytes);

        Ok(())
    }
}
