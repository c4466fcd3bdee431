use std::path::PathBuf;

use clap::Args;
use stegvault_core::EngineOptions;

use crate::CliResult;

/// Unveils the hidden file from an image
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Password used to encrypt the data, prompted for when missing
    #[arg(short, long, value_name = "password")]
    pub password: Option<String>,

    /// Image that contains secret data
    #[arg(short = 'i', long = "in", value_name = "carrier file", required = true)]
    pub carrier: PathBuf,

    /// The unveiled data will be stored in this file
    #[arg(short = 'o', long = "out", value_name = "output file", required = true)]
    pub output: PathBuf,
}

impl ExtractArgs {
    pub fn run(self, options: EngineOptions) -> CliResult<()> {
        let password = crate::cli::resolve_password(self.password, false)?;

        stegvault_core::commands::extract(&self.carrier, &self.output, password, options)
    }
}
