use std::path::PathBuf;

use clap::Args;
use stegvault_core::EngineOptions;

use crate::CliResult;

/// Hides a file inside a BMP, PNG or JPEG image
#[derive(Args, Debug)]
pub struct InsertArgs {
    /// Password used to encrypt the data, prompted for when missing
    #[arg(short, long, value_name = "password")]
    pub password: Option<String>,

    /// Carrier image, used readonly
    #[arg(short = 'i', long = "in", value_name = "carrier file", required = true)]
    pub carrier: PathBuf,

    /// File to hide in the image
    #[arg(short = 'd', long = "data", value_name = "data file", required = true)]
    pub payload: PathBuf,

    /// Final image will be stored as file, in the format of the carrier
    #[arg(
        short = 'o',
        long = "out",
        value_name = "output image file",
        required = true
    )]
    pub output: PathBuf,
}

impl InsertArgs {
    pub fn run(self, options: EngineOptions) -> CliResult<()> {
        let password = crate::cli::resolve_password(self.password, true)?;

        stegvault_core::commands::insert(
            &self.carrier,
            &self.payload,
            &self.output,
            password,
            options,
        )
    }
}
