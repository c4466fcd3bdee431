use std::process::ExitCode;

use clap::Parser;
use log::error;
use stegvault_core::{ErrorKind, StegError};

mod cli;
mod commands;

use cli::{CliArgs, Commands};

pub type CliResult<T> = Result<T, StegError>;

fn main() -> ExitCode {
    env_logger::init();

    let args = CliArgs::parse();
    let options = args.engine_options();

    let result = match args.command {
        Commands::Insert(insert) => insert.run(options),
        Commands::Extract(extract) => extract.run(options),
        Commands::Capacity(capacity) => capacity.run(options),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:?}");
            eprintln!("Error: {e}");
            ExitCode::from(exit_code(e.kind()))
        }
    }
}

fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::InvalidInput => 2,
        ErrorKind::UnsupportedFormat => 3,
        ErrorKind::CorruptCarrier => 4,
        ErrorKind::CapacityExceeded => 5,
        ErrorKind::IntegrityFailure => 6,
        ErrorKind::IoError => 7,
    }
}
