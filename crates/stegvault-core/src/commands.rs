//! File based entry points, one per command line operation.

use std::path::Path;

use crate::engine::Capacity;
use crate::{EngineOptions, Password, StegError};

/// Hides the content of `payload_file` inside `carrier` and writes the result to `output`.
pub fn insert(
    carrier: &Path,
    payload_file: &Path,
    output: &Path,
    password: Password,
    options: EngineOptions,
) -> Result<(), StegError> {
    crate::api::embed::prepare()
        .with_options(options)
        .with_carrier(carrier)
        .with_payload_file(payload_file)
        .with_output(output)
        .with_password(password)
        .execute()
}

/// Unveils the payload of `carrier` into `output`.
pub fn extract(
    carrier: &Path,
    output: &Path,
    password: Password,
    options: EngineOptions,
) -> Result<(), StegError> {
    crate::api::extract::prepare()
        .with_options(options)
        .with_carrier(carrier)
        .with_output(output)
        .with_password(password)
        .execute()
}

pub fn capacity(carrier: &Path, options: EngineOptions) -> Result<Capacity, StegError> {
    crate::engine::capacity(carrier, &options)
}
