use std::fs;
use std::path::{Path, PathBuf};

use crate::{EngineOptions, Password, StegError};

pub fn prepare() -> EmbedApi {
    EmbedApi::default()
}

#[derive(Default, Debug)]
pub struct EmbedApi {
    payload: Option<Vec<u8>>,
    payload_file: Option<PathBuf>,
    carrier: Option<PathBuf>,
    output: Option<PathBuf>,
    password: Password,
    options: EngineOptions,
}

impl EmbedApi {
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Hide these bytes
    pub fn with_payload<B: AsRef<[u8]>>(mut self, payload: B) -> Self {
        self.payload = Some(payload.as_ref().to_vec());
        self
    }

    /// Hide the content of this file, takes precedence over [`EmbedApi::with_payload`]
    pub fn with_payload_file<A: AsRef<Path>>(mut self, payload_file: A) -> Self {
        self.payload_file = Some(payload_file.as_ref().to_path_buf());
        self
    }

    pub fn with_carrier<A: AsRef<Path>>(mut self, carrier: A) -> Self {
        self.carrier = Some(carrier.as_ref().to_path_buf());
        self
    }

    pub fn with_output<A: AsRef<Path>>(mut self, output: A) -> Self {
        self.output = Some(output.as_ref().to_path_buf());
        self
    }

    pub fn with_password<P: Into<Password>>(mut self, password: P) -> Self {
        self.password = password.into();
        self
    }

    pub fn execute(self) -> Result<(), StegError> {
        let Some(carrier) = self.carrier else {
            return Err(StegError::CarrierNotSet);
        };
        let Some(output) = self.output else {
            return Err(StegError::TargetNotSet);
        };
        let Some(password) = self.password.as_bytes() else {
            return Err(StegError::PasswordNotSet);
        };
        let payload = match (self.payload_file, self.payload) {
            (Some(file), _) => fs::read(file).map_err(|source| StegError::ReadError { source })?,
            (None, Some(payload)) => payload,
            (None, None) => return Err(StegError::PayloadNotSet),
        };

        crate::engine::embed(carrier, password, &payload, output, &self.options)
    }
}
