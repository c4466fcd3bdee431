use std::path::{Path, PathBuf};

use crate::{EngineOptions, Password, StegError};

pub fn prepare() -> ExtractApi {
    ExtractApi::default()
}

#[derive(Default, Debug)]
pub struct ExtractApi {
    carrier: Option<PathBuf>,
    output: Option<PathBuf>,
    password: Password,
    options: EngineOptions,
}

impl ExtractApi {
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_carrier<A: AsRef<Path>>(mut self, carrier: A) -> Self {
        self.carrier = Some(carrier.as_ref().to_path_buf());
        self
    }

    /// Write the payload to this file, see [`ExtractApi::execute`]
    pub fn with_output<A: AsRef<Path>>(mut self, output: A) -> Self {
        self.output = Some(output.as_ref().to_path_buf());
        self
    }

    pub fn with_password<P: Into<Password>>(mut self, password: P) -> Self {
        self.password = password.into();
        self
    }

    /// Unveil the payload and return it.
    pub fn read(self) -> Result<Vec<u8>, StegError> {
        let Some(carrier) = self.carrier else {
            return Err(StegError::CarrierNotSet);
        };
        let Some(password) = self.password.as_bytes() else {
            return Err(StegError::PasswordNotSet);
        };

        crate::engine::extract(carrier, password, &self.options)
    }

    /// Unveil the payload and write it atomically to the output file.
    pub fn execute(mut self) -> Result<(), StegError> {
        let Some(output) = self.output.take() else {
            return Err(StegError::TargetNotSet);
        };
        let payload = self.read()?;

        crate::loader::persist(&payload, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parts_are_reported() {
        assert!(matches!(
            prepare().with_password("pw").read(),
            Err(StegError::CarrierNotSet)
        ));
        assert!(matches!(
            prepare().with_carrier("a.png").read(),
            Err(StegError::PasswordNotSet)
        ));
        assert!(matches!(
            prepare().with_carrier("a.png").with_password("pw").execute(),
            Err(StegError::TargetNotSet)
        ));
    }
}
