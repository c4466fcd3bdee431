use std::fmt::{self, Debug, Formatter};

use zeroize::Zeroizing;

/// A password that never shows up in debug output and is wiped on drop.
///
/// Passwords are plain bytes, they need not be valid UTF-8.
#[derive(Default, Clone)]
pub struct Password(Option<Zeroizing<Vec<u8>>>);

impl Password {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.0.as_deref().map(|p| &p[..])
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(password) = &self.0 {
            write!(f, "Password({})", "*".repeat(password.len()))
        } else {
            write!(f, "Password(None)")
        }
    }
}

impl From<Option<String>> for Password {
    fn from(password: Option<String>) -> Self {
        Self(password.map(|p| Zeroizing::new(p.into_bytes())))
    }
}

impl From<Vec<u8>> for Password {
    fn from(password: Vec<u8>) -> Self {
        Self(Some(Zeroizing::new(password)))
    }
}

impl From<&[u8]> for Password {
    fn from(password: &[u8]) -> Self {
        password.to_vec().into()
    }
}

impl From<String> for Password {
    fn from(password: String) -> Self {
        password.into_bytes().into()
    }
}

impl From<&str> for Password {
    fn from(password: &str) -> Self {
        password.as_bytes().into()
    }
}
