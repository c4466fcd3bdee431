//! # Stegvault Core API
//!
//! Hides a password protected payload inside BMP, PNG and JPEG images.
//!
//! The payload is encrypted with AES-256-GCM under a key derived from the
//! password with Argon2id. Its bits are scattered over the image in an order
//! only the password reproduces, and a small header in front carries what is
//! needed to find them again.
//!
//! # Usage Examples
//!
//! ## Hide data inside an image
//!
//! ```rust,no_run
//! stegvault_core::api::embed::prepare()
//!     .with_payload("Hello, World!")
//!     .with_password("SuperSecret42")
//!     .with_carrier("carrier.png")
//!     .with_output("carrier-with-secret.png")
//!     .execute()
//!     .expect("Failed to hide the payload");
//! ```
//!
//! ## Unveil data from an image
//!
//! ```rust,no_run
//! let payload = stegvault_core::api::extract::prepare()
//!     .with_carrier("carrier-with-secret.png")
//!     .with_password("SuperSecret42")
//!     .read()
//!     .expect("Failed to unveil the payload");
//!
//! assert_eq!(payload, b"Hello, World!");
//! ```
//!
//! ## Sessions
//!
//! The lower level [`Session`] works on bytes instead of files:
//!
//! ```rust,no_run
//! use stegvault_core::{Embed, EngineOptions, Session};
//!
//! let carrier = std::fs::read("carrier.bmp").unwrap();
//! let session = Session::<Embed>::from_bytes(carrier, &EngineOptions::default()).unwrap();
//! println!("{} bytes fit", session.capacity().max_payload_bytes);
//! let sealed = session.embed(b"hunter2", b"payload").unwrap();
//! sealed.save("out.bmp").unwrap();
//! ```

#![warn(clippy::redundant_else)]

pub mod api;
pub mod bits;
pub mod commands;
pub mod device;
pub mod engine;
pub mod error;
pub mod header;
pub mod loader;
pub mod options;
pub mod permutator;

pub use api::Password;
pub use device::{CarrierFormat, Device, SlotDevice};
pub use engine::{capacity, embed, extract, Capacity, Embed, Extract, Sealed, Session};
pub use error::{ErrorKind, StegError};
pub use options::{
    default_rounds, CoefficientOptions, DeviceOptions, EngineOptions, KdfParams,
    PermutationOptions, RasterOptions,
};
pub use permutator::Permutator;

pub type Result<T> = std::result::Result<T, StegError>;
