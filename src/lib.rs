//! Package registry push client
//!
//! This file serves as the library root for the pkgpush crate, organizing and
//! exposing the modules that make up the application.

pub mod cli;
pub mod config;
pub mod error;
pub mod listing;
pub mod logging;
pub mod output;
pub mod registry;
pub mod sync;
pub mod upload;

pub use config::{CHUNK_SIZE, ClientConfig, PollConfig};
pub use error::{RegistryError, Result};
pub use logging::Logger;
