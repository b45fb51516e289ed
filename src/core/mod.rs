//! Core domain types, configuration and errors for flushd.

#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AuthCredential, Config, ConfigBuilder, FlushConfig};
pub use error::{FlushdError, Result};
pub use types::{counter, gauge, DataSource, NormalizedRecord, RawSample, SampleValue, TypeDefinition};
