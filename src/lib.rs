//! flushd - buffering metrics forwarder.
//!
//! flushd accepts measurement samples from a monitoring agent, validates
//! them against a collectd types database and forwards them in batches, as
//! JSON, to a remote HTTP collector.
//!
//! # Features
//!
//! - **Size and time triggers**: a batch goes out once `FlushMaxValues`
//!   records are buffered or `FlushIntervalSecs` have passed
//! - **Concurrent producers**: one short critical section per sample, network
//!   I/O always outside the lock
//! - **Pluggable authentication**: none, HTTP Basic, or OAuth 1.0a signing
//! - **At-most-once delivery**: failed flushes are logged and dropped
//!
//! # Architecture
//!
//! - `catalog`: types database
//! - `metrics`: sample normalization and the flush buffer
//! - `export`: dispatcher and request signing
//! - `application`: the forwarder context and write callback
//! - `receiver`: HTTP ingestion of agent samples
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```no_run
//! use flushd_lib::core::{ConfigBuilder, RawSample};
//! use flushd_lib::Forwarder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigBuilder::new()
//!         .url("https://collector.example.com/api/metrics")
//!         .build()?;
//!     let forwarder = Forwarder::new(&config)?;
//!
//!     forwarder.write(&RawSample::new("load", vec![0.4, 0.3, 0.2])).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod application;
pub mod catalog;
pub mod cli;
pub mod core;
pub mod export;
pub mod metrics;
pub mod monitoring;
pub mod receiver;

// Re-export core types for convenience
pub use crate::application::{Forwarder, WriteOutcome};
pub use crate::core::{Config, Result};
