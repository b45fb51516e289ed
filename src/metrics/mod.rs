//! Sample processing: normalization against the types database and the
//! shared flush buffer.

pub mod buffer;
pub mod normalizer;

pub use buffer::{FlushBuffer, FlushDecision};
pub use normalizer::normalize;
