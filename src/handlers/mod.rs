//! HTTP handlers for readings.

pub mod readings;
pub use readings::*;
