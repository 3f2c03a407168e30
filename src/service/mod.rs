//! Data access: one statement per call against the readings table.

mod readings;
pub use readings::{PgReadingStore, ReadingStore};

#[cfg(test)]
pub(crate) mod memory;
