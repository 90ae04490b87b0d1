//! Snapshot persistence.

pub mod snapshot;

pub use snapshot::{DeserializeError, SerializeError, Snapshot};
