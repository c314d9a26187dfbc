//! Infrastructure adapters for external systems.

pub mod source;
pub mod sql;
