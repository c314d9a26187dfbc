//! CLI command implementations.

pub mod new;
pub mod run;
pub mod status;
