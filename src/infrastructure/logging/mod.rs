//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - Pretty or JSON formatting on stderr
//! - Optional daily-rolled JSON log file

pub mod logger;

pub use logger::LoggerImpl;
