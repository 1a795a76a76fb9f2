//! Common utilities and patterns shared across chunkwise crates
//!
//! Correlation ids, environment bootstrap, error helpers and message
//! sanitization live here so every crate reports failures the same way.

pub mod correlation;
pub mod error;
pub mod error_sanitizer;
pub mod init;

pub use correlation::CorrelationId;
pub use error::CommonError;
pub use init::initialize_environment;
