//! Error types for the logging subsystem

use thiserror::Error;

/// Errors raised while bootstrapping logging
#[derive(Debug, Clone, Error)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),
}
