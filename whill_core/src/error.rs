//! Error types shared by every WHILL telemetry crate

use thiserror::Error;

/// Result alias used throughout the runtime
pub type WhillResult<T> = std::result::Result<T, WhillError>;

/// Errors raised by the node runtime, topics and configuration loading
#[derive(Debug, Error)]
pub enum WhillError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Communication error: {0}")]
    Communication(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WhillError {
    pub fn config(msg: impl Into<String>) -> Self {
        WhillError::Config(msg.into())
    }

    pub fn communication(msg: impl Into<String>) -> Self {
        WhillError::Communication(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_category() {
        let err = WhillError::config("missing topic");
        assert_eq!(err.to_string(), "Configuration error: missing topic");

        let err = WhillError::communication("type mismatch");
        assert_eq!(err.to_string(), "Communication error: type mismatch");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: WhillError = io.into();
        assert!(matches!(err, WhillError::Io(_)));
    }
}
