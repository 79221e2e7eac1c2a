//! Error types for Reactor.

use thiserror::Error;

/// Main error type for Reactor operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReactorError {
    /// A plan node carries a mode or combinator that cannot be executed.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A block was built with an unusable target.
    #[error("Malformed target: {message}")]
    MalformedTarget { message: String },

    /// The HTTP round trip did not complete.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The execution context was cancelled or its deadline passed.
    #[error("Execution cancelled")]
    Cancelled,

    /// An environment value could not be interpreted.
    #[error("Invalid configuration value: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ReactorError {
    /// Returns true if this error is recoverable.
    ///
    /// Recoverable errors are swallowed by the dispatcher; everything else
    /// aborts the subtree that raised it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ReactorError::Transport(_) | ReactorError::Cancelled)
    }

    /// Configuration error for a node whose mode cannot be executed.
    pub fn unsupported_mode(node: &str, raw: &str) -> Self {
        ReactorError::Configuration {
            message: format!("unsupported {} mode '{}'", node, raw),
        }
    }
}

/// Convenience Result type for Reactor operations.
pub type Result<T> = std::result::Result<T, ReactorError>;

impl From<serde_json::Error> for ReactorError {
    fn from(err: serde_json::Error) -> Self {
        ReactorError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable() {
        assert!(ReactorError::Transport("refused".to_string()).is_recoverable());
        assert!(ReactorError::Cancelled.is_recoverable());
        assert!(!ReactorError::unsupported_mode("block", "x").is_recoverable());
        assert!(!ReactorError::MalformedTarget {
            message: "empty".to_string()
        }
        .is_recoverable());
    }

    #[test]
    fn test_from_serde_json() {
        let err: ReactorError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ReactorError::SerializationError(_)));
    }
}
