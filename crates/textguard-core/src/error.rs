//! Error types for TextGuard

/// Result type alias using TextGuard's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for TextGuard operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Classifier loading or inference errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short machine-readable name of the error kind, used as a metric label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Classifier(_) => "classifier",
            Self::Config(_) => "config",
            Self::Timeout => "timeout",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::classifier("forward pass failed");
        assert_eq!(err.to_string(), "classifier error: forward pass failed");
        assert_eq!(err.kind(), "classifier");

        assert_eq!(Error::Timeout.to_string(), "operation timed out");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Error::config("bad port").kind(), "config");
        assert_eq!(Error::Timeout.kind(), "timeout");
        assert_eq!(Error::internal("join failed").kind(), "internal");
    }
}
