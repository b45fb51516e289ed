use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlushdError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown type '{type_name}'")]
    UnknownType { type_name: String },

    #[error("Differing number of values for type '{type_name}': expected {expected}, got {actual}")]
    ArityMismatch {
        type_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Collector rejected batch: status {status}, response: {body}")]
    Transmit { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout error: request took longer than {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Request signing error: {0}")]
    Auth(String),

    #[error("HTTP server error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for flushd operations
pub type Result<T> = std::result::Result<T, FlushdError>;

impl FlushdError {
    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Creates a new HTTP server error
    pub fn http<S: Into<String>>(msg: S) -> Self {
        Self::Http(msg.into())
    }

    /// Returns true for errors that must stop the process at startup.
    ///
    /// Everything else is scoped to a single sample or a single flush.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Http(_))
    }

    /// Returns true if the error rejected a single sample
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::UnknownType { .. } | Self::ArityMismatch { .. })
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::UnknownType { .. } | Self::ArityMismatch { .. } => "validation",
            Self::Transmit { .. } | Self::Network(_) => "network",
            Self::Timeout { .. } => "timeout",
            Self::Auth(_) => "auth",
            Self::Http(_) => "server",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = FlushdError::config("missing URL");
        assert_eq!(err.to_string(), "Configuration error: missing URL");
        assert_eq!(err.category(), "config");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_rejections_are_not_fatal() {
        let err = FlushdError::ArityMismatch {
            type_name: "load".to_string(),
            expected: 3,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "Differing number of values for type 'load': expected 3, got 1"
        );
        assert!(err.is_rejection());
        assert!(!err.is_fatal());

        let err = FlushdError::UnknownType {
            type_name: "bogus".to_string(),
        };
        assert!(err.is_rejection());
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn test_transmit_errors() {
        let err = FlushdError::Transmit {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Collector rejected batch: status 503, response: unavailable");
        assert!(!err.is_fatal());
        assert_eq!(FlushdError::Timeout { timeout_ms: 15000 }.category(), "timeout");
        assert_eq!(FlushdError::network("connection refused").category(), "network");
    }
}
