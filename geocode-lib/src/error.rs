//! Error handling for geocoding operations.
//!
//! This module defines a comprehensive error type that covers the different
//! ways a batch geocoding run can fail, from missing credentials to upstream
//! API failures.

use std::fmt;

/// Main error type for geocoding operations.
///
/// This enum covers all failure modes in the geocoding process, providing
/// detailed context for debugging and user-friendly error messages.
#[derive(Debug, Clone)]
pub enum GeocodeError {
    /// Configuration errors (missing API key, invalid settings, ...)
    Config {
        message: String,
    },

    /// Network-related errors (connection failures, DNS, ...)
    Network {
        message: String,
        source: Option<String>,
    },

    /// Upstream geocoding API errors (non-2xx status, non-JSON body)
    Upstream {
        address: String,
        message: String,
        status_code: Option<u16>,
    },

    /// JSON parsing errors for upstream responses
    Parse {
        message: String,
        content: Option<String>,
    },

    /// File I/O errors when reading address lists or writing output
    File {
        path: String,
        message: String,
    },

    /// Timeout errors when a request takes too long
    Timeout {
        operation: String,
        duration: std::time::Duration,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

impl GeocodeError {
    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new upstream error.
    pub fn upstream<A: Into<String>, M: Into<String>>(address: A, message: M) -> Self {
        Self::Upstream {
            address: address.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a new upstream error with HTTP status code.
    pub fn upstream_with_status<A: Into<String>, M: Into<String>>(
        address: A,
        message: M,
        status_code: u16,
    ) -> Self {
        Self::Upstream {
            address: address.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error aborts the whole batch.
    ///
    /// Configuration and file errors are fatal; upstream, network, parse and
    /// timeout errors are isolated into the affected address's record.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::File { .. })
    }
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::Network { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::Upstream {
                address,
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "Upstream error for '{}' (HTTP {}): {}", address, code, message)
                } else {
                    write!(f, "Upstream error for '{}': {}", address, message)
                }
            }
            Self::Parse { message, content: _ } => {
                write!(f, "Parse error: {}", message)
            }
            Self::File { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for GeocodeError {}

// Implement From conversions for common error types
impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout("HTTP request", std::time::Duration::from_secs(30))
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for GeocodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            message: format!("JSON parsing failed: {}", err),
            content: None,
        }
    }
}

impl From<std::io::Error> for GeocodeError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
