//! Error taxonomy shared by validation, conversion and load testing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Wrong input type or shape.
    Type,
    /// Numeric value outside acceptable bounds.
    Range,
    /// Malformed or unrecognized currency code.
    Format,
    /// Adversarial pattern detected in input.
    Security,
    /// Unexpected internal failure.
    System,
    /// Simulated transport failure (timeout or dropped connection).
    Network,
    /// Simulated upstream throttling.
    RateLimit,
    /// Simulated upstream server error.
    Server,
    /// Simulated malformed upstream response.
    Service,
}

impl ErrorKind {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Type => "type",
            ErrorKind::Range => "range",
            ErrorKind::Format => "format",
            ErrorKind::Security => "security",
            ErrorKind::System => "system",
            ErrorKind::Network => "network",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::Server => "server",
            ErrorKind::Service => "service",
        }
    }

    /// Check if a request failing with this kind may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::RateLimit | ErrorKind::Server | ErrorKind::Service
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How serious a failure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&ErrorKind::RateLimit).unwrap(), "\"rate_limit\"");
        assert_eq!(serde_json::to_string(&ErrorKind::Type).unwrap(), "\"type\"");
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
        assert_eq!(ErrorKind::Security.to_string(), "security");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorKind::Network.is_retryable());
        assert!(ErrorKind::Service.is_retryable());
        assert!(!ErrorKind::Range.is_retryable());
        assert!(!ErrorKind::System.is_retryable());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
    }
}
