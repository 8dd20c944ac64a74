//! Unified error handling for nephele-core
//!
//! Every service wrapper returns [`CoreError`]. Provider failures keep the
//! AWS error code so callers can classify them without string matching on
//! the message.
//!
//! # Example
//!
//! ```rust
//! use nephele_core::{CoreError, Service};
//!
//! let err = CoreError::api(
//!     Service::Ec2,
//!     Some("InvalidInstanceID.NotFound".to_string()),
//!     "The instance ID 'i-123' does not exist",
//! );
//! assert!(err.is_not_found());
//! assert!(!err.is_retryable());
//! ```

use std::fmt;
use thiserror::Error;

use crate::filter::FilterError;

/// Service area an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Ec2,
    Lambda,
    Rds,
    S3,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Ec2 => write!(f, "EC2"),
            Service::Lambda => write!(f, "Lambda"),
            Service::Rds => write!(f, "RDS"),
            Service::S3 => write!(f, "S3"),
        }
    }
}

/// Core error type for all service operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Error returned by an AWS service
    #[error("{service} API error: {message}")]
    Api {
        service: Service,
        code: Option<String>,
        message: String,
    },

    /// EC2 dry run that would have succeeded
    #[error("Dry run succeeded: {0}")]
    DryRun(String),

    /// Invalid user filter
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// Invalid input caught before any request was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Local filesystem failure (downloads, filter files)
    #[error("IO error for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

const NOT_FOUND_CODES: &[&str] = &[
    "NoSuchBucket",
    "NoSuchKey",
    "NotFound",
    "ResourceNotFoundException",
    "DBInstanceNotFound",
    "DBInstanceNotFoundFault",
];

const UNAUTHORIZED_CODES: &[&str] = &[
    "AuthFailure",
    "UnauthorizedOperation",
    "AccessDenied",
    "AccessDeniedException",
    "InvalidClientTokenId",
    "UnrecognizedClientException",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "ExpiredTokenException",
];

const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
    "SlowDown",
];

impl CoreError {
    /// Build an API error for the given service
    pub fn api(service: Service, code: Option<String>, message: impl Into<String>) -> Self {
        CoreError::Api {
            service,
            code,
            message: message.into(),
        }
    }

    /// Provider error code, if this error came from AWS
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            CoreError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Returns true if the requested resource does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.code().is_some_and(|code| {
            NOT_FOUND_CODES.contains(&code) || code.ends_with(".NotFound")
        })
    }

    /// Returns true if the credentials were rejected or lack permission
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.code()
            .is_some_and(|code| UNAUTHORIZED_CODES.contains(&code))
    }

    /// Returns true if the provider throttled the request
    #[must_use]
    pub fn is_throttled(&self) -> bool {
        self.code()
            .is_some_and(|code| THROTTLING_CODES.contains(&code))
    }

    /// Returns true for a dry run that would have succeeded
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        matches!(self, CoreError::DryRun(_))
    }

    /// Returns true for input errors caught locally
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(self, CoreError::Validation(_) | CoreError::Filter(_))
    }

    /// Returns true if this error is potentially retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.is_throttled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_err(code: &str) -> CoreError {
        CoreError::api(Service::Ec2, Some(code.to_string()), "boom")
    }

    #[test]
    fn test_not_found_codes() {
        assert!(api_err("InvalidInstanceID.NotFound").is_not_found());
        assert!(api_err("NoSuchBucket").is_not_found());
        assert!(api_err("ResourceNotFoundException").is_not_found());
        assert!(!api_err("AccessDenied").is_not_found());
    }

    #[test]
    fn test_unauthorized_codes() {
        assert!(api_err("UnauthorizedOperation").is_unauthorized());
        assert!(api_err("InvalidClientTokenId").is_unauthorized());
        assert!(!api_err("Throttling").is_unauthorized());
    }

    #[test]
    fn test_throttling_is_retryable() {
        let err = api_err("RequestLimitExceeded");
        assert!(err.is_throttled());
        assert!(err.is_retryable());
        assert!(!api_err("NoSuchKey").is_retryable());
    }

    #[test]
    fn test_api_error_without_code() {
        let err = CoreError::api(Service::S3, None, "dispatch failure");
        assert!(err.code().is_none());
        assert!(!err.is_not_found());
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_dry_run() {
        let err = CoreError::DryRun("Request would have succeeded".to_string());
        assert!(err.is_dry_run());
        assert!(!err.is_bad_request());
    }

    #[test]
    fn test_validation_and_filter_are_bad_requests() {
        assert!(CoreError::Validation("no ids".to_string()).is_bad_request());
        let filter: CoreError = FilterError::InvalidKey("color".to_string()).into();
        assert!(filter.is_bad_request());
    }

    #[test]
    fn test_display() {
        let err = CoreError::api(Service::Lambda, None, "function not reachable");
        assert_eq!(err.to_string(), "Lambda API error: function not reachable");

        let filter: CoreError = FilterError::InvalidFormat("name".to_string()).into();
        assert_eq!(
            filter.to_string(),
            "filter error: invalid filter format: 'name'"
        );
    }
}
