//! Error types for nephele
//!
//! Every command handler returns [`NepheleError`]; `main` prints it as a
//! cargo-style diagnostic with suggestions.

use colored::Colorize;
use nephele_core::{ConfigError, CoreError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Profile 'work' not found
///
///   tip: List available profiles: nephele profile list
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<String>,
}

impl CliDiagnostic {
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    pub fn tip(mut self, description: &str) -> Self {
        self.tips.push(description.to_string());
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for description in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
        }
    }
}

/// Main error type for the nephele application
#[derive(Error, Debug)]
pub enum NepheleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured. Use 'nephele profile set' to configure a profile.")]
    NoProfileConfigured,

    #[error("Invalid credentials: {message}")]
    InvalidCredentials { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Request throttled: {message}")]
    Throttled { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Invalid filter: {message}")]
    InvalidFilter { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("File error for '{path}': {message}")]
    FileError { path: String, message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for nephele commands
pub type Result<T> = std::result::Result<T, NepheleError>;

impl NepheleError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            NepheleError::ProfileNotFound { name } => vec![
                "List available profiles: nephele profile list".to_string(),
                format!("Create profile '{}': nephele profile set {} --region <region>", name, name),
                "Check profile name spelling".to_string(),
            ],
            NepheleError::NoProfileConfigured => vec![
                "Create a profile: nephele profile set work --region eu-west-1".to_string(),
                "Or rely on the AWS environment: export AWS_REGION=eu-west-1".to_string(),
            ],
            NepheleError::InvalidCredentials { .. } => vec![
                "Check profile details: nephele profile show <profile>".to_string(),
                "Both --access-key-id and --secret-access-key must be set together".to_string(),
                "Check the profile for problems: nephele profile validate".to_string(),
            ],
            NepheleError::AuthenticationFailed { .. } => vec![
                "Check your credentials: nephele profile show <profile>".to_string(),
                "Verify AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY if set".to_string(),
                "Session tokens expire; refresh them if you use temporary credentials".to_string(),
            ],
            NepheleError::NotFound { .. } => vec![
                "Verify the resource name or ID is correct".to_string(),
                "Check that the profile points at the right region: nephele profile show <profile>"
                    .to_string(),
            ],
            NepheleError::Throttled { .. } => vec![
                "Retry with more attempts: --retry-attempts 5".to_string(),
            ],
            NepheleError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the endpoint_url of the profile if one is set".to_string(),
            ],
            NepheleError::InvalidFilter { .. } => vec![
                "Filters are written as key=value, e.g. --filter state=running".to_string(),
                format!(
                    "Supported keys: {}",
                    nephele_core::filter::supported_keys()
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            ],
            NepheleError::InvalidInput { .. } => vec![
                "Check the command syntax: nephele <command> --help".to_string(),
            ],
            NepheleError::FileError { path, .. } => vec![
                format!("Check that the path exists and is writable: {}", path),
                "Verify file permissions are correct".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&format!("{}", self));

        if let NepheleError::InvalidFilter { .. } = self {
            diag = diag.detail("Filter keys are case-sensitive.");
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion);
        }

        diag.print();
    }
}

impl From<CoreError> for NepheleError {
    fn from(err: CoreError) -> Self {
        match err {
            ref e if e.is_unauthorized() => NepheleError::AuthenticationFailed {
                message: e.to_string(),
            },
            ref e if e.is_not_found() => NepheleError::NotFound {
                message: e.to_string(),
            },
            ref e if e.is_throttled() => NepheleError::Throttled {
                message: e.to_string(),
            },
            CoreError::Api {
                code: None,
                service,
                message,
            } => NepheleError::ConnectionError {
                message: format!("{}: {}", service, message),
            },
            CoreError::Filter(e) => NepheleError::InvalidFilter {
                message: e.to_string(),
            },
            CoreError::Validation(message) => NepheleError::InvalidInput { message },
            CoreError::Io { path, source } => NepheleError::FileError {
                path,
                message: source.to_string(),
            },
            CoreError::Config(message) => NepheleError::Config(message),
            other => NepheleError::ApiError {
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for NepheleError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => NepheleError::ProfileNotFound { name },
            ConfigError::NoProfiles { .. } => NepheleError::NoProfileConfigured,
            ConfigError::CredentialError(message) => NepheleError::InvalidCredentials { message },
            other => NepheleError::Config(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for NepheleError {
    fn from(err: serde_json::Error) -> Self {
        NepheleError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for NepheleError {
    fn from(err: std::io::Error) -> Self {
        NepheleError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for NepheleError {
    fn from(err: anyhow::Error) -> Self {
        // keep typed errors that were wrapped with context
        if let Some(ConfigError::ProfileNotFound { name }) = err.downcast_ref::<ConfigError>() {
            return NepheleError::ProfileNotFound { name: name.clone() };
        }
        NepheleError::Config(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nephele_core::{FilterError, Service};

    #[test]
    fn test_core_error_classification() {
        let denied = CoreError::api(
            Service::S3,
            Some("AccessDenied".to_string()),
            "Access Denied",
        );
        assert!(matches!(
            NepheleError::from(denied),
            NepheleError::AuthenticationFailed { .. }
        ));

        let missing = CoreError::api(
            Service::Lambda,
            Some("ResourceNotFoundException".to_string()),
            "Function not found: ghost",
        );
        let err = NepheleError::from(missing);
        assert!(matches!(err, NepheleError::NotFound { .. }));
        assert!(err.to_string().contains("ghost"));

        let throttled = CoreError::api(Service::Ec2, Some("RequestLimitExceeded".to_string()), "slow down");
        assert!(matches!(
            NepheleError::from(throttled),
            NepheleError::Throttled { .. }
        ));
    }

    #[test]
    fn test_api_error_without_code_is_connection_error() {
        let err = NepheleError::from(CoreError::api(Service::Rds, None, "dispatch failure"));
        assert!(matches!(err, NepheleError::ConnectionError { .. }));
        assert!(err.to_string().contains("RDS"));
    }

    #[test]
    fn test_filter_error_maps_to_invalid_filter() {
        let err = NepheleError::from(CoreError::from(FilterError::InvalidKey("color".to_string())));
        assert!(matches!(err, NepheleError::InvalidFilter { .. }));
        assert!(err.suggestions().iter().any(|s| s.contains("Supported keys")));
    }

    #[test]
    fn test_config_error_mapping() {
        let err = NepheleError::from(ConfigError::ProfileNotFound {
            name: "work".to_string(),
        });
        assert_eq!(err.to_string(), "Profile 'work' not found");
        assert_eq!(err.suggestions().len(), 3);

        let err = NepheleError::from(ConfigError::NoProfiles {
            suggestion: String::new(),
        });
        assert!(matches!(err, NepheleError::NoProfileConfigured));
    }

    #[test]
    fn test_anyhow_keeps_profile_not_found() {
        let err = anyhow::Error::new(ConfigError::ProfileNotFound {
            name: "ghost".to_string(),
        })
        .context("Failed to resolve profile");
        assert!(matches!(
            NepheleError::from(err),
            NepheleError::ProfileNotFound { .. }
        ));
    }
}
