//! AWS SDK backed implementations of the service traits
//!
//! [`ConnectionSettings`] turns a resolved profile into an [`SdkConfig`],
//! which every backend is built from.

mod ec2;
mod lambda;
mod rds;
mod s3;

pub use ec2::Ec2Backend;
pub use lambda::LambdaBackend;
pub use rds::RdsBackend;
pub use s3::S3Backend;

pub use aws_config::SdkConfig;

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::{ResilienceConfig, StaticCredentials};
use crate::error::{CoreError, Service};

/// Provider name attached to credentials built from a profile
const PROVIDER_NAME: &str = "nephele-profile";

/// EC2 answers a successful dry run with this error code
const DRY_RUN_CODE: &str = "DryRunOperation";

/// Everything needed to build SDK clients
///
/// Unset fields fall back to the AWS default provider chain.
#[derive(Debug, Clone, Default)]
pub struct ConnectionSettings {
    region: Option<String>,
    credentials: Option<StaticCredentials>,
    endpoint_url: Option<String>,
    max_attempts: Option<u32>,
    operation_timeout: Option<Duration>,
}

impl ConnectionSettings {
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn credentials(mut self, credentials: StaticCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Total attempts per request; 1 disables retries
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Apply a profile's resilience section
    pub fn resilience(mut self, resilience: &ResilienceConfig) -> Self {
        self.max_attempts = Some(resilience.max_attempts);
        self.operation_timeout = resilience.operation_timeout();
        self
    }

    pub fn get_region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn get_endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    pub fn get_max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    pub fn get_operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout
    }

    pub fn get_credentials(&self) -> Option<&StaticCredentials> {
        self.credentials.as_ref()
    }

    /// Build the shared SDK configuration
    pub async fn load(&self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }

        if let Some(creds) = &self.credentials {
            trace!("Using static credentials {}", creds.access_key_id);
            loader = loader.credentials_provider(Credentials::new(
                creds.access_key_id.clone(),
                creds.secret_access_key.clone(),
                creds.session_token.clone(),
                None,
                PROVIDER_NAME,
            ));
        }

        if let Some(endpoint) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }

        if let Some(attempts) = self.max_attempts {
            let retry = if attempts <= 1 {
                RetryConfig::disabled()
            } else {
                RetryConfig::standard().with_max_attempts(attempts)
            };
            loader = loader.retry_config(retry);
        }

        if let Some(timeout) = self.operation_timeout {
            loader = loader.timeout_config(
                TimeoutConfig::builder().operation_timeout(timeout).build(),
            );
        }

        let config = loader.load().await;
        debug!(
            "Loaded SDK config (region={:?}, endpoint={:?})",
            config.region().map(|r| r.as_ref()),
            config.endpoint_url()
        );
        config
    }
}

/// Map an SDK failure onto [`CoreError`], keeping the provider error code
pub(crate) fn sdk_error<E, R>(service: Service, err: SdkError<E, R>) -> CoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: Debug,
{
    let code = err
        .as_service_error()
        .and_then(|e| e.code())
        .map(str::to_string);
    let message = err
        .as_service_error()
        .and_then(|e| e.message())
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

    debug!("{} request failed: code={:?} {}", service, code, message);

    if code.as_deref() == Some(DRY_RUN_CODE) {
        return CoreError::DryRun(message);
    }
    CoreError::api(service, code, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resilience_overrides_settings() {
        let settings = ConnectionSettings::default()
            .max_attempts(7)
            .resilience(&ResilienceConfig {
                max_attempts: 2,
                operation_timeout_secs: Some(10),
            });
        assert_eq!(settings.get_max_attempts(), Some(2));
        assert_eq!(settings.get_operation_timeout(), Some(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn test_load_applies_region_and_endpoint() {
        let config = ConnectionSettings::default()
            .region("ap-southeast-2")
            .endpoint_url("http://localhost:4566")
            .credentials(StaticCredentials {
                access_key_id: "AKIATEST".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: None,
            })
            .max_attempts(1)
            .load()
            .await;

        assert_eq!(config.region().map(|r| r.as_ref()), Some("ap-southeast-2"));
        assert_eq!(config.endpoint_url(), Some("http://localhost:4566"));
        assert_eq!(
            config.retry_config().map(|r| r.max_attempts()),
            Some(1)
        );
    }
}
