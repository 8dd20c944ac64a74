//! Connection management for the AWS service clients

use crate::error::Result as CliResult;
use anyhow::Context;
use nephele_core::aws::{
    ConnectionSettings, Ec2Backend, LambdaBackend, RdsBackend, S3Backend, SdkConfig,
};
use nephele_core::config::StaticCredentials;
use nephele_core::{ComputeService, Config, DatabaseService, FunctionsService, StorageService};
use std::path::PathBuf;
use tracing::{debug, info, trace};

const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
const ENV_REGION: &str = "AWS_REGION";
const ENV_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
const ENV_ENDPOINT_URL: &str = "NEPHELE_ENDPOINT_URL";

/// Settings given as global command-line flags
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub region: Option<String>,
    pub retry_attempts: Option<u32>,
    pub no_retry: bool,
}

/// Connection manager for creating service clients
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    overrides: Overrides,
}

impl ConnectionManager {
    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
            overrides: Overrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Path of the config file in use
    pub fn resolved_config_path(&self) -> CliResult<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Config::config_path()?),
        }
    }

    /// Save `config` to the file this manager was loaded from
    pub fn save_config(&self, config: &Config) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// Resolve region, credentials, endpoint and retry settings
    ///
    /// Precedence is flag, then environment, then profile. When
    /// --config-file is given, environment variables are ignored so that
    /// the file is the only source of settings.
    pub fn resolve_settings(&self, profile_name: Option<&str>) -> CliResult<ConnectionSettings> {
        trace!("Profile name: {:?}", profile_name);

        let use_env_vars = self.config_path.is_none();
        debug!(
            "Config path: {:?}, use_env_vars: {}",
            self.config_path, use_env_vars
        );
        if !use_env_vars {
            info!("--config-file specified explicitly, ignoring environment variables");
        }

        let env = |name: &str| {
            if use_env_vars {
                std::env::var(name).ok().filter(|v| !v.is_empty())
            } else {
                None
            }
        };

        let env_access_key = env(ENV_ACCESS_KEY_ID);
        let env_secret_key = env(ENV_SECRET_ACCESS_KEY);
        let env_session_token = env(ENV_SESSION_TOKEN);
        let env_region = env(ENV_REGION).or_else(|| env(ENV_DEFAULT_REGION));
        let env_endpoint = env(ENV_ENDPOINT_URL);

        let profile = match self.config.resolve_profile(profile_name)? {
            Some(name) => {
                info!("Using profile: {}", name);
                Some(self.config.require_profile(&name)?)
            }
            None => {
                debug!("No profile configured, using the AWS default chain");
                None
            }
        };

        let mut settings = ConnectionSettings::default();

        let region = self
            .overrides
            .region
            .clone()
            .or(env_region)
            .or_else(|| profile.and_then(|p| p.region.clone()));
        if let Some(region) = region {
            debug!("Region: {}", region);
            settings = settings.region(region);
        }

        let credentials = if let (Some(key), Some(secret)) = (&env_access_key, &env_secret_key) {
            info!("Using credentials from environment variables");
            Some(StaticCredentials {
                access_key_id: key.clone(),
                secret_access_key: secret.clone(),
                session_token: env_session_token,
            })
        } else {
            let profile_credentials = match profile {
                Some(p) => p.resolve_credentials()?,
                None => None,
            };
            profile_credentials.map(|creds| {
                let has_overrides = env_access_key.is_some()
                    || env_secret_key.is_some()
                    || env_session_token.is_some();
                if has_overrides {
                    debug!("Applied partial environment variable overrides");
                }
                StaticCredentials {
                    access_key_id: env_access_key.unwrap_or(creds.access_key_id),
                    secret_access_key: env_secret_key.unwrap_or(creds.secret_access_key),
                    session_token: env_session_token.or(creds.session_token),
                }
            })
        };
        match credentials {
            Some(creds) => {
                trace!(
                    "Access key: {}...",
                    creds.access_key_id.chars().take(8).collect::<String>()
                );
                settings = settings.credentials(creds);
            }
            None => debug!("No static credentials, using the AWS default credential chain"),
        }

        if let Some(endpoint) = env_endpoint.or_else(|| profile.and_then(|p| p.endpoint_url.clone()))
        {
            info!("Using custom endpoint: {}", endpoint);
            settings = settings.endpoint_url(endpoint);
        }

        if let Some(resilience) = profile.and_then(|p| p.resilience.as_ref()) {
            settings = settings.resilience(resilience);
        }
        if self.overrides.no_retry {
            debug!("Retries disabled");
            settings = settings.max_attempts(1);
        } else if let Some(attempts) = self.overrides.retry_attempts {
            settings = settings.max_attempts(attempts);
        }

        Ok(settings)
    }

    /// Build the shared SDK configuration for a profile
    pub async fn sdk_config(&self, profile_name: Option<&str>) -> CliResult<SdkConfig> {
        let settings = self.resolve_settings(profile_name)?;
        let config = settings.load().await;
        debug!("SDK configuration loaded");
        Ok(config)
    }

    pub async fn compute(&self, profile_name: Option<&str>) -> CliResult<ComputeService<Ec2Backend>> {
        let config = self.sdk_config(profile_name).await?;
        Ok(ComputeService::new(Ec2Backend::new(&config)))
    }

    pub async fn functions(
        &self,
        profile_name: Option<&str>,
    ) -> CliResult<FunctionsService<LambdaBackend>> {
        let config = self.sdk_config(profile_name).await?;
        Ok(FunctionsService::new(LambdaBackend::new(&config)))
    }

    pub async fn database(
        &self,
        profile_name: Option<&str>,
    ) -> CliResult<DatabaseService<RdsBackend>> {
        let config = self.sdk_config(profile_name).await?;
        Ok(DatabaseService::new(RdsBackend::new(&config)))
    }

    pub async fn storage(&self, profile_name: Option<&str>) -> CliResult<StorageService<S3Backend>> {
        let config = self.sdk_config(profile_name).await?;
        Ok(StorageService::new(S3Backend::new(&config)))
    }
}
