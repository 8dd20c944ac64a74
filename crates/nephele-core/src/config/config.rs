//! Configuration management for nephele
//!
//! Configuration is stored in TOML format with support for multiple named
//! profiles. Each profile carries what is needed to build AWS SDK clients.

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use super::resilience::ResilienceConfig;

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Profile used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// Individual profile configuration
///
/// Every field is optional. Anything left out falls back to the AWS default
/// provider chain (environment, shared config files, instance metadata).
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Supports `keyring:` prefix for secure storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    /// Supports `keyring:` prefix for secure storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    /// Custom service endpoint, e.g. a local emulator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resilience: Option<ResilienceConfig>,
}

/// Access keys after keyring references have been resolved
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Profile {
    /// True when both halves of an access key pair are present
    pub fn has_static_credentials(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }

    /// Resolve the profile's access keys (with keyring support)
    ///
    /// Returns `None` when the profile has no keys, leaving credentials to the
    /// default provider chain.
    pub fn resolve_credentials(&self) -> Result<Option<StaticCredentials>> {
        let (access_key_id, secret_access_key) =
            match (&self.access_key_id, &self.secret_access_key) {
                (Some(key), Some(secret)) => (key, secret),
                (None, None) => return Ok(None),
                (Some(_), None) => {
                    return Err(ConfigError::CredentialError(
                        "access_key_id is set but secret_access_key is missing".to_string(),
                    ));
                }
                (None, Some(_)) => {
                    return Err(ConfigError::CredentialError(
                        "secret_access_key is set but access_key_id is missing".to_string(),
                    ));
                }
            };

        let store = CredentialStore::new();
        let resolve = |value: &str, what: &str| {
            store.get_credential(value).map_err(|e| {
                ConfigError::CredentialError(format!("Failed to resolve {}: {}", what, e))
            })
        };

        Ok(Some(StaticCredentials {
            access_key_id: resolve(access_key_id, "access key id")?,
            secret_access_key: resolve(secret_access_key, "secret access key")?,
            session_token: self
                .session_token
                .as_deref()
                .map(|token| resolve(token, "session token"))
                .transpose()?,
        }))
    }

    /// Problems that would stop this profile from working
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        match (&self.access_key_id, &self.secret_access_key) {
            (Some(_), None) => issues.push("access_key_id without secret_access_key".to_string()),
            (None, Some(_)) => issues.push("secret_access_key without access_key_id".to_string()),
            _ => {}
        }
        if self.session_token.is_some() && !self.has_static_credentials() {
            issues.push("session_token requires access keys".to_string());
        }
        if let Some(region) = &self.region
            && region.trim().is_empty()
        {
            issues.push("region is empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint_url
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            issues.push(format!(
                "endpoint_url '{}' must start with http:// or https://",
                endpoint
            ));
        }
        if let Some(resilience) = &self.resilience
            && resilience.max_attempts == 0
        {
            issues.push("resilience.max_attempts must be at least 1".to_string());
        }

        issues
    }
}

impl Config {
    /// Resolve the profile to use
    ///
    /// Order: explicit name, `default_profile`, then the alphabetically first
    /// profile. `None` means no profiles exist and the AWS default chain
    /// should be used.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<Option<String>> {
        if let Some(name) = explicit_profile {
            return self.require_profile(name).map(|_| Some(name.to_string()));
        }

        if let Some(ref default) = self.default_profile {
            return self.require_profile(default).map(|_| Some(default.clone()));
        }

        Ok(self.list_profiles().first().map(|(name, _)| (*name).clone()))
    }

    /// Resolve a profile that must exist
    pub fn resolve_required_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        self.resolve_profile(explicit_profile)?
            .ok_or_else(|| ConfigError::NoProfiles {
                suggestion: "Use 'nephele profile set' to create a profile.".to_string(),
            })
    }

    /// Look up a profile by name
    pub fn require_profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
            })
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// A missing file is not an error and yields an empty configuration.
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            debug!("No config file at {}", config_path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);
        let config: Config = toml::from_str(&expanded_content)?;

        debug!(
            "Loaded {} profile(s) from {}",
            config.profiles.len(),
            config_path.display()
        );
        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name, clearing the default if it pointed there
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// Make an existing profile the default
    pub fn set_default_profile(&mut self, name: &str) -> Result<()> {
        self.require_profile(name)?;
        self.default_profile = Some(name.to_string());
        Ok(())
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Problems across the whole file, each prefixed with its profile name
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if let Some(default) = &self.default_profile
            && !self.profiles.contains_key(default)
        {
            issues.push(format!(
                "default_profile '{}' does not match any profile",
                default
            ));
        }

        for (name, profile) in self.list_profiles() {
            issues.extend(
                profile
                    .validate()
                    .into_iter()
                    .map(|issue| format!("{}: {}", name, issue)),
            );
        }

        issues
    }

    /// Get the path to the configuration file
    ///
    /// On macOS, `~/.config/nephele/config.toml` is preferred when it (or its
    /// directory) exists, falling back to the platform path.
    ///
    /// On Linux: ~/.config/nephele/config.toml
    /// On Windows: %APPDATA%\nephele\nephele\config\config.toml
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("nephele")
                    .join("config.toml");

                if linux_style_path.exists()
                    || linux_style_path.parent().is_some_and(|p| p.exists())
                {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("io", "nephele", "nephele").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references
    ///
    /// Unset variables without a default are left untouched so that profiles
    /// which are not in use never fail to load.
    ///
    /// ```toml
    /// access_key_id = "${WORK_AWS_KEY}"
    /// region = "${WORK_REGION:-eu-west-1}"
    /// ```
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok())
            .to_string()
    }
}
