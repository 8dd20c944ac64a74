//! Configuration and profile management for nephele
//!
//! Profiles hold the region, credentials, and optional endpoint used to build
//! AWS SDK clients.
//!
//! # Features
//!
//! - Multiple named profiles with a default
//! - Secure credential storage using OS keyring (optional)
//! - Environment variable expansion in config files
//! - Platform-specific config file locations

#![allow(clippy::module_inception)]

pub mod config;
pub mod credential;
pub mod error;
pub mod resilience;

pub use config::{Config, Profile, StaticCredentials};
pub use credential::{CredentialStorage, CredentialStore};
pub use error::{ConfigError, Result};
pub use resilience::ResilienceConfig;
