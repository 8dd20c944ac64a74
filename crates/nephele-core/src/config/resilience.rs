//! Retry and timeout settings stored per profile
//!
//! These map onto the SDK's standard retry strategy and operation timeout.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for retries and timeouts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Total attempts per request, including the first one. 1 disables retries.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Overall limit for one operation, retries included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_timeout_secs: Option<u64>,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            operation_timeout_secs: None,
        }
    }
}

impl ResilienceConfig {
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_secs.map(Duration::from_secs)
    }
}

fn default_max_attempts() -> u32 {
    3
}
