//! EC2 instance operations
//!
//! [`ComputeService`] wraps any [`ComputeApi`] implementation and adds the
//! behaviour shared by every caller: terminated instances are hidden from
//! listings and empty id lists are rejected before a request is made.
//!
//! ```rust,ignore
//! let compute = ComputeService::new(Ec2Backend::new(&sdk_config));
//! let filters = FilterSet::from_args(&["name=web".to_string()])?;
//! for instance in compute.list_instances(&filters).await? {
//!     println!("{} {}", instance.instance_id, instance.state);
//! }
//! ```

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{CoreError, Result};
use crate::filter::{Filter, FilterSet};

/// State EC2 keeps around briefly after an instance is gone
pub const TERMINATED_STATE: &str = "terminated";

/// One EC2 instance, reduced to what the listing shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSummary {
    /// Value of the `Name` tag
    pub name: Option<String>,
    pub instance_id: String,
    pub state: String,
    pub private_ip: Option<String>,
    pub public_ip: Option<String>,
    pub instance_type: String,
    pub availability_zone: Option<String>,
}

/// Result of a start or stop request for one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateChange {
    pub instance_id: String,
    pub previous_state: String,
    pub current_state: String,
}

/// Provider operations needed for compute commands
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Describe instances matching all filters, reading every page
    async fn describe_instances(&self, filters: &[Filter]) -> Result<Vec<InstanceSummary>>;

    async fn start_instances(&self, ids: &[String], dry_run: bool) -> Result<Vec<StateChange>>;

    async fn stop_instances(&self, ids: &[String], dry_run: bool) -> Result<Vec<StateChange>>;
}

/// EC2 operations for the CLI
pub struct ComputeService<C> {
    api: C,
}

impl<C: ComputeApi> ComputeService<C> {
    pub fn new(api: C) -> Self {
        Self { api }
    }

    /// List instances matching `filters`, skipping terminated ones
    pub async fn list_instances(&self, filters: &FilterSet) -> Result<Vec<InstanceSummary>> {
        debug!("Describing instances with {} filter(s)", filters.len());

        let instances = self.api.describe_instances(filters.as_slice()).await?;
        let total = instances.len();
        let visible: Vec<_> = instances
            .into_iter()
            .filter(|instance| instance.state != TERMINATED_STATE)
            .collect();

        debug!(
            "Found {} instance(s), {} after skipping terminated",
            total,
            visible.len()
        );
        Ok(visible)
    }

    pub async fn start_instances(&self, ids: &[String], dry_run: bool) -> Result<Vec<StateChange>> {
        validate_ids(ids)?;
        info!("Starting {} instance(s) (dry_run={})", ids.len(), dry_run);
        self.api.start_instances(ids, dry_run).await
    }

    pub async fn stop_instances(&self, ids: &[String], dry_run: bool) -> Result<Vec<StateChange>> {
        validate_ids(ids)?;
        info!("Stopping {} instance(s) (dry_run={})", ids.len(), dry_run);
        self.api.stop_instances(ids, dry_run).await
    }
}

fn validate_ids(ids: &[String]) -> Result<()> {
    if ids.is_empty() {
        return Err(CoreError::Validation(
            "at least one instance id is required".to_string(),
        ));
    }
    if let Some(blank) = ids.iter().find(|id| id.trim().is_empty()) {
        return Err(CoreError::Validation(format!(
            "invalid instance id: '{}'",
            blank
        )));
    }
    Ok(())
}
