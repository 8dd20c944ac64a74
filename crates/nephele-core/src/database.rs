//! RDS instance listing

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::error::{CoreError, Result, Service};

const TERMINATED_STATUS: &str = "terminated";

const MAX_PAGES: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DbInstanceSummary {
    pub instance_id: String,
    pub status: Option<String>,
    pub endpoint: Option<String>,
    pub port: Option<i32>,
    pub instance_class: Option<String>,
    pub engine: Option<String>,
    pub engine_version: Option<String>,
    pub multi_az: bool,
}

impl DbInstanceSummary {
    /// `engine/version`, with `-` standing in for a missing part
    pub fn engine_info(&self) -> String {
        format!(
            "{}/{}",
            self.engine.as_deref().unwrap_or("-"),
            self.engine_version.as_deref().unwrap_or("-")
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbInstancePage {
    pub instances: Vec<DbInstanceSummary>,
    pub marker: Option<String>,
}

#[async_trait]
pub trait DatabaseApi: Send + Sync {
    async fn describe_db_instances(&self, marker: Option<String>) -> Result<DbInstancePage>;
}

pub struct DatabaseService<D> {
    api: D,
}

impl<D: DatabaseApi> DatabaseService<D> {
    pub fn new(api: D) -> Self {
        Self { api }
    }

    /// All DB instances in the region, excluding terminated ones
    pub async fn list_instances(&self) -> Result<Vec<DbInstanceSummary>> {
        let mut instances = Vec::new();
        let mut marker = None;

        for _ in 0..MAX_PAGES {
            let page = self.api.describe_db_instances(marker).await?;
            instances.extend(
                page.instances
                    .into_iter()
                    .filter(|db| db.status.as_deref() != Some(TERMINATED_STATUS)),
            );

            match page.marker {
                Some(next) if !next.is_empty() => marker = Some(next),
                _ => {
                    debug!("Found {} DB instance(s)", instances.len());
                    return Ok(instances);
                }
            }
        }

        Err(CoreError::api(
            Service::Rds,
            None,
            format!("listing did not finish after {} pages", MAX_PAGES),
        ))
    }
}
