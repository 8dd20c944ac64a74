use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_rds::Client;
use aws_sdk_rds::types::DbInstance;

use super::sdk_error;
use crate::database::{DatabaseApi, DbInstancePage, DbInstanceSummary};
use crate::error::{Result, Service};

/// [`DatabaseApi`] over the RDS SDK client
#[derive(Debug, Clone)]
pub struct RdsBackend {
    client: Client,
}

impl RdsBackend {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl DatabaseApi for RdsBackend {
    async fn describe_db_instances(&self, marker: Option<String>) -> Result<DbInstancePage> {
        let output = self
            .client
            .describe_db_instances()
            .set_marker(marker)
            .send()
            .await
            .map_err(|e| sdk_error(Service::Rds, e))?;

        Ok(DbInstancePage {
            instances: output.db_instances().iter().map(summarize).collect(),
            marker: output.marker().map(str::to_string),
        })
    }
}

fn summarize(db: &DbInstance) -> DbInstanceSummary {
    DbInstanceSummary {
        instance_id: db.db_instance_identifier().unwrap_or_default().to_string(),
        status: db.db_instance_status().map(str::to_string),
        endpoint: db
            .endpoint()
            .and_then(|e| e.address())
            .map(str::to_string),
        port: db.endpoint().and_then(|e| e.port()),
        instance_class: db.db_instance_class().map(str::to_string),
        engine: db.engine().map(str::to_string),
        engine_version: db.engine_version().map(str::to_string),
        multi_az: db.multi_az().unwrap_or(false),
    }
}
