use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::{Filter as Ec2Filter, Instance, InstanceStateChange};
use tracing::debug;

use super::sdk_error;
use crate::compute::{ComputeApi, InstanceSummary, StateChange};
use crate::error::{Result, Service};
use crate::filter::Filter;

/// [`ComputeApi`] over the EC2 SDK client
#[derive(Debug, Clone)]
pub struct Ec2Backend {
    client: Client,
}

impl Ec2Backend {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl ComputeApi for Ec2Backend {
    async fn describe_instances(&self, filters: &[Filter]) -> Result<Vec<InstanceSummary>> {
        let sdk_filters: Vec<Ec2Filter> = filters
            .iter()
            .map(|f| {
                Ec2Filter::builder()
                    .name(&f.name)
                    .set_values(Some(f.values.clone()))
                    .build()
            })
            .collect();

        let mut instances = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .describe_instances()
                .set_filters((!sdk_filters.is_empty()).then(|| sdk_filters.clone()))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error(Service::Ec2, e))?;

            for reservation in output.reservations() {
                instances.extend(reservation.instances().iter().map(summarize));
            }

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!("DescribeInstances returned {} instance(s)", instances.len());
        Ok(instances)
    }

    async fn start_instances(&self, ids: &[String], dry_run: bool) -> Result<Vec<StateChange>> {
        let output = self
            .client
            .start_instances()
            .set_instance_ids(Some(ids.to_vec()))
            .dry_run(dry_run)
            .send()
            .await
            .map_err(|e| sdk_error(Service::Ec2, e))?;

        Ok(output.starting_instances().iter().map(state_change).collect())
    }

    async fn stop_instances(&self, ids: &[String], dry_run: bool) -> Result<Vec<StateChange>> {
        let output = self
            .client
            .stop_instances()
            .set_instance_ids(Some(ids.to_vec()))
            .dry_run(dry_run)
            .send()
            .await
            .map_err(|e| sdk_error(Service::Ec2, e))?;

        Ok(output.stopping_instances().iter().map(state_change).collect())
    }
}

fn summarize(instance: &Instance) -> InstanceSummary {
    let name = instance
        .tags()
        .iter()
        .find(|tag| tag.key() == Some("Name"))
        .and_then(|tag| tag.value())
        .map(str::to_string);

    InstanceSummary {
        name,
        instance_id: instance.instance_id().unwrap_or_default().to_string(),
        state: instance
            .state()
            .and_then(|s| s.name())
            .map(|n| n.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        private_ip: instance.private_ip_address().map(str::to_string),
        public_ip: instance.public_ip_address().map(str::to_string),
        instance_type: instance
            .instance_type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        availability_zone: instance
            .placement()
            .and_then(|p| p.availability_zone())
            .map(str::to_string),
    }
}

fn state_change(change: &InstanceStateChange) -> StateChange {
    let state_name = |state: Option<&aws_sdk_ec2::types::InstanceState>| {
        state
            .and_then(|s| s.name())
            .map(|n| n.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    };

    StateChange {
        instance_id: change.instance_id().unwrap_or_default().to_string(),
        previous_state: state_name(change.previous_state()),
        current_state: state_name(change.current_state()),
    }
}
