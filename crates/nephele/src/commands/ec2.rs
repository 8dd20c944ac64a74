//! EC2 command implementations

use std::path::Path;

use nephele_core::{CoreError, FilterSet, InstanceSummary, StateChange};
use serde_json::json;
use tabled::{Table, Tabled, settings::Style};
use tracing::{debug, info};

use super::utils::{format_state, or_dash, print_structured};
use crate::cli::{Ec2Commands, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;

#[derive(Tabled)]
struct InstanceRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "INSTANCE ID")]
    instance_id: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "PRIVATE IP")]
    private_ip: String,
    #[tabled(rename = "PUBLIC IP")]
    public_ip: String,
    #[tabled(rename = "TYPE")]
    instance_type: String,
}

impl From<&InstanceSummary> for InstanceRow {
    fn from(instance: &InstanceSummary) -> Self {
        Self {
            name: or_dash(instance.name.as_deref()),
            instance_id: instance.instance_id.clone(),
            state: format_state(&instance.state),
            private_ip: or_dash(instance.private_ip.as_deref()),
            public_ip: or_dash(instance.public_ip.as_deref()),
            instance_type: instance.instance_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum StateAction {
    Start,
    Stop,
}

pub async fn handle_ec2_command(
    cmd: &Ec2Commands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    match cmd {
        Ec2Commands::List {
            filters,
            filter_file,
        } => {
            list_instances(
                conn_mgr,
                profile_name,
                filters,
                filter_file.as_deref(),
                output_format,
                query,
            )
            .await
        }
        Ec2Commands::Start { ids, dry_run } => {
            change_state(
                conn_mgr,
                profile_name,
                ids,
                *dry_run,
                StateAction::Start,
                output_format,
                query,
            )
            .await
        }
        Ec2Commands::Stop { ids, dry_run } => {
            change_state(
                conn_mgr,
                profile_name,
                ids,
                *dry_run,
                StateAction::Stop,
                output_format,
                query,
            )
            .await
        }
    }
}

/// Combine `--filter` arguments with the optional filter file
fn build_filters(filters: &[String], filter_file: Option<&str>) -> CliResult<FilterSet> {
    let mut set = FilterSet::from_args(filters).map_err(CoreError::from)?;
    if let Some(path) = filter_file {
        let from_file = FilterSet::from_json_file(Path::new(path)).map_err(CoreError::from)?;
        debug!("Loaded {} filter(s) from {}", from_file.len(), path);
        set.extend(from_file);
    }
    Ok(set)
}

async fn list_instances(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    filters: &[String],
    filter_file: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    // Bad filters fail before any client is built
    let filters = build_filters(filters, filter_file)?;

    let compute = conn_mgr.compute(profile_name).await?;
    let instances = compute.list_instances(&filters).await?;
    info!("Listed {} instance(s)", instances.len());

    if print_structured(&instances, output_format, query)? {
        return Ok(());
    }

    if instances.is_empty() {
        println!("No instances found");
        return Ok(());
    }

    let rows: Vec<InstanceRow> = instances.iter().map(InstanceRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{}", table);
    Ok(())
}

async fn change_state(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    ids: &[String],
    dry_run: bool,
    action: StateAction,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let compute = conn_mgr.compute(profile_name).await?;
    let result = match action {
        StateAction::Start => compute.start_instances(ids, dry_run).await,
        StateAction::Stop => compute.stop_instances(ids, dry_run).await,
    };

    let changes = match result {
        Ok(changes) => changes,
        Err(CoreError::DryRun(message)) => {
            info!("Dry run for {:?} succeeded", action);
            let data = json!({
                "dry_run": true,
                "instance_ids": ids,
                "message": message,
            });
            if !print_structured(&data, output_format, query)? {
                println!("Dry run succeeded: {}", message);
            }
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if print_structured(&changes, output_format, query)? {
        return Ok(());
    }

    print_state_changes(&changes);
    Ok(())
}

fn print_state_changes(changes: &[StateChange]) {
    for change in changes {
        println!(
            "Previous State({}) : {}",
            change.instance_id,
            format_state(&change.previous_state)
        );
        println!(
            "Current State({})  : {}",
            change.instance_id,
            format_state(&change.current_state)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_instance_row_fills_missing_values() {
        let instance = InstanceSummary {
            name: None,
            instance_id: "i-0aaa".to_string(),
            state: "stopped".to_string(),
            private_ip: Some("10.0.0.5".to_string()),
            public_ip: None,
            instance_type: "t3.micro".to_string(),
            availability_zone: None,
        };
        let row = InstanceRow::from(&instance);
        assert_eq!(row.name, "-");
        assert_eq!(row.public_ip, "-");
        assert_eq!(row.private_ip, "10.0.0.5");
    }

    #[test]
    fn test_build_filters_from_args_and_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"[{{"Name": "type", "Values": ["t3.micro"]}}]"#).unwrap();

        let args = vec!["state=running".to_string()];
        let set = build_filters(&args, Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_build_filters_rejects_unknown_key() {
        let args = vec!["color=red".to_string()];
        let err = build_filters(&args, None).unwrap_err();
        assert!(err.to_string().contains("invalid filter key"), "{err}");
    }
}
