//! RDS command implementations

use nephele_core::DbInstanceSummary;
use tabled::{Table, Tabled, settings::Style};
use tracing::info;

use super::utils::{EMPTY_CELL, format_state, or_dash, print_structured, wrap_at_separator};
use crate::cli::{OutputFormat, RdsCommands};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;

#[derive(Tabled)]
struct DbInstanceRow {
    #[tabled(rename = "INSTANCE ID")]
    instance_id: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "ENDPOINT")]
    endpoint: String,
    #[tabled(rename = "CLASS")]
    instance_class: String,
    #[tabled(rename = "ENGINE")]
    engine: String,
    #[tabled(rename = "MULTI-AZ")]
    multi_az: String,
}

impl From<&DbInstanceSummary> for DbInstanceRow {
    fn from(db: &DbInstanceSummary) -> Self {
        let endpoint = match (&db.endpoint, db.port) {
            (Some(address), Some(port)) => format!("{}:{}", address, port),
            (Some(address), None) => address.clone(),
            (None, _) => EMPTY_CELL.to_string(),
        };
        Self {
            instance_id: wrap_at_separator(&db.instance_id, '-', 2),
            status: db
                .status
                .as_deref()
                .map_or_else(|| EMPTY_CELL.to_string(), format_state),
            endpoint: wrap_at_separator(&endpoint, '.', 2),
            instance_class: or_dash(db.instance_class.as_deref()),
            engine: db.engine_info(),
            multi_az: if db.multi_az { "yes" } else { "no" }.to_string(),
        }
    }
}

pub async fn handle_rds_command(
    cmd: &RdsCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    match cmd {
        RdsCommands::List => list_instances(conn_mgr, profile_name, output_format, query).await,
    }
}

async fn list_instances(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let instances = conn_mgr.database(profile_name).await?.list_instances().await?;
    info!("Listed {} DB instance(s)", instances.len());

    // structured output keeps identifiers unwrapped
    if print_structured(&instances, output_format, query)? {
        return Ok(());
    }

    if instances.is_empty() {
        println!("No database instances found");
        return Ok(());
    }

    let rows: Vec<DbInstanceRow> = instances.iter().map(DbInstanceRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{}", table);
    Ok(())
}
