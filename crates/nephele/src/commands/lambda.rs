//! Lambda command implementations

use colored::Colorize;
use nephele_core::{FunctionSummary, InvocationResult};
use tabled::{Table, Tabled, settings::Style};
use tracing::{info, warn};

use super::utils::{EMPTY_CELL, or_dash, print_structured, terminal_width, truncate_string};
use crate::cli::{LambdaCommands, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;

/// Width used for free-text columns when there is no terminal
const DEFAULT_TEXT_WIDTH: usize = 40;

/// Space taken by the fixed-width columns and borders
const FIXED_COLUMNS_WIDTH: usize = 90;

#[derive(Tabled)]
struct FunctionRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
    #[tabled(rename = "RUNTIME")]
    runtime: String,
    #[tabled(rename = "MEMORY (MB)")]
    memory: String,
    #[tabled(rename = "TIMEOUT (S)")]
    timeout: String,
    #[tabled(rename = "HANDLER")]
    handler: String,
    #[tabled(rename = "ROLE")]
    role: String,
    #[tabled(rename = "VERSION")]
    version: String,
}

impl FunctionRow {
    fn new(function: &FunctionSummary, text_width: usize) -> Self {
        let number = |n: Option<i32>| n.map_or_else(|| EMPTY_CELL.to_string(), |n| n.to_string());
        Self {
            name: function.name.clone(),
            description: truncate_string(
                function.description.as_deref().unwrap_or(EMPTY_CELL),
                text_width,
            ),
            runtime: or_dash(function.runtime.as_deref()),
            memory: number(function.memory_size),
            timeout: number(function.timeout),
            handler: or_dash(function.handler.as_deref()),
            role: truncate_string(function.role.as_deref().unwrap_or(EMPTY_CELL), text_width),
            version: or_dash(function.version.as_deref()),
        }
    }
}

/// Width for description and role so the table fits the terminal
fn text_column_width(terminal_width: Option<usize>) -> usize {
    match terminal_width {
        Some(width) => (width.saturating_sub(FIXED_COLUMNS_WIDTH) / 2).clamp(16, 80),
        None => DEFAULT_TEXT_WIDTH,
    }
}

pub async fn handle_lambda_command(
    cmd: &LambdaCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    match cmd {
        LambdaCommands::List => list_functions(conn_mgr, profile_name, output_format, query).await,
        LambdaCommands::Invoke { name } => {
            invoke_function(conn_mgr, profile_name, name, output_format, query).await
        }
    }
}

async fn list_functions(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let functions = conn_mgr.functions(profile_name).await?.list_functions().await?;
    info!("Listed {} function(s)", functions.len());

    if print_structured(&functions, output_format, query)? {
        return Ok(());
    }

    if functions.is_empty() {
        println!("No functions found");
        return Ok(());
    }

    let width = text_column_width(terminal_width());
    let rows: Vec<FunctionRow> = functions
        .iter()
        .map(|f| FunctionRow::new(f, width))
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{}", table);
    Ok(())
}

async fn invoke_function(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    name: &str,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let result = conn_mgr
        .functions(profile_name)
        .await?
        .invoke_function(name)
        .await?;

    if result.is_error() {
        warn!(
            "Function {} returned an error: {:?}",
            result.function_name, result.function_error
        );
    }

    if print_structured(&result, output_format, query)? {
        return Ok(());
    }

    print_invocation(&result);
    Ok(())
}

fn print_invocation(result: &InvocationResult) {
    println!("Function         : {}", result.function_name);
    println!("Status Code      : {}", result.status_code);
    println!(
        "Executed Version : {}",
        or_dash(result.executed_version.as_deref())
    );
    if let Some(error) = &result.function_error {
        println!("Function Error   : {}", error.red());
    }
    println!("Payload:");
    println!("{}", result.payload);
}
