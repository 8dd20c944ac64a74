//! S3 command implementations

use std::path::Path;

use chrono::{DateTime, Utc};
use nephele_core::{BucketSummary, ListObjectsOptions, ObjectPage, ObjectSummary};
use serde_json::json;
use tabled::{Table, Tabled, settings::Style};
use tracing::info;

use super::utils::{EMPTY_CELL, format_bytes, or_dash, print_structured};
use crate::cli::{OutputFormat, S3Commands};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;

#[derive(Tabled)]
struct BucketRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "CREATED")]
    created: String,
}

#[derive(Tabled)]
struct ObjectRow {
    #[tabled(rename = "KEY")]
    key: String,
    #[tabled(rename = "SIZE")]
    size: String,
    #[tabled(rename = "LAST MODIFIED")]
    last_modified: String,
    #[tabled(rename = "STORAGE CLASS")]
    storage_class: String,
}

fn format_timestamp(timestamp: Option<&DateTime<Utc>>) -> String {
    timestamp.map_or_else(
        || EMPTY_CELL.to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

impl From<&BucketSummary> for BucketRow {
    fn from(bucket: &BucketSummary) -> Self {
        Self {
            name: bucket.name.clone(),
            created: format_timestamp(bucket.creation_date.as_ref()),
        }
    }
}

impl From<&ObjectSummary> for ObjectRow {
    fn from(object: &ObjectSummary) -> Self {
        Self {
            key: object.key.clone(),
            size: format_bytes(object.size),
            last_modified: format_timestamp(object.last_modified.as_ref()),
            storage_class: or_dash(object.storage_class.as_deref()),
        }
    }
}

pub async fn handle_s3_command(
    cmd: &S3Commands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    match cmd {
        S3Commands::List => list_buckets(conn_mgr, profile_name, output_format, query).await,
        S3Commands::Objects {
            bucket,
            prefix,
            max_keys,
            continuation_token,
        } => {
            let options = ListObjectsOptions {
                prefix: prefix.clone(),
                max_keys: *max_keys,
                continuation_token: continuation_token.clone(),
            };
            list_objects(conn_mgr, profile_name, bucket, &options, output_format, query).await
        }
        S3Commands::Download { bucket, key, file } => {
            download(
                conn_mgr,
                profile_name,
                bucket,
                key,
                file.as_deref(),
                output_format,
                query,
            )
            .await
        }
    }
}

async fn list_buckets(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let buckets = conn_mgr.storage(profile_name).await?.list_buckets().await?;
    info!("Listed {} bucket(s)", buckets.len());

    if print_structured(&buckets, output_format, query)? {
        return Ok(());
    }

    if buckets.is_empty() {
        println!("No buckets found");
        return Ok(());
    }

    let rows: Vec<BucketRow> = buckets.iter().map(BucketRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{}", table);
    Ok(())
}

async fn list_objects(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    bucket: &str,
    options: &ListObjectsOptions,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let page = conn_mgr
        .storage(profile_name)
        .await?
        .list_objects(bucket, options)
        .await?;

    if print_structured(&page, output_format, query)? {
        return Ok(());
    }

    if page.objects.is_empty() {
        println!("No objects found");
    } else {
        let rows: Vec<ObjectRow> = page.objects.iter().map(ObjectRow::from).collect();
        let mut table = Table::new(rows);
        table.with(Style::modern());
        println!("{}", table);
    }

    if let Some(hint) = next_page_hint(&page) {
        println!();
        println!("{}", hint);
    }
    Ok(())
}

/// Hint shown under a truncated listing
fn next_page_hint(page: &ObjectPage) -> Option<String> {
    if !page.is_truncated {
        return None;
    }
    page.next_continuation_token.as_ref().map(|token| {
        format!(
            "More objects available. Next page: --continuation-token {}",
            token
        )
    })
}

async fn download(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    bucket: &str,
    key: &str,
    file: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let (path, bytes) = conn_mgr
        .storage(profile_name)
        .await?
        .download(bucket, key, file.map(Path::new))
        .await?;

    let data = json!({
        "bucket": bucket,
        "key": key,
        "path": path.display().to_string(),
        "bytes": bytes,
    });
    if print_structured(&data, output_format, query)? {
        return Ok(());
    }

    println!(
        "Downloaded s3://{}/{} to {} ({} bytes)",
        bucket,
        key,
        path.display(),
        bytes
    );
    Ok(())
}
