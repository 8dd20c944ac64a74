use anyhow::{Context, Result};
use comfy_table::Table;
use jmespath::{Expression, JmespathError};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

/// Normalize backtick literals in JMESPath expressions.
///
/// JMESPath allows "elided quotes" in backtick literals, so `` `foo` `` means
/// `` `"foo"` ``. The jmespath crate requires valid JSON inside backticks,
/// so unquoted strings get their quotes added back.
///
/// Examples:
/// - `` `running` `` -> `` `"running"` ``
/// - `` `true` `` -> `` `true` `` (unchanged, valid JSON boolean)
/// - `` `123` `` -> `` `123` `` (unchanged, valid JSON number)
/// - `` `"already quoted"` `` -> `` `"already quoted"` `` (unchanged)
fn normalize_backtick_literals(query: &str) -> String {
    static BACKTICK_RE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = BACKTICK_RE.get_or_init(|| Regex::new(r"`([^`\\]*(?:\\.[^`\\]*)*)`").ok());

    let Some(re) = re else {
        return query.to_string();
    };

    re.replace_all(query, |caps: &regex::Captures| {
        let content = &caps[1];
        let trimmed = content.trim();

        if serde_json::from_str::<Value>(trimmed).is_ok() {
            format!("`{}`", content)
        } else {
            let escaped = trimmed.replace('\\', "\\\\").replace('"', "\\\"");
            format!("`\"{}\"`", escaped)
        }
    })
    .into_owned()
}

/// Compile a JMESPath expression after normalizing backtick literals
pub fn compile_jmespath(query: &str) -> std::result::Result<Expression<'static>, JmespathError> {
    let normalized = normalize_backtick_literals(query);
    jmespath::compile(&normalized)
}

/// Run a JMESPath query against a JSON value
pub fn apply_query(value: Value, query: &str) -> Result<Value> {
    let expr = compile_jmespath(query)
        .with_context(|| format!("Invalid JMESPath expression: {}", query))?;
    let result = expr.search(value).context("JMESPath query failed")?;
    serde_json::to_value(&*result).context("Failed to convert query result")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

pub fn print_output<T: Serialize>(
    data: T,
    format: OutputFormat,
    query: Option<&str>,
) -> Result<()> {
    print!("{}", format_output(data, format, query)?);
    Ok(())
}

/// Render `data` in `format` after applying `query`, newline-terminated
pub fn format_output<T: Serialize>(
    data: T,
    format: OutputFormat,
    query: Option<&str>,
) -> Result<String> {
    let mut json_value = serde_json::to_value(data)?;

    if let Some(query_str) = query {
        json_value = apply_query(json_value, query_str)?;
    }

    let rendered = match format {
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(&json_value)?),
        OutputFormat::Yaml => serde_yaml::to_string(&json_value)?,
        OutputFormat::Table => format!("{}\n", render_table(&json_value)),
    };
    Ok(rendered)
}

/// Render an arbitrary JSON value as a generic table
fn render_table(value: &Value) -> String {
    match value {
        Value::Array(arr) if !arr.is_empty() => {
            let mut table = Table::new();

            if let Value::Object(first) = &arr[0] {
                let headers: Vec<String> = first.keys().cloned().collect();
                table.set_header(&headers);

                for item in arr {
                    if let Value::Object(obj) = item {
                        let row: Vec<String> = headers
                            .iter()
                            .map(|h| format_value(obj.get(h).unwrap_or(&Value::Null)))
                            .collect();
                        table.add_row(row);
                    }
                }
            } else {
                table.set_header(vec!["Value"]);
                for item in arr {
                    table.add_row(vec![format_value(item)]);
                }
            }

            table.to_string()
        }
        Value::Object(obj) => {
            let mut table = Table::new();
            table.set_header(vec!["Key", "Value"]);

            for (key, val) in obj {
                table.add_row(vec![key.clone(), format_value(val)]);
            }

            table.to_string()
        }
        _ => format_value(value),
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
