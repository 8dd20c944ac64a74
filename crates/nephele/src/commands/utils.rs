//! Shared helpers for command implementations

use colored::Colorize;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::cli::OutputFormat;
use crate::error::{NepheleError, Result as CliResult};
use crate::output::{self, print_output};

/// Placeholder for absent values in tables
pub const EMPTY_CELL: &str = "-";

/// Print `data` as JSON/YAML, or as a generic table when a query is given
///
/// Returns `false` when the caller should render its own human output.
pub fn print_structured<T: Serialize>(
    data: T,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<bool> {
    let format = match (output_format.structured(), query) {
        (Some(format), _) => format,
        (None, Some(_)) => output::OutputFormat::Table,
        (None, None) => return Ok(false),
    };

    print_output(data, format, query).map_err(|e| NepheleError::OutputError {
        message: format!("{:#}", e),
    })?;
    Ok(true)
}

/// Truncate string to max length with ellipsis (Unicode-safe)
pub fn truncate_string(s: &str, max_len: usize) -> String {
    let graphemes: Vec<&str> = s.graphemes(true).collect();

    if graphemes.len() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let truncated: String = graphemes[..max_len - 3].join("");
        format!("{}...", truncated)
    } else {
        graphemes[..max_len].join("")
    }
}

/// Insert a line break after every `every`-th occurrence of `sep`
///
/// `db-prod-eu-west-1` wrapped at every second `-` becomes
/// `db-prod-\neu-west-\n1`.
pub fn wrap_at_separator(s: &str, sep: char, every: usize) -> String {
    if every == 0 {
        return s.to_string();
    }

    let mut wrapped = String::with_capacity(s.len() + s.len() / every);
    let mut seen = 0;
    for c in s.chars() {
        wrapped.push(c);
        if c == sep {
            seen += 1;
            if seen % every == 0 {
                wrapped.push('\n');
            }
        }
    }
    wrapped.trim_end_matches('\n').to_string()
}

/// Format an instance or database state with color
pub fn format_state(state: &str) -> String {
    match state.to_lowercase().as_str() {
        "running" | "available" => state.green().to_string(),
        "pending" | "starting" | "stopping" | "rebooting" | "modifying" | "backing-up"
        | "creating" | "shutting-down" => state.yellow().to_string(),
        "stopped" | "terminated" | "failed" | "deleting" | "inaccessible-encryption-credentials" => {
            state.red().to_string()
        }
        _ => state.to_string(),
    }
}

/// Render an optional value for a table cell
pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or(EMPTY_CELL).to_string()
}

/// Width of the attached terminal, if any
pub fn terminal_width() -> Option<usize> {
    terminal_size::terminal_size().map(|(terminal_size::Width(w), _)| w as usize)
}

/// Human-readable byte size
pub fn format_bytes(bytes: i64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string_ascii() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_string_unicode() {
        assert_eq!(truncate_string("日本語のテキスト", 5), "日本...");
        assert_eq!(truncate_string("café", 4), "café");
    }

    #[test]
    fn test_truncate_string_edge_cases() {
        assert_eq!(truncate_string("", 5), "");
        assert_eq!(truncate_string("abcdef", 3), "abc");
        assert_eq!(truncate_string("abcdef", 0), "");
    }

    #[test]
    fn test_wrap_identifier() {
        assert_eq!(
            wrap_at_separator("db-prod-eu-west-1", '-', 2),
            "db-prod-\neu-west-\n1"
        );
        assert_eq!(wrap_at_separator("short", '-', 2), "short");
        assert_eq!(wrap_at_separator("a-b", '-', 2), "a-b");
    }

    #[test]
    fn test_wrap_endpoint() {
        assert_eq!(
            wrap_at_separator("db.abc123.eu-west-1.rds.amazonaws.com", '.', 2),
            "db.abc123.\neu-west-1.rds.\namazonaws.com"
        );
    }

    #[test]
    fn test_wrap_trailing_separator() {
        assert_eq!(wrap_at_separator("a-b-", '-', 2), "a-b-");
        assert_eq!(wrap_at_separator("a-b", '-', 0), "a-b");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(Some("10.0.0.1")), "10.0.0.1");
        assert_eq!(or_dash(None), "-");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn test_format_state_plain_when_unknown() {
        assert_eq!(format_state("mystery"), "mystery");
    }
}
