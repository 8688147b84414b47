// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text/JSON rendering shared by every subcommand.

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a single value either as a JSON blob or via a caller-supplied
/// text renderer.
pub fn render<T: Serialize>(value: &T, format: OutputFormat, text: impl FnOnce(&T)) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => text(value),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

/// Print a list of rows as a left-aligned, space-padded table, or as JSON.
pub fn render_table<T: Serialize>(
    items: &[T],
    format: OutputFormat,
    headers: &[&str],
    rows: impl Fn(&T) -> Vec<String>,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        OutputFormat::Text => {
            if items.is_empty() {
                println!("(none)");
                return Ok(());
            }
            let rendered: Vec<Vec<String>> = items.iter().map(rows).collect();
            let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
            for row in &rendered {
                for (i, cell) in row.iter().enumerate() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
            print_row(headers.iter().map(|h| h.to_string()).collect::<Vec<_>>().as_slice(), &widths);
            for row in &rendered {
                print_row(row, &widths);
            }
        }
    }
    Ok(())
}

fn print_row(cells: &[String], widths: &[usize]) {
    let line: Vec<String> =
        cells.iter().zip(widths).map(|(cell, width)| format!("{:<width$}", cell, width = width)).collect();
    println!("{}", line.join("  "));
}

/// Format an epoch-millisecond timestamp as relative age (`"5s"`, `"2m"`, `"-"` for 0).
pub fn format_time_ago(epoch_ms: u64) -> String {
    if epoch_ms == 0 {
        return "-".to_string();
    }
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(epoch_ms);
    let elapsed_secs = now_ms.saturating_sub(epoch_ms) / 1000;
    if elapsed_secs < 60 {
        format!("{elapsed_secs}s")
    } else if elapsed_secs < 3600 {
        format!("{}m", elapsed_secs / 60)
    } else if elapsed_secs < 86400 {
        format!("{}h", elapsed_secs / 3600)
    } else {
        format!("{}d", elapsed_secs / 86400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timestamp_renders_as_dash() {
        assert_eq!(format_time_ago(0), "-");
    }

    #[test]
    fn recent_timestamp_renders_in_seconds() {
        let now_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        assert_eq!(format_time_ago(now_ms), "0s");
    }

    #[derive(Serialize)]
    struct Row {
        name: String,
    }

    #[test]
    fn empty_table_prints_none_marker() {
        let rows: Vec<Row> = Vec::new();
        render_table(&rows, OutputFormat::Text, &["NAME"], |r| vec![r.name.clone()]).unwrap();
    }
}
