//! Output helpers for the `essence` CLI: JSON, aligned tables, field errors.

use std::io::{self, Write};

use essence_core::validation::FieldErrors;
use essence_ui::report::render_field_errors;
use serde::Serialize;

use crate::context::RuntimeContext;

/// Print a value as pretty-printed JSON to stdout.
///
/// Terminates the process with exit code 1 if serialization fails.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(io::stdout().lock(), "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Width of a cell in terminal columns. Constituent names carry accents,
/// so bytes would over-count.
fn cell_width(cell: &str) -> usize {
    cell.chars().count()
}

fn pad(cell: &str, width: usize) -> String {
    let fill = width.saturating_sub(cell_width(cell));
    format!("{}{}", cell, " ".repeat(fill))
}

/// Format a table with headers, a dashed rule and left-aligned columns.
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| cell_width(h)).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell_width(cell));
        }
    }

    let line = |cells: Vec<String>| cells.join("  ").trim_end().to_string();
    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(line(
        headers.iter().zip(&widths).map(|(h, w)| pad(h, *w)).collect(),
    ));
    out.push(line(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in rows {
        out.push(line(
            row.iter()
                .enumerate()
                .map(|(i, cell)| match widths.get(i) {
                    Some(w) => pad(cell, *w),
                    None => cell.clone(),
                })
                .collect(),
        ));
    }
    out.join("\n")
}

/// Print a table to stdout. Nothing is printed for an empty table.
pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }
    let _ = writeln!(io::stdout().lock(), "{}", format_table(headers, rows));
}

/// Report field errors for one step, as JSON or styled lines.
pub fn output_field_errors(ctx: &RuntimeContext, step: &str, errors: &FieldErrors) {
    if ctx.json {
        output_json(&serde_json::json!({ "step": step, "errors": errors }));
    } else {
        eprintln!("{} is incomplete:", step);
        eprint!("{}", render_field_errors(errors));
    }
}

/// Formats an optional number, `-` when absent.
pub fn opt_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
