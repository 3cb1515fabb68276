use std::fmt::Write as _;

use foodshare_warehouse::display_value;
use serde_json::{Map, Value};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::metadata::Envelope;

pub fn render(envelope: &Envelope, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => print!("{}", render_table(envelope)?),
    }

    Ok(())
}

/// Metadata lines followed by one grid per result set in the payload.
///
/// Payloads without a `{columns, rows}` object fall back to indented JSON.
fn render_table(envelope: &Envelope) -> Result<String, CliError> {
    let mut out = String::new();
    let _ = writeln!(out, "request_id  : {}", envelope.meta.request_id);
    let _ = writeln!(out, "generated_at: {}", envelope.meta.generated_at);
    let _ = writeln!(out, "latency_ms  : {}", envelope.meta.latency_ms);
    let _ = writeln!(out, "cache_hit   : {}", envelope.meta.cache_hit);

    if !envelope.meta.warnings.is_empty() {
        let _ = writeln!(out, "warnings:");
        for warning in &envelope.meta.warnings {
            let _ = writeln!(out, "  - {warning}");
        }
    }

    let mut grids = Vec::new();
    collect_grids(&envelope.data, "", &mut grids);

    if grids.is_empty() {
        let _ = writeln!(out, "data:");
        for line in serde_json::to_string_pretty(&envelope.data)?.lines() {
            let _ = writeln!(out, "  {line}");
        }
        return Ok(out);
    }

    for (label, grid) in grids {
        let _ = writeln!(out);
        if !label.is_empty() {
            let _ = writeln!(out, "{label}");
        }
        out.push_str(&grid);
    }

    Ok(out)
}

fn collect_grids(value: &Value, label: &str, grids: &mut Vec<(String, String)>) {
    match value {
        Value::Object(object) => {
            let title = object.get("title").and_then(Value::as_str);
            if let Some(grid) = grid_from_object(object) {
                grids.push((title.unwrap_or(label).to_owned(), grid));
                return;
            }
            for (key, child) in object {
                let child_label = match title {
                    Some(title) => title.to_owned(),
                    None if label.is_empty() => key.clone(),
                    None => format!("{label}.{key}"),
                };
                collect_grids(child, &child_label, grids);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                collect_grids(item, &format!("{label}[{index}]"), grids);
            }
        }
        _ => {}
    }
}

fn grid_from_object(object: &Map<String, Value>) -> Option<String> {
    let columns = object.get("columns")?.as_array()?;
    let rows = object.get("rows")?.as_array()?;

    let headers = columns
        .iter()
        .map(|column| match column {
            Value::Object(meta) => meta
                .get("name")
                .map(display_value)
                .unwrap_or_default(),
            other => display_value(other),
        })
        .collect::<Vec<_>>();

    let cells = rows
        .iter()
        .map(|row| {
            row.as_array()
                .map(|values| values.iter().map(display_value).collect())
                .unwrap_or_default()
        })
        .collect::<Vec<Vec<String>>>();

    Some(format_grid(&headers, &cells))
}

/// Draw an ASCII grid; short rows are padded with blanks.
fn format_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|header| header.chars().count())
        .collect::<Vec<_>>();
    for row in rows {
        for (index, cell) in row.iter().enumerate().take(widths.len()) {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    let rule = widths.iter().fold(String::from("+"), |mut line, width| {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
        line
    });

    let line_for = |cells: &[String]| {
        let mut line = String::from("|");
        for (index, width) in widths.iter().enumerate() {
            let cell = cells.get(index).map_or("", String::as_str);
            let padding = width - cell.chars().count();
            let _ = write!(line, " {cell}{} |", " ".repeat(padding));
        }
        line
    };

    let mut out = String::new();
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "{}", line_for(headers));
    let _ = writeln!(out, "{rule}");
    if rows.is_empty() {
        let _ = writeln!(out, "(no rows)");
    } else {
        for row in rows {
            let _ = writeln!(out, "{}", line_for(row.as_slice()));
        }
        let _ = writeln!(out, "{rule}");
    }
    out
}
