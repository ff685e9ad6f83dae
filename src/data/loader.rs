use std::collections::HashMap;
use std::path::Path;

use serde_json::Value as JsonValue;

use super::model::{Dataset, Fields, Row, Value};
use crate::config::{CsvOptions, JsonOptions, Splitter};
use crate::error::{Result, SimulatorError};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a delimited text file. The first row names the columns.
pub fn load_csv(path: &Path, options: &CsvOptions) -> Result<Dataset> {
    let splitter = options.splitter()?;
    let bytes = read_file(path)?;

    let rows = match splitter {
        Splitter::Byte(delimiter) => parse_delimited(&bytes, delimiter),
        Splitter::Whitespace => std::str::from_utf8(&bytes)
            .map_err(|e| format!("not valid UTF-8: {e}"))
            .and_then(parse_whitespace),
    };
    finish(path, rows)
}

/// Load a JSON file holding either one value per line or a top-level array.
pub fn load_json(path: &Path, options: &JsonOptions) -> Result<Dataset> {
    let bytes = read_file(path)?;

    let rows = std::str::from_utf8(&bytes)
        .map_err(|e| format!("not valid UTF-8: {e}"))
        .and_then(|text| {
            if options.lines {
                parse_json_lines(text)
            } else {
                parse_json_array(text)
            }
        });
    finish(path, rows)
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| {
        log::warn!("Failed to read {}: {source}", path.display());
        SimulatorError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn finish(path: &Path, rows: std::result::Result<Vec<Row>, String>) -> Result<Dataset> {
    match rows {
        Ok(rows) => {
            let dataset = Dataset::from_rows(rows);
            log::info!(
                "Loaded {} rows ({} columns) from {}",
                dataset.len(),
                dataset.columns().len(),
                path.display()
            );
            Ok(dataset)
        }
        Err(reason) => {
            log::warn!("Failed to parse {}: {reason}", path.display());
            Err(SimulatorError::MalformedInput {
                path: path.to_path_buf(),
                reason,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

fn parse_delimited(bytes: &[u8], delimiter: u8) -> std::result::Result<Vec<Row>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| format!("reading header row: {e}"))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        return Err("no header row".into());
    }
    let headers = dedupe_headers(headers);

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| format!("row {}: {e}", row_no + 1))?;
        rows.push(Row::Fields(zip_row(&headers, record.iter(), row_no + 1)?));
    }
    Ok(rows)
}

fn parse_whitespace(text: &str) -> std::result::Result<Vec<Row>, String> {
    parse_delimited(collapse_whitespace(text).as_bytes(), b' ')
}

/// Collapse runs of whitespace outside double quotes into a single space.
/// Lines are trimmed and blank lines dropped.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let mut in_quotes = false;
        let mut gap = false;
        for c in line.chars() {
            if !in_quotes && c.is_whitespace() {
                gap = true;
                continue;
            }
            if gap {
                out.push(' ');
                gap = false;
            }
            if c == '"' {
                in_quotes = !in_quotes;
            }
            out.push(c);
        }
        out.push('\n');
    }
    out
}

/// Pair cells with column names. Short rows are padded with nulls.
fn zip_row<'a>(
    headers: &[String],
    cells: impl Iterator<Item = &'a str>,
    row_no: usize,
) -> std::result::Result<Fields, String> {
    let cells: Vec<&str> = cells.collect();
    if cells.len() > headers.len() {
        return Err(format!(
            "row {row_no} has {} fields but the header has {}",
            cells.len(),
            headers.len()
        ));
    }

    let mut fields = Fields::new();
    for (i, name) in headers.iter().enumerate() {
        let value = cells.get(i).map_or(Value::Null, |c| guess_value_type(c));
        fields.insert(name.as_str(), value);
    }
    Ok(fields)
}

/// Repeated column names become `name`, `name.1`, `name.2`, ...
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(headers.len());
    for h in headers {
        let mut name = h.clone();
        while out.contains(&name) {
            let n = counts.entry(h.clone()).or_insert(0);
            *n += 1;
            name = format!("{h}.{n}");
        }
        out.push(name);
    }
    out
}

fn guess_value_type(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    match s {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::String(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

fn parse_json_lines(text: &str) -> std::result::Result<Vec<Row>, String> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<JsonValue>(line)
                .map(json_row)
                .map_err(|e| format!("line {}: {e}", i + 1))
        })
        .collect()
}

fn parse_json_array(text: &str) -> std::result::Result<Vec<Row>, String> {
    let root: JsonValue = serde_json::from_str(text).map_err(|e| format!("parsing JSON: {e}"))?;
    let JsonValue::Array(items) = root else {
        return Err("expected a top-level JSON array (set `lines` for one value per line)".into());
    };
    Ok(items.into_iter().map(json_row).collect())
}

/// Objects become named rows, arrays positional rows, scalars one-value rows.
fn json_row(value: JsonValue) -> Row {
    match value {
        JsonValue::Object(map) => Row::Fields(
            map.into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect(),
        ),
        JsonValue::Array(items) => Row::Values(items.into_iter().map(json_to_value).collect()),
        scalar => Row::Values(vec![json_to_value(scalar)]),
    }
}

fn json_to_value(val: JsonValue) -> Value {
    match val {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::String(s) => Value::String(s),
        JsonValue::Array(items) => Value::List(items.into_iter().map(json_to_value).collect()),
        JsonValue::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect(),
        ),
    }
}
