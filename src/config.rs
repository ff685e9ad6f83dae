use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulatorError};

/// Seconds slept before each window unless configured otherwise.
pub const DEFAULT_LAPSE_SECS: f64 = 1.0;
/// Records per window unless configured otherwise.
pub const DEFAULT_DATA_WINDOW: usize = 1;
/// Rows returned by [`crate::StreamingSimulator::head`].
pub const DEFAULT_HEAD_LINES: usize = 5;

// ---------------------------------------------------------------------------
// OutputShape – how each record reaches the callback
// ---------------------------------------------------------------------------

/// Representation of every emitted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputShape {
    /// Each record is its values in column order.
    #[default]
    Array,
    /// Each record is a field-name → value mapping.
    ArrayDict,
}

impl OutputShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputShape::Array => "array",
            OutputShape::ArrayDict => "array_dict",
        }
    }
}

impl FromStr for OutputShape {
    type Err = SimulatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "array" => Ok(OutputShape::Array),
            "array_dict" => Ok(OutputShape::ArrayDict),
            other => Err(SimulatorError::InvalidConfiguration(format!(
                "response type '{other}' not supported (expected 'array' or 'array_dict')"
            ))),
        }
    }
}

impl fmt::Display for OutputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SourceFormat – which loader a file goes through
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    /// File extension (without the dot) this format expects.
    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Json => "json",
        }
    }

    /// Pick the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        match path_extension(path).as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "json" => Ok(SourceFormat::Json),
            _ => Err(SimulatorError::FormatMismatch {
                path: path.to_path_buf(),
                expected: "csv or json",
            }),
        }
    }

    /// Fail with `FormatMismatch` unless `path` ends in this format's extension.
    pub fn check_path(&self, path: &Path) -> Result<()> {
        if path_extension(path) == self.extension() {
            Ok(())
        } else {
            Err(SimulatorError::FormatMismatch {
                path: path.to_path_buf(),
                expected: self.extension(),
            })
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

fn path_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// SimulatorConfig – pacing parameters shared by both loaders
// ---------------------------------------------------------------------------

/// Pacing and shaping parameters.
///
/// Deserializes with defaults for every missing field, so it can be embedded
/// in a caller's own configuration file:
///
/// ```json
/// { "lapse": 0.5, "data_window": 10, "response_type": "array_dict" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Seconds slept before every window.
    pub lapse: f64,
    /// Records per window.
    pub data_window: usize,
    pub response_type: OutputShape,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            lapse: DEFAULT_LAPSE_SECS,
            data_window: DEFAULT_DATA_WINDOW,
            response_type: OutputShape::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lapse(mut self, seconds: f64) -> Self {
        self.lapse = seconds;
        self
    }

    pub fn with_data_window(mut self, records: usize) -> Self {
        self.data_window = records;
        self
    }

    pub fn with_response_type(mut self, shape: OutputShape) -> Self {
        self.response_type = shape;
        self
    }

    /// The lapse as a `Duration`; negative, NaN or infinite values are rejected.
    pub fn lapse_duration(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.lapse).map_err(|_| {
            SimulatorError::InvalidConfiguration(format!(
                "lapse must be a finite, non-negative number of seconds (got {})",
                self.lapse
            ))
        })
    }

    pub fn window_size(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.data_window).ok_or_else(|| {
            SimulatorError::InvalidConfiguration("data_window must be at least 1".into())
        })
    }
}

// ---------------------------------------------------------------------------
// Format options
// ---------------------------------------------------------------------------

/// How delimited text is split into fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub sep: char,
    /// Overrides `sep` when set.
    pub delimiter: Option<char>,
    /// Split on runs of whitespace instead of a separator.
    pub delim_whitespace: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            sep: ',',
            delimiter: None,
            delim_whitespace: false,
        }
    }
}

/// Resolved field splitting rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Splitter {
    Byte(u8),
    Whitespace,
}

impl CsvOptions {
    pub fn with_sep(mut self, sep: char) -> Self {
        self.sep = sep;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_delim_whitespace(mut self, on: bool) -> Self {
        self.delim_whitespace = on;
        self
    }

    pub fn splitter(&self) -> Result<Splitter> {
        if self.delim_whitespace {
            if let Some(d) = self.delimiter {
                return Err(SimulatorError::InvalidConfiguration(format!(
                    "delimiter {d:?} cannot be combined with delim_whitespace"
                )));
            }
            return Ok(Splitter::Whitespace);
        }

        let c = self.delimiter.unwrap_or(self.sep);
        match u8::try_from(c) {
            Ok(b) if b.is_ascii() && !matches!(b, b'\n' | b'\r' | b'"') => Ok(Splitter::Byte(b)),
            _ => Err(SimulatorError::InvalidConfiguration(format!(
                "separator {c:?} must be a single ASCII character other than a line break or quote"
            ))),
        }
    }
}

/// How a JSON file is laid out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonOptions {
    /// One JSON object per line instead of a single top-level array.
    pub lines: bool,
}

impl JsonOptions {
    pub fn lines() -> Self {
        Self { lines: true }
    }
}
