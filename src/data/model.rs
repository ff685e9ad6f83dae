use std::collections::HashSet;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::config::OutputShape;

// ---------------------------------------------------------------------------
// Value – a single cell / JSON value
// ---------------------------------------------------------------------------

/// A dynamically-typed value read from a CSV cell or a JSON document.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Object(Fields),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::List(items) => write_list(f, items),
            Value::Object(fields) => write!(f, "{fields}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    write!(f, "[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "]")
}

// ---------------------------------------------------------------------------
// Fields – ordered name → value mapping
// ---------------------------------------------------------------------------

/// Field-name → value pairs in the order they appear in the source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Vec<(String, Value)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, replacing the value if the name is already present.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        write!(f, "}}")
    }
}

// ---------------------------------------------------------------------------
// Record – one row as handed to the callback
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Record {
    /// Values in column order.
    Positional(Vec<Value>),
    /// Field-name → value mapping.
    Named(Fields),
}

impl Record {
    pub fn as_positional(&self) -> Option<&[Value]> {
        match self {
            Record::Positional(values) => Some(values),
            Record::Named(_) => None,
        }
    }

    pub fn as_named(&self) -> Option<&Fields> {
        match self {
            Record::Named(fields) => Some(fields),
            Record::Positional(_) => None,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Positional(values) => write_list(f, values),
            Record::Named(fields) => write!(f, "{fields}"),
        }
    }
}

/// Render a whole window on one line, e.g. `[[1, 2], [3, 4]]`.
pub fn format_window(records: &[Record]) -> String {
    struct Window<'a>(&'a [Record]);

    impl fmt::Display for Window<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write_list(f, self.0)
        }
    }

    Window(records).to_string()
}

// ---------------------------------------------------------------------------
// Row – one record as stored in the dataset
// ---------------------------------------------------------------------------

/// A loaded record before it is shaped for the callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// A CSV row or a JSON object.
    Fields(Fields),
    /// A JSON array, or a JSON scalar as a one-element row.
    Values(Vec<Value>),
}

impl Row {
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Row::Fields(fields) => fields.get(name),
            Row::Values(_) => None,
        }
    }
}

impl From<Fields> for Row {
    fn from(fields: Fields) -> Self {
        Row::Fields(fields)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded file
// ---------------------------------------------------------------------------

/// The fully materialized file: every row in file order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<Row>,
    /// Union of field names, in first-seen order.
    columns: Vec<String>,
}

impl Dataset {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let columns = {
            let mut seen: HashSet<&str> = HashSet::new();
            let mut columns = Vec::new();
            for row in &rows {
                let Row::Fields(fields) = row else { continue };
                for name in fields.names() {
                    if seen.insert(name) {
                        columns.push(name.to_string());
                    }
                }
            }
            columns
        };
        Dataset { rows, columns }
    }

    pub fn from_records(records: Vec<Fields>) -> Self {
        Self::from_rows(records.into_iter().map(Row::Fields).collect())
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Shape a row the way the callback asked for it.
    ///
    /// Positional named rows follow [`columns`](Self::columns), with null for
    /// fields the row lacks. Value rows are named by position: `"0"`, `"1"`, ...
    pub fn shape(&self, row: &Row, shape: OutputShape) -> Record {
        match (row, shape) {
            (Row::Fields(fields), OutputShape::Array) => Record::Positional(
                self.columns
                    .iter()
                    .map(|c| fields.get(c).cloned().unwrap_or(Value::Null))
                    .collect(),
            ),
            (Row::Fields(fields), OutputShape::ArrayDict) => Record::Named(fields.clone()),
            (Row::Values(values), OutputShape::Array) => Record::Positional(values.clone()),
            (Row::Values(values), OutputShape::ArrayDict) => Record::Named(
                values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v.clone()))
                    .collect(),
            ),
        }
    }

    /// The record at `index`, shaped; `None` past the end.
    pub fn record(&self, index: usize, shape: OutputShape) -> Option<Record> {
        self.rows.get(index).map(|row| self.shape(row, shape))
    }
}
