use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::error::ParseError;

/// Cell text that counts as a missing value.
const MISSING_MARKERS: &[&str] = &["NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "<NA>"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// String form used for filtering and categorical axes. `None` for missing cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) => Some(format!("{:?}", f)),
            Cell::Text(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(s) => f.write_str(&s),
            None => f.write_str("NaN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub cells: Vec<Cell>,
}

impl Column {
    /// Classify raw cell text: numeric only if every non-missing cell parses as i64 or f64.
    fn from_raw(name: String, raw: Vec<String>) -> Self {
        let values: Vec<Option<String>> = raw
            .into_iter()
            .map(|s| {
                let t = s.trim();
                if t.is_empty() || MISSING_MARKERS.contains(&t) { None } else { Some(t.to_string()) }
            })
            .collect();

        let mut present = values.iter().flatten().peekable();
        let all_numeric = present.peek().is_some()
            && present.all(|s| s.parse::<i64>().is_ok() || s.parse::<f64>().is_ok());

        if all_numeric {
            let cells = values
                .into_iter()
                .map(|v| match v {
                    None => Cell::Missing,
                    Some(s) => match s.parse::<i64>() {
                        Ok(i) => Cell::Int(i),
                        Err(_) => s.parse::<f64>().map(Cell::Float).unwrap_or(Cell::Missing),
                    },
                })
                .collect();
            Column { name, kind: ColumnKind::Numeric, cells }
        } else {
            let cells = values
                .into_iter()
                .map(|v| v.map(Cell::Text).unwrap_or(Cell::Missing))
                .collect();
            Column { name, kind: ColumnKind::Text, cells }
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Numeric
    }

    /// Numeric values with missing cells skipped.
    pub fn numbers(&self) -> Vec<f64> {
        self.cells.iter().filter_map(Cell::as_f64).collect()
    }
}

/// An immutable, column-oriented table. Filtering produces new datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Build a dataset from a header and string rows, classifying every column.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, ParseError> {
        if headers.is_empty() {
            return Err(ParseError::NoColumns);
        }
        if rows.is_empty() {
            return Err(ParseError::NoRows);
        }
        for (i, h) in headers.iter().enumerate() {
            if headers[..i].contains(h) {
                return Err(ParseError::DuplicateColumn(h.clone()));
            }
        }

        let mut raw_columns: Vec<Vec<String>> = vec![Vec::with_capacity(rows.len()); headers.len()];
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != headers.len() {
                return Err(ParseError::RaggedRow {
                    row: row_idx + 1,
                    expected: headers.len(),
                    found: row.len(),
                });
            }
            for (idx, value) in row.into_iter().enumerate() {
                raw_columns[idx].push(value);
            }
        }

        let row_count = raw_columns[0].len();
        let columns = headers
            .into_iter()
            .zip(raw_columns)
            .map(|(name, raw)| Column::from_raw(name, raw))
            .collect();

        Ok(Self { columns, rows: row_count })
    }

    /// Parse delimited text with a header row.
    pub fn load(raw: &[u8]) -> Result<Self, ParseError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(raw);

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
            return Err(ParseError::NoColumns);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        }

        let dataset = Self::from_rows(headers, rows)?;
        info!(
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            numeric = dataset.numeric_columns().len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    pub fn load_path<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let bytes = std::fs::read(path.as_ref())?;
        debug!(path = %path.as_ref().display(), bytes = bytes.len(), "reading dataset");
        Self::load(&bytes)
    }

    /// Create a dataset from a JSON array of flat objects
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        let array = value
            .as_array()
            .ok_or_else(|| ParseError::Json("input data must be a JSON array of objects".into()))?;

        let first_obj = match array.first() {
            Some(first) => first
                .as_object()
                .ok_or_else(|| ParseError::Json("items in array must be objects".into()))?,
            None => return Err(ParseError::NoRows),
        };

        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let mut rows = Vec::with_capacity(array.len());
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| ParseError::Json("items in array must be objects".into()))?;

            let mut row = Vec::with_capacity(headers.len());
            for header in &headers {
                let val_str = match obj.get(header) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    Some(Value::Bool(b)) => b.to_string(),
                    Some(Value::Null) | None => String::new(),
                    _ => {
                        return Err(ParseError::Json(format!(
                            "unsupported value type for field '{}'",
                            header
                        )))
                    }
                };
                row.push(val_str);
            }
            rows.push(row);
        }

        Self::from_rows(headers, rows)
    }

    /// Keep the rows whose index satisfies `keep`. Column kinds carry over unchanged.
    pub(crate) fn select_rows<F: Fn(usize) -> bool>(&self, keep: F) -> Self {
        let indices: Vec<usize> = (0..self.rows).filter(|&i| keep(i)).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                kind: c.kind,
                cells: indices.iter().map(|&i| c.cells[i].clone()).collect(),
            })
            .collect();
        Self { columns, rows: indices.len() }
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric())
            .map(|c| c.name.clone())
            .collect()
    }

    /// First `n` rows as display strings, header first.
    pub fn head(&self, n: usize) -> Vec<Vec<String>> {
        let mut table = vec![self.column_names()];
        for i in 0..n.min(self.rows) {
            table.push(self.columns.iter().map(|c| c.cells[i].to_string()).collect());
        }
        table
    }

    /// Render `head(n)` as an aligned text table.
    pub fn preview(&self, n: usize) -> String {
        let table = self.head(n);
        let widths: Vec<usize> = (0..self.columns.len())
            .map(|c| table.iter().map(|r| r[c].chars().count()).max().unwrap_or(0))
            .collect();

        let mut out = String::new();
        for row in &table {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
                .collect();
            out.push_str(line.join("  ").trim_end());
            out.push('\n');
        }
        out
    }
}
