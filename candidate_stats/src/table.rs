// ********* Table data structures ***********

use log::debug;

use std::collections::HashSet;
use std::error::Error;
use std::fmt::Display;

/// The content of one cell, with the type inferred at load time.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Infers the type of a raw text field (CSV and similar sources).
    ///
    /// Surrounding whitespace is ignored for the numeric forms only: text cells are kept as-is.
    pub fn infer(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Cell::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return Cell::Float(f);
            }
        }
        match trimmed {
            "true" | "TRUE" | "True" => Cell::Bool(true),
            "false" | "FALSE" | "False" => Cell::Bool(false),
            _ => Cell::Text(raw.to_string()),
        }
    }

    /// The categorical key of this cell, used by the filters and the group-bys.
    /// Empty cells map to the empty string.
    pub fn as_key(&self) -> String {
        match self {
            Cell::Empty => "".to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }

    /// The numeric value of this cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) if f.is_finite() => Some(*f),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// Errors raised when a table is built or a column is looked up.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TableError {
    MissingColumn { column: String },
    DuplicateColumn { column: String },
}

impl Error for TableError {}

impl Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::MissingColumn { column } => write!(f, "Missing column {:?}", column),
            TableError::DuplicateColumn { column } => {
                write!(f, "Column {:?} appears more than once", column)
            }
        }
    }
}

/// Trims the leading and trailing whitespaces of all the column names.
pub fn normalize_column_names(columns: &[String]) -> Vec<String> {
    columns.iter().map(|c| c.trim().to_string()).collect()
}

/// An immutable, row-oriented table.
///
/// Invariants:
/// - the column names are unique
/// - all the rows have exactly one cell per column
#[derive(PartialEq, Debug, Clone)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Builds a table. Short rows are padded with empty cells, extra cells are dropped.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Table, TableError> {
        let mut seen: HashSet<&String> = HashSet::new();
        for c in columns.iter() {
            if !seen.insert(c) {
                return Err(TableError::DuplicateColumn { column: c.clone() });
            }
        }
        let width = columns.len();
        let rows: Vec<Vec<Cell>> = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        debug!(
            "Table::new: {} columns, {} rows: {:?}",
            width,
            rows.len(),
            columns
        );
        Ok(Table { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, idx: usize) -> &[Cell] {
        &self.rows[idx]
    }

    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TableError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// The distinct keys of a column, in order of first appearance.
    pub fn distinct_values(&self, name: &str) -> Result<Vec<String>, TableError> {
        let col = self.column_index(name)?;
        let mut seen: HashSet<String> = HashSet::new();
        let mut res: Vec<String> = Vec::new();
        for row in self.rows.iter() {
            let k = row[col].as_key();
            if seen.insert(k.clone()) {
                res.push(k);
            }
        }
        Ok(res)
    }
}
