//! Domain models for the conversion pipeline.
//!
//! - [`Cell`] - a single typed value (text, number, date, or empty)
//! - [`Table`] - column labels plus rectangular rows of cells

use chrono::{NaiveDateTime, Timelike};
use serde_json::{Map, Value};

use crate::parser::parse_number;

// =============================================================================
// Cell
// =============================================================================

/// A single spreadsheet value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    /// Missing value; written as a blank cell.
    #[default]
    Empty,
    /// Free text.
    Text(String),
    /// Numeric value.
    Number(f64),
    /// Parsed date (midnight when the source had no time part).
    Date(NaiveDateTime),
}

impl Cell {
    /// `true` for [`Cell::Empty`] and zero-length text.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the cell. Text is parsed with [`parse_number`].
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => parse_number(s),
            _ => None,
        }
    }

    /// Text rendering used for substring lookups and error messages.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Date(d) => format_date(d),
        }
    }

    /// JSON rendering for `--dry-run` output.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Empty => Value::Null,
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Date(d) => Value::String(format_date(d)),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Integral values print without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn format_date(d: &NaiveDateTime) -> String {
    if d.time().num_seconds_from_midnight() == 0 {
        d.format("%Y-%m-%d").to_string()
    } else {
        d.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

// =============================================================================
// Table
// =============================================================================

/// An in-memory table.
///
/// Column labels are optional: a `None` label is a positional-only column
/// (no-header mode) and can only be addressed by index. Every row always
/// holds exactly `width()` cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Option<String>>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table; short rows are padded with [`Cell::Empty`] and long
    /// rows truncated to the column count.
    pub fn new(columns: Vec<Option<String>>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Build a table whose columns are all named.
    pub fn with_header<S: Into<String>>(names: Vec<S>, rows: Vec<Vec<Cell>>) -> Self {
        Self::new(names.into_iter().map(|n| Some(n.into())).collect(), rows)
    }

    pub fn columns(&self) -> &[Option<String>] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Mutable access to cells; the row count and width stay fixed.
    pub fn rows_mut(&mut self) -> &mut [Vec<Cell>] {
        &mut self.rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// `true` if at least one column carries a name.
    pub fn has_names(&self) -> bool {
        self.columns.iter().any(Option::is_some)
    }

    /// Display label: the column name, or its index for positional columns.
    pub fn label(&self, col: usize) -> String {
        match self.columns.get(col) {
            Some(Some(name)) => name.clone(),
            _ => col.to_string(),
        }
    }

    /// Position of the first column carrying `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.as_deref() == Some(name))
    }

    /// Remove columns by position. Positions refer to the table as it was
    /// before the call; duplicates are ignored.
    pub fn remove_columns(&mut self, positions: &[usize]) {
        let mut positions: Vec<usize> = positions
            .iter()
            .copied()
            .filter(|&p| p < self.width())
            .collect();
        positions.sort_unstable_by(|a, b| b.cmp(a));
        positions.dedup();

        for &p in &positions {
            self.columns.remove(p);
            for row in &mut self.rows {
                row.remove(p);
            }
        }
    }

    /// Give column `col` a new name.
    pub fn rename_column(&mut self, col: usize, name: impl Into<String>) {
        if let Some(label) = self.columns.get_mut(col) {
            *label = Some(name.into());
        }
    }

    /// Overwrite the column named `name`, or append it if absent.
    ///
    /// `values` must hold one cell per row; missing cells become empty.
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) {
        match self.position(name) {
            Some(col) => self.replace_column(col, values),
            None => {
                let mut values = values.into_iter();
                self.columns.push(Some(name.to_string()));
                for row in &mut self.rows {
                    row.push(values.next().unwrap_or_default());
                }
            }
        }
    }

    /// Overwrite the cells of column `col`; the label is kept.
    pub fn replace_column(&mut self, col: usize, values: Vec<Cell>) {
        if col >= self.width() {
            return;
        }
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row[col] = values.next().unwrap_or_default();
        }
    }

    /// Reverse data row order; the header is unaffected.
    pub fn reverse_rows(&mut self) {
        self.rows.reverse();
    }

    /// Rows as JSON objects keyed by column label.
    pub fn to_json(&self) -> Value {
        let labels: Vec<String> = (0..self.width()).map(|c| self.label(c)).collect();
        let records = self
            .rows
            .iter()
            .map(|row| {
                let obj: Map<String, Value> = labels
                    .iter()
                    .zip(row)
                    .map(|(label, cell)| (label.clone(), cell.to_json()))
                    .collect();
                Value::Object(obj)
            })
            .collect();
        Value::Array(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Table {
        Table::with_header(
            vec!["a", "b", "c"],
            vec![
                vec![Cell::from("1"), Cell::from("2"), Cell::from("3")],
                vec![Cell::from("4"), Cell::from("5")],
            ],
        )
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = sample();
        assert_eq!(table.width(), 3);
        assert_eq!(table.rows()[1].len(), 3);
        assert_eq!(table.rows()[1][2], Cell::Empty);
    }

    #[test]
    fn test_remove_columns_uses_original_positions() {
        let mut table = sample();
        table.remove_columns(&[0, 2, 0]);
        assert_eq!(table.columns(), &[Some("b".to_string())]);
        assert_eq!(table.rows()[0], vec![Cell::from("2")]);
    }

    #[test]
    fn test_set_column_appends_then_overwrites() {
        let mut table = sample();
        table.set_column("d", vec![Cell::Number(1.0), Cell::Number(2.0)]);
        assert_eq!(table.width(), 4);
        assert_eq!(table.label(3), "d");

        table.set_column("a", vec![Cell::Empty, Cell::Empty]);
        assert_eq!(table.width(), 4);
        assert_eq!(table.rows()[0][0], Cell::Empty);
    }

    #[test]
    fn test_replace_column_keeps_label() {
        let mut table = Table::new(vec![None, None], vec![vec![Cell::from("a"), Cell::Number(-5.0)]]);
        table.replace_column(1, vec![Cell::Number(5.0)]);
        assert_eq!(table.columns(), &[None, None]);
        assert_eq!(table.rows()[0][1], Cell::Number(5.0));

        table.replace_column(7, vec![Cell::Empty]);
        assert_eq!(table.width(), 2);
    }

    #[test]
    fn test_positional_labels() {
        let table = Table::new(vec![None, None], vec![]);
        assert!(!table.has_names());
        assert_eq!(table.label(1), "1");
        assert_eq!(table.position("1"), None);
    }

    #[test]
    fn test_cell_text_rendering() {
        assert_eq!(Cell::Number(10.0).to_text(), "10");
        assert_eq!(Cell::Number(-2.5).to_text(), "-2.5");
        let date = NaiveDate::from_ymd_opt(2023, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(Cell::Date(date).to_text(), "2023-02-01");
    }

    #[test]
    fn test_cell_emptiness() {
        assert!(Cell::Empty.is_empty());
        assert!(Cell::from("").is_empty());
        assert!(!Cell::from(" ").is_empty());
        assert!(!Cell::Number(0.0).is_empty());
    }

    #[test]
    fn test_to_json() {
        let table = sample();
        let json = table.to_json();
        assert_eq!(json[0]["a"], "1");
        assert_eq!(json[1]["c"], Value::Null);
    }
}
