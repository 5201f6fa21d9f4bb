//! LOOKUP key/value tables.
//!
//! A lookup table is a single two-column table: keys on the left, values on
//! the right. A source value maps to the value of the longest key it
//! contains; among equally long keys the one defined first wins.

use calamine::{open_workbook_auto, Data, Reader};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::diagnostics::Diagnostics;
use crate::error::{LookupError, LookupResult};
use crate::models::Cell;
use crate::parser::infer_cell;

/// Ordered key/value pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupTable {
    entries: Vec<(String, Cell)>,
}

impl LookupTable {
    pub fn new(entries: Vec<(String, Cell)>) -> Self {
        Self { entries }
    }

    /// Build from plain string pairs; values are typed like CSV fields.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), infer_cell(v.as_ref())))
                .collect(),
        )
    }

    /// Load a lookup table from a `.csv` file or a spreadsheet document.
    pub fn load(path: &Path, diags: &mut Diagnostics) -> LookupResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let raw = match extension.as_deref() {
            Some("csv") => read_csv_pairs(path)?,
            Some("numbers") => {
                return Err(format_error(
                    path,
                    "Numbers documents cannot be read; export the lookup table as .csv, .xlsx or .ods",
                ))
            }
            _ => read_workbook_pairs(path)?,
        };

        let table = Self::from_raw(raw, path, diags);
        diags.info(format!(
            "Loaded {} lookup keys from {}",
            table.len(),
            path.display()
        ));
        Ok(table)
    }

    /// Drop empty keys and report duplicates; order is preserved.
    fn from_raw(raw: Vec<(String, Cell)>, path: &Path, diags: &mut Diagnostics) -> Self {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(raw.len());

        for (i, (key, value)) in raw.into_iter().enumerate() {
            if key.is_empty() {
                diags.warning(format!(
                    "{}: row {} has an empty key and is ignored",
                    path.display(),
                    i + 1
                ));
                continue;
            }
            if !seen.insert(key.clone()) {
                diags.warning(format!(
                    "{}: duplicate key '{}' on row {} never matches",
                    path.display(),
                    key,
                    i + 1
                ));
            }
            entries.push((key, value));
        }

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, Cell)] {
        &self.entries
    }

    /// Value of the longest key contained in `text`; ties go to the earlier key.
    pub fn find(&self, text: &str) -> Option<&Cell> {
        let mut best: Option<(usize, &Cell)> = None;
        for (key, value) in &self.entries {
            if key.is_empty() || !text.contains(key.as_str()) {
                continue;
            }
            let len = key.chars().count();
            if best.map_or(true, |(best_len, _)| len > best_len) {
                best = Some((len, value));
            }
        }
        best.map(|(_, value)| value)
    }
}

fn format_error(path: &Path, message: impl Into<String>) -> LookupError {
    LookupError::Format {
        path: PathBuf::from(path),
        message: message.into(),
    }
}

fn read_csv_pairs(path: &Path) -> LookupResult<Vec<(String, Cell)>> {
    let bytes = std::fs::read(path).map_err(|source| LookupError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let content = crate::parser::decode_content(&bytes, &crate::parser::detect_encoding(&bytes));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut pairs = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| LookupError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() != 2 {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(format_error(
                path,
                format!(
                    "line {}: lookup table must have exactly two columns, found {}",
                    line,
                    record.len()
                ),
            ));
        }
        pairs.push((record[0].to_string(), infer_cell(&record[1])));
    }
    Ok(pairs)
}

fn read_workbook_pairs(path: &Path) -> LookupResult<Vec<(String, Cell)>> {
    let mut workbook = open_workbook_auto(path).map_err(|source| LookupError::Spreadsheet {
        path: path.to_path_buf(),
        source,
    })?;

    let mut sheets = workbook.worksheets();
    if sheets.len() != 1 {
        return Err(format_error(
            path,
            format!(
                "lookup file must contain exactly one table, found {}",
                sheets.len()
            ),
        ));
    }
    let Some((_, range)) = sheets.pop() else {
        return Err(format_error(path, "lookup file contains no table"));
    };

    if range.width() != 2 {
        return Err(format_error(
            path,
            format!(
                "lookup table must have exactly two columns, found {}",
                range.width()
            ),
        ));
    }

    Ok(range
        .rows()
        .filter(|row| !row.iter().all(|d| matches!(d, Data::Empty)))
        .map(|row| (data_to_cell(&row[0]).to_text(), data_to_cell(&row[1])))
        .collect())
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        other => Cell::Text(other.to_string()),
    }
}
