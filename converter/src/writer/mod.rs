//! Spreadsheet output.
//!
//! Tables are written as a single-sheet `.xlsx` workbook, which Numbers
//! opens directly. Numbers and dates keep their type; empty cells are left
//! unwritten.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;
use thiserror::Error;

use crate::error::WriteError;
use crate::models::{Cell, Table};

/// Worksheet row limit, header included.
pub const MAX_ROWS: usize = 1_048_576;

/// Worksheet column limit.
pub const MAX_COLUMNS: usize = 16_384;

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Write `table` to `path`, replacing any existing file.
pub fn write_table(table: &Table, path: &Path) -> Result<(), WriteError> {
    let mut workbook = build_workbook(table).map_err(|e| e.at(path))?;
    workbook.save(path).map_err(|source| WriteError::Xlsx {
        path: path.to_path_buf(),
        source,
    })
}

/// Build the in-memory workbook without saving it.
pub fn build_workbook(table: &Table) -> Result<Workbook, BuildError> {
    check_limits(table)?;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    fill_worksheet(sheet, table)?;
    sheet.autofit();
    Ok(workbook)
}

/// Failure while building a workbook that has no path yet.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("table too large for a worksheet: {0}")]
    TooLarge(String),

    #[error(transparent)]
    Xlsx(#[from] XlsxError),
}

impl BuildError {
    fn at(self, path: &Path) -> WriteError {
        match self {
            BuildError::TooLarge(msg) => WriteError::TooLarge(msg),
            BuildError::Xlsx(source) => WriteError::Xlsx {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

fn check_limits(table: &Table) -> Result<(), BuildError> {
    let rows = table.height() + usize::from(table.has_names());
    if rows > MAX_ROWS {
        return Err(BuildError::TooLarge(format!(
            "{} rows (limit {})",
            rows, MAX_ROWS
        )));
    }
    if table.width() > MAX_COLUMNS {
        return Err(BuildError::TooLarge(format!(
            "{} columns (limit {})",
            table.width(),
            MAX_COLUMNS
        )));
    }
    Ok(())
}

fn fill_worksheet(sheet: &mut Worksheet, table: &Table) -> Result<(), XlsxError> {
    let date_format = Format::new().set_num_format(DATE_FORMAT);
    let datetime_format = Format::new().set_num_format(DATETIME_FORMAT);

    let mut first_data_row = 0u32;
    if table.has_names() {
        for col in 0..table.width() {
            sheet.write_string(0, col as u16, table.label(col))?;
        }
        first_data_row = 1;
    }

    for (i, row) in table.rows().iter().enumerate() {
        let r = first_data_row + i as u32;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) if s.is_empty() => {}
                Cell::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
                Cell::Number(n) => {
                    sheet.write_number(r, c, *n)?;
                }
                Cell::Date(d) => {
                    let format = if d.time().num_seconds_from_midnight() == 0 {
                        &date_format
                    } else {
                        &datetime_format
                    };
                    sheet.write_number_with_format(r, c, excel_serial(d), format)?;
                }
            }
        }
    }
    Ok(())
}

/// Days since the 1900 date system epoch, fractional part for the time.
pub fn excel_serial(d: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let delta = *d - epoch;
    delta.num_seconds() as f64 / 86_400.0
}
