//! Row-level reformatting: whitespace cleanup, row reversal, date columns.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DateParseError;
use crate::models::{Cell, Table};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

// Two-digit years first: `%Y` would happily read "23" as year 23.
const DAY_FIRST: &[&str] = &[
    "%d/%m/%y", "%d-%m-%y", "%d.%m.%y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y",
];

const MONTH_FIRST: &[&str] = &[
    "%m/%d/%y", "%m-%d-%y", "%m.%d.%y", "%m/%d/%Y", "%m-%d-%Y", "%m.%d.%Y",
];

const UNAMBIGUOUS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%d %b %Y", "%d %B %Y", "%d-%b-%Y", "%b %d, %Y", "%B %d, %Y",
];

const TIME_SUFFIXES: &[&str] = &[" %H:%M:%S", " %H:%M", "T%H:%M:%S", "T%H:%M"];

/// Strip and collapse whitespace.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}

/// Apply [`collapse_whitespace`] to every text cell.
pub fn normalize_whitespace(table: &mut Table) {
    for row in table.rows_mut() {
        for cell in row.iter_mut() {
            if let Cell::Text(s) = cell {
                *s = collapse_whitespace(s);
            }
        }
    }
}

/// Parse a date string.
///
/// `day_first` is a preference: it decides how `01/02/2023` reads, but a
/// value that only fits the other order (`13/02/2023` month first) is
/// still accepted that way.
pub fn parse_date(text: &str, day_first: bool) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let (preferred, fallback) = if day_first {
        (DAY_FIRST, MONTH_FIRST)
    } else {
        (MONTH_FIRST, DAY_FIRST)
    };

    preferred
        .iter()
        .chain(UNAMBIGUOUS)
        .chain(fallback)
        .find_map(|fmt| parse_with(text, fmt))
}

fn parse_with(text: &str, fmt: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
        return date.and_hms_opt(0, 0, 0);
    }
    TIME_SUFFIXES.iter().find_map(|suffix| {
        NaiveDateTime::parse_from_str(text, &format!("{}{}", fmt, suffix)).ok()
    })
}

/// Convert the given columns to [`Cell::Date`]. Empty cells stay empty.
pub fn parse_date_columns(
    table: &mut Table,
    columns: &[usize],
    day_first: bool,
) -> Result<(), DateParseError> {
    let labels: Vec<String> = columns.iter().map(|&c| table.label(c)).collect();

    for (row_idx, row) in table.rows_mut().iter_mut().enumerate() {
        for (&col, label) in columns.iter().zip(&labels) {
            let Some(cell) = row.get_mut(col) else {
                continue;
            };
            if matches!(cell, Cell::Empty | Cell::Date(_)) {
                continue;
            }
            let text = cell.to_text();
            if text.trim().is_empty() {
                *cell = Cell::Empty;
                continue;
            }
            match parse_date(&text, day_first) {
                Some(date) => *cell = Cell::Date(date),
                None => {
                    return Err(DateParseError {
                        row: row_idx + 1,
                        column: label.clone(),
                        value: text,
                    })
                }
            }
        }
    }
    Ok(())
}
