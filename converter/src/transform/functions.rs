//! Column transformation functions.
//!
//! Each function reads the resolved source columns of every row and
//! produces one new cell per row.

use super::directive::TransformFunction;
use super::lookup::LookupTable;
use crate::error::{TransformError, TransformResult};
use crate::models::{Cell, Table};

/// Compute the destination column for `function` over `sources`.
///
/// `lookup` must be provided for [`TransformFunction::Lookup`]; LOOKUP
/// reads only the first source.
pub fn evaluate(
    function: TransformFunction,
    table: &Table,
    sources: &[usize],
    lookup: Option<&LookupTable>,
) -> TransformResult<Vec<Cell>> {
    match function {
        TransformFunction::Merge => Ok(merge(table, sources)),
        TransformFunction::Neg => select_signed(table, sources, Sign::Negative),
        TransformFunction::Pos => select_signed(table, sources, Sign::NonNegative),
        TransformFunction::Lookup => {
            let values = match (lookup, sources.first()) {
                (Some(lookup), Some(&source)) => lookup_column(table, source, lookup),
                _ => vec![Cell::Empty; table.height()],
            };
            Ok(values)
        }
    }
}

/// First non-empty source value per row.
pub fn merge(table: &Table, sources: &[usize]) -> Vec<Cell> {
    table
        .rows()
        .iter()
        .map(|row| {
            sources
                .iter()
                .filter_map(|&col| row.get(col))
                .find(|cell| !cell.is_empty())
                .cloned()
                .unwrap_or_default()
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    /// Strictly below zero; the magnitude is kept.
    Negative,
    /// Zero or above.
    NonNegative,
}

impl Sign {
    fn select(self, n: f64) -> Option<f64> {
        match self {
            Sign::Negative if n < 0.0 => Some(n.abs()),
            Sign::NonNegative if n >= 0.0 => Some(n.abs()),
            _ => None,
        }
    }
}

/// First source value per row with the requested sign.
///
/// Zero belongs to POS, never to NEG. Empty sources are skipped;
/// non-numeric ones are an error.
fn select_signed(table: &Table, sources: &[usize], sign: Sign) -> TransformResult<Vec<Cell>> {
    let mut out = Vec::with_capacity(table.height());

    for (row_idx, row) in table.rows().iter().enumerate() {
        let mut value = Cell::Empty;
        for &col in sources {
            let Some(cell) = row.get(col).filter(|c| !c.is_empty()) else {
                continue;
            };
            let n = cell.as_number().ok_or_else(|| TransformError::TypeConversion {
                row: row_idx + 1,
                column: table.label(col),
                value: cell.to_text(),
            })?;
            if let Some(selected) = sign.select(n) {
                value = Cell::Number(selected);
                break;
            }
        }
        out.push(value);
    }

    Ok(out)
}

/// Lookup value for each row's source text; empty when nothing matches.
pub fn lookup_column(table: &Table, source: usize, lookup: &LookupTable) -> Vec<Cell> {
    table
        .rows()
        .iter()
        .map(|row| {
            row.get(source)
                .filter(|cell| !cell.is_empty())
                .and_then(|cell| lookup.find(&cell.to_text()))
                .cloned()
                .unwrap_or_default()
        })
        .collect()
}

/// Help text for the transformation functions.
pub const FUNCTIONS_HELP: &str = r#"Transformations (--transform 'DEST=FUNC:SRC[;SRC...]'):

| Function | Result |
|----------|--------|
| MERGE    | first non-empty value among the source columns |
| NEG      | absolute value of the first negative source value |
| POS      | first source value that is zero or positive |
| LOOKUP   | value of the longest key contained in the source (DEST=LOOKUP:SRC;FILE) |

Examples:
  --transform 'Paid In=POS:Amount,Withdrawn=NEG:Amount'
  --transform 'Payee=MERGE:Name;Reference'
  --transform 'Category=LOOKUP:Description;categories.csv'"#;
