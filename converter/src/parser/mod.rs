//! CSV reading with encoding auto-detection.
//!
//! Input files use the Excel dialect (comma separated, double-quote
//! quoting). Cells are typed on the way in: numeric strings, including
//! ones with `,` thousands separators, become [`Cell::Number`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::diagnostics::Diagnostics;
use crate::error::{CsvError, CsvResult, DirectiveError, DirectiveResult};
use crate::models::{Cell, Table};

static PLAIN_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("valid number regex")
});

static GROUPED_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").expect("valid number regex"));

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the specified encoding.
///
/// Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let text = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Parse a numeric string. Accepts plain decimals, exponents, and
/// `,`-grouped thousands (`1,234.50`). Surrounding whitespace is ignored.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if PLAIN_NUMBER.is_match(s) {
        s.parse().ok()
    } else if GROUPED_NUMBER.is_match(s) {
        s.replace(',', "").parse().ok()
    } else {
        None
    }
}

/// Type a raw CSV field.
pub fn infer_cell(raw: &str) -> Cell {
    if raw.trim().is_empty() {
        return Cell::Empty;
    }
    match parse_number(raw) {
        Some(n) => Cell::Number(n),
        None => Cell::Text(raw.to_string()),
    }
}

/// Parse CSV text into a [`Table`].
///
/// With `no_header` every column is positional-only. Rows with fewer
/// fields than the header are padded (and reported); rows with more are
/// an error.
pub fn parse_str(content: &str, no_header: bool, diags: &mut Diagnostics) -> CsvResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut columns: Option<Vec<Option<String>>> = None;
    let mut rows = Vec::new();
    let mut padded = 0usize;

    for result in reader.records() {
        let record = result?;
        if record.iter().all(|f| f.is_empty()) && record.len() <= 1 {
            continue;
        }

        let expected = match columns.as_ref().map(Vec::len) {
            Some(width) => width,
            None if no_header => {
                columns = Some(vec![None; record.len()]);
                record.len()
            }
            None => {
                columns = Some(record.iter().map(|f| Some(f.to_string())).collect());
                continue;
            }
        };

        if record.len() > expected {
            return Err(CsvError::Ragged {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected,
                found: record.len(),
            });
        }
        if record.len() < expected {
            padded += 1;
        }
        rows.push(record.iter().map(infer_cell).collect::<Vec<_>>());
    }

    let columns = columns.ok_or(CsvError::Empty)?;
    if padded > 0 {
        diags.warning(format!("{} short rows padded with empty cells", padded));
    }
    Ok(Table::new(columns, rows))
}

/// Read a CSV file with encoding auto-detection.
pub fn parse_file<P: AsRef<Path>>(path: P, no_header: bool, diags: &mut Diagnostics) -> CsvResult<Table> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes, no_header, diags)
}

/// Parse CSV bytes with encoding auto-detection.
pub fn parse_bytes(bytes: &[u8], no_header: bool, diags: &mut Diagnostics) -> CsvResult<Table> {
    let encoding = detect_encoding(bytes);
    diags.info(format!("Detected encoding: {}", encoding));
    let content = decode_content(bytes, &encoding);
    parse_str(&content, no_header, diags)
}

/// Split a command-line list argument as one line of Excel-dialect CSV.
///
/// `a,"b, c",d` yields `["a", "b, c", "d"]`. An empty argument yields an
/// empty list.
pub fn parse_list(arg: &str) -> DirectiveResult<Vec<String>> {
    if arg.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(arg.as_bytes());

    let mut records = reader.records();
    let record = match records.next() {
        Some(Ok(record)) => record,
        Some(Err(_)) | None => return Err(DirectiveError::MalformedList(arg.to_string())),
    };
    if records.next().is_some() {
        return Err(DirectiveError::MalformedList(arg.to_string()));
    }
    Ok(record.iter().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(csv: &str) -> Table {
        parse_str(csv, false, &mut Diagnostics::new()).unwrap()
    }

    #[test]
    fn test_simple_csv() {
        let table = parse("name,age\nAlice,30\nBob,25");

        assert_eq!(table.height(), 2);
        assert_eq!(table.label(0), "name");
        assert_eq!(table.rows()[0][0], Cell::from("Alice"));
        assert_eq!(table.rows()[0][1], Cell::Number(30.0));
        assert_eq!(table.rows()[1][1], Cell::Number(25.0));
    }

    #[test]
    fn test_quoted_values() {
        let table = parse("name,value\n\"Smith, J\",\"1,234.50\"");

        assert_eq!(table.rows()[0][0], Cell::from("Smith, J"));
        assert_eq!(table.rows()[0][1], Cell::Number(1234.5));
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse("a,b\n1,2\n\n3,4\n");
        assert_eq!(table.height(), 2);
    }

    #[test]
    fn test_missing_values_padded() {
        let mut diags = Diagnostics::new();
        let table = parse_str("a,b,c\n1,,3\n4", false, &mut diags).unwrap();

        assert_eq!(table.rows()[0][1], Cell::Empty);
        assert_eq!(table.rows()[1], vec![Cell::Number(4.0), Cell::Empty, Cell::Empty]);
        assert!(diags.has_warnings());
    }

    #[test]
    fn test_extra_fields_rejected() {
        let result = parse_str("a,b\n1,2,3", false, &mut Diagnostics::new());
        match result {
            Err(CsvError::Ragged { line, expected, found }) => {
                assert_eq!(line, 2);
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            other => panic!("expected ragged row error, got {:?}", other),
        }
    }

    #[test]
    fn test_no_header_mode() {
        let table = parse_str("1,x\n2,y", true, &mut Diagnostics::new()).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.columns(), &[None, None]);
        assert_eq!(table.rows()[0][1], Cell::from("x"));
    }

    #[test]
    fn test_empty_csv_error() {
        let result = parse_str("", false, &mut Diagnostics::new());
        assert!(matches!(result, Err(CsvError::Empty)));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("-5"), Some(-5.0));
        assert_eq!(parse_number(" 10.25 "), Some(10.25));
        assert_eq!(parse_number("1,234,567"), Some(1234567.0));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("12,34"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("a,b,0").unwrap(), vec!["a", "b", "0"]);
        assert_eq!(parse_list("\"x, y\",z").unwrap(), vec!["x, y", "z"]);
        assert!(parse_list("").unwrap().is_empty());
        assert!(matches!(parse_list("a\nb"), Err(DirectiveError::MalformedList(_))));
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_bom_stripped() {
        let table = parse_bytes(b"\xef\xbb\xbfDate,Amount\n1,2", false, &mut Diagnostics::new()).unwrap();
        assert_eq!(table.label(0), "Date");
    }
}
