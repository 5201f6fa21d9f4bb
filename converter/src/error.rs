//! Error types for the csv2numbers conversion pipeline.
//!
//! Each stage owns its own error enum:
//!
//! - [`CsvError`] - reading and decoding the input CSV
//! - [`DirectiveError`] - malformed `--delete`/`--rename`/`--transform` arguments
//! - [`ColumnError`] - column specifiers that do not resolve
//! - [`DateParseError`] - date columns with unparseable values
//! - [`LookupError`] - LOOKUP tables that cannot be loaded
//! - [`TransformError`] - failures while computing derived columns
//! - [`WriteError`] - spreadsheet serialization failures
//! - [`ConvertError`] - top-level orchestration errors
//!
//! Conversion is automatic via `From` implementations so `?` works across
//! stage boundaries.

use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// CSV Reading Errors
// =============================================================================

/// Errors while reading a CSV file.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV data.
    #[error("{0}")]
    Parse(#[from] csv::Error),

    /// A data row has more fields than the header.
    #[error("line {line}: expected {expected} fields, saw {found}")]
    Ragged {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// Empty file.
    #[error("CSV file is empty")]
    Empty,
}

// =============================================================================
// Argument Errors
// =============================================================================

/// Malformed column lists, rename maps, or transform directives.
///
/// These are always detected before any file is read.
#[derive(Debug, Error)]
pub enum DirectiveError {
    /// The directive does not match `DEST=FUNC:SRC` or `DEST:FUNC=SRC`.
    #[error("'{0}': invalid transformation format")]
    InvalidFormat(String),

    /// The function tag is not one of MERGE, NEG, POS, LOOKUP.
    #[error("'{0}': invalid transformation")]
    UnknownFunction(String),

    /// Wrong number of sources for the function.
    #[error("'{directive}': {function} takes {expected}")]
    WrongArity {
        directive: String,
        function: String,
        expected: &'static str,
    },

    /// A rename entry is not exactly `OLD:NEW`.
    #[error("'{0}': column rename maps must be formatted 'OLD:NEW'")]
    InvalidRename(String),

    /// The argument is not a valid single-line CSV string.
    #[error("'{0}': malformed CSV string")]
    MalformedList(String),
}

// =============================================================================
// Column Resolution Errors
// =============================================================================

/// A column specifier that does not resolve against the current header.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ColumnError {
    /// No column carries this name.
    #[error("'{column}': column not found")]
    NotFound { column: String },

    /// Numeric index beyond the row width.
    #[error("column index {index} out of range (table has {width} columns)")]
    IndexOutOfRange { index: usize, width: usize },
}

// =============================================================================
// Date Errors
// =============================================================================

/// A value in a date column that matches none of the accepted date shapes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("row {row}, column '{column}': cannot parse '{value}' as a date")]
pub struct DateParseError {
    /// 1-based data row.
    pub row: usize,
    pub column: String,
    pub value: String,
}

// =============================================================================
// Lookup Table Errors
// =============================================================================

/// Errors while loading a LOOKUP key/value table.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The document is not a single two-column table.
    #[error("{}: {message}", .path.display())]
    Format { path: PathBuf, message: String },

    /// Failed to read file.
    #[error("{}: cannot read lookup table: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The spreadsheet reader rejected the document.
    #[error("{}: {source}", .path.display())]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    /// Malformed CSV lookup file.
    #[error("{}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors while computing derived columns.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A directive source column does not resolve.
    #[error("'{directive}': {source}")]
    Column {
        directive: String,
        #[source]
        source: ColumnError,
    },

    /// NEG/POS source value is not numeric.
    #[error("row {row}, column '{column}': cannot convert '{value}' to a number")]
    TypeConversion {
        row: usize,
        column: String,
        value: String,
    },

    /// LOOKUP table could not be loaded.
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

// =============================================================================
// Writer Errors
// =============================================================================

/// Errors while writing the output spreadsheet.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The spreadsheet library failed.
    #[error("cannot write {}: {source}", .path.display())]
    Xlsx {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    /// Table exceeds worksheet limits.
    #[error("table too large for a worksheet: {0}")]
    TooLarge(String),
}

// =============================================================================
// Conversion Errors (top-level)
// =============================================================================

/// Top-level conversion errors.
///
/// This is the error type returned by [`crate::transform::pipeline::convert_file`].
#[derive(Debug, Error)]
pub enum ConvertError {
    /// CSV reading error.
    #[error(transparent)]
    Csv(#[from] CsvError),

    /// Argument parsing error.
    #[error(transparent)]
    Directive(#[from] DirectiveError),

    /// Column resolution failed in a pipeline stage.
    #[error("cannot {stage}: {source}")]
    Column {
        stage: &'static str,
        #[source]
        source: ColumnError,
    },

    /// Date column parsing error.
    #[error(transparent)]
    Date(#[from] DateParseError),

    /// Transformation error.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Writer error.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Any of the above, tagged with the input file it came from.
    #[error("{}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<ConvertError>,
    },

    /// `--output` count differs from the number of inputs.
    #[error("the numbers of input and output file names do not match ({inputs} inputs, {outputs} outputs)")]
    OutputMismatch { inputs: usize, outputs: usize },
}

impl ConvertError {
    /// Attach the input file path to an error.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        ConvertError::File {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// Strip any file context and return the underlying error.
    pub fn root(&self) -> &ConvertError {
        match self {
            ConvertError::File { source, .. } => source.root(),
            other => other,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for argument parsing.
pub type DirectiveResult<T> = Result<T, DirectiveError>;

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for lookup table loading.
pub type LookupResult<T> = Result<T, LookupError>;

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;
