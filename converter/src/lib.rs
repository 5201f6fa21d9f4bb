//! # csv2numbers - CSV to spreadsheet conversion
//!
//! Converts bank-statement style CSV files into spreadsheets that Numbers
//! opens directly, cleaning up and deriving columns on the way.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Transform  │────▶│   Writer    │
//! │  (ISO/UTF8) │     │ (typed cells│     │ (delete,    │     │   (.xlsx)   │
//! │             │     │  auto-enc)  │     │  dates, fn) │     │             │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use csv2numbers::{convert_file, default_output_path, ConvertOptions};
//! use std::path::Path;
//!
//! let input = Path::new("statement.csv");
//! let mut options = ConvertOptions { day_first: true, ..Default::default() };
//! options.add_dates("Date")?;
//! options.add_transforms("Paid In=POS:Amount,Withdrawn=NEG:Amount")?;
//!
//! let result = convert_file(input, &default_output_path(input), &options)?;
//! println!("Wrote {} rows", result.table.height());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Cell and Table
//! - [`parser`] - CSV parsing with encoding auto-detection
//! - [`transform`] - Column operations and the conversion pipeline
//! - [`writer`] - Spreadsheet output
//! - [`diagnostics`] - Leveled log entries

// Core modules
pub mod diagnostics;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod writer;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ColumnError,
    ConvertError,
    CsvError,
    DateParseError,
    DirectiveError,
    LookupError,
    TransformError,
    WriteError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cell, Table};

// =============================================================================
// Re-exports - Diagnostics
// =============================================================================

pub use diagnostics::{Diagnostics, LogEntry, LogLevel};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_encoding,
    parse_bytes,
    parse_file,
    parse_list,
    parse_number,
};

// =============================================================================
// Re-exports - Transformations
// =============================================================================

pub use transform::{
    ColumnSpec,
    LookupTable,
    RenameRule,
    TransformDirective,
    TransformFunction,
    FUNCTIONS_HELP,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    convert_batch,
    convert_bytes,
    convert_file,
    default_output_path,
    load_and_transform,
    output_paths,
    run_batch,
    transform_table,
    BatchPolicy,
    BatchReport,
    Conversion,
    ConvertOptions,
    FileOutcome,
};

// =============================================================================
// Re-exports - Writer
// =============================================================================

pub use writer::write_table;
