//! Transformation module.
//!
//! - Column: column specifiers and name/index resolution
//! - Directive: `--transform` and `--rename` argument parsing
//! - Functions: MERGE, NEG, POS and LOOKUP evaluation
//! - Lookup: key/value tables for LOOKUP
//! - Reformat: whitespace and date column cleanup
//! - Pipeline: stage ordering, file conversion and batches

pub mod column;
pub mod directive;
pub mod functions;
pub mod lookup;
pub mod pipeline;
pub mod reformat;

pub use column::{parse_column_list, ColumnResolver, ColumnSpec};
pub use directive::{parse_renames, parse_transforms, RenameRule, TransformDirective, TransformFunction};
pub use functions::{evaluate, FUNCTIONS_HELP};
pub use lookup::LookupTable;
pub use pipeline::*;
