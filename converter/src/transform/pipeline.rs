//! High-level conversion API.
//!
//! Stages always run in the same order:
//!
//! 1. whitespace normalization (optional)
//! 2. column deletion
//! 3. column renaming
//! 4. date column parsing
//! 5. transform directives, in command-line order
//! 6. row reversal (optional)
//!
//! Deletions resolve against the header as read, before any transform can
//! add a column with a clashing name. Renames run before transforms so a
//! directive may name a column by its old or its new name.
//!
//! # Example
//!
//! ```rust,ignore
//! use csv2numbers::{convert_file, ConvertOptions};
//! use std::path::Path;
//!
//! let mut options = ConvertOptions::default();
//! options.add_transforms("Paid In=POS:Amount,Withdrawn=NEG:Amount")?;
//! let result = convert_file(Path::new("bank.csv"), Path::new("bank.xlsx"), &options)?;
//! println!("{} rows", result.table.height());
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::column::{parse_column_list, ColumnResolver, ColumnSpec};
use super::directive::{parse_renames, parse_transforms, RenameRule, TransformDirective, TransformFunction};
use super::functions::evaluate;
use super::lookup::LookupTable;
use super::reformat::{normalize_whitespace, parse_date_columns};
use crate::diagnostics::Diagnostics;
use crate::error::{ConvertError, ConvertResult, DirectiveResult, TransformError, TransformResult};
use crate::models::Table;
use crate::parser::{parse_bytes, parse_file};
use crate::writer::write_table;

/// Extension given to output files when `--output` is not used.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "xlsx";

/// What a batch does when one file fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Stop at the first failing file.
    #[default]
    Abort,
    /// Record the failure and carry on with the remaining files.
    Continue,
}

/// Options for the conversion pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Strip and collapse whitespace in text cells
    pub whitespace: bool,

    /// Reverse data row order
    pub reverse: bool,

    /// The CSV has no header row
    pub no_header: bool,

    /// Dates are written day first
    pub day_first: bool,

    /// Columns to delete
    pub delete: Vec<ColumnSpec>,

    /// Columns to parse as dates
    pub dates: Vec<ColumnSpec>,

    /// Column renames, applied in order
    pub renames: Vec<RenameRule>,

    /// Transform directives, applied in order
    pub transforms: Vec<TransformDirective>,

    /// Failure handling across multiple files
    pub policy: BatchPolicy,
}

impl ConvertOptions {
    /// Append a comma-separated `--delete` list.
    pub fn add_deletes(&mut self, arg: &str) -> DirectiveResult<()> {
        self.delete.extend(parse_column_list(arg)?);
        Ok(())
    }

    /// Append a comma-separated `--date` list.
    pub fn add_dates(&mut self, arg: &str) -> DirectiveResult<()> {
        self.dates.extend(parse_column_list(arg)?);
        Ok(())
    }

    /// Append a comma-separated `--rename` list.
    pub fn add_renames(&mut self, arg: &str) -> DirectiveResult<()> {
        self.renames.extend(parse_renames(arg)?);
        Ok(())
    }

    /// Append a comma-separated `--transform` list.
    pub fn add_transforms(&mut self, arg: &str) -> DirectiveResult<()> {
        self.transforms.extend(parse_transforms(arg)?);
        Ok(())
    }
}

/// Result of converting one table
#[derive(Debug, Clone)]
pub struct Conversion {
    /// The transformed table
    pub table: Table,

    /// Log entries collected along the way
    pub diagnostics: Diagnostics,
}

/// Run every pipeline stage over an already-loaded table.
pub fn transform_table(
    mut table: Table,
    options: &ConvertOptions,
    diags: &mut Diagnostics,
) -> ConvertResult<Table> {
    // Step 1: whitespace
    if options.whitespace {
        normalize_whitespace(&mut table);
        diags.info("Normalized whitespace");
    }

    // Step 2: delete
    if !options.delete.is_empty() {
        let positions = ColumnResolver::new(&table)
            .resolve_all(&options.delete)
            .map_err(|source| ConvertError::Column { stage: "delete", source })?;
        let labels: Vec<String> = positions.iter().map(|&p| table.label(p)).collect();
        table.remove_columns(&positions);
        diags.info(format!("Deleted columns: {}", labels.join(", ")));
    }

    // Step 3: rename
    let mut aliases: Vec<(String, String)> = Vec::new();
    if !options.renames.is_empty() {
        let resolver = ColumnResolver::new(&table);
        let positions = options
            .renames
            .iter()
            .map(|rule| resolver.resolve(&rule.from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ConvertError::Column { stage: "rename", source })?;

        for (pos, rule) in positions.into_iter().zip(&options.renames) {
            if let Some(old) = table.columns()[pos].clone() {
                if old != rule.to {
                    aliases.push((old, rule.to.clone()));
                }
            }
            diags.info(format!("Renamed {} → {}", table.label(pos), rule.to));
            table.rename_column(pos, rule.to.clone());
        }
    }

    // Step 4: dates
    if !options.dates.is_empty() {
        let positions = ColumnResolver::new(&table)
            .with_aliases(&aliases)
            .resolve_all(&options.dates)
            .map_err(|source| ConvertError::Column { stage: "parse dates", source })?;
        parse_date_columns(&mut table, &positions, options.day_first)?;
        diags.info(format!(
            "Parsed {} date column(s) ({})",
            positions.len(),
            if options.day_first { "day first" } else { "month first" }
        ));
    }

    // Step 5: transforms
    for directive in &options.transforms {
        apply_directive(&mut table, directive, &aliases, diags)?;
    }

    // Step 6: reverse
    if options.reverse {
        table.reverse_rows();
        diags.info("Reversed row order");
    }

    Ok(table)
}

fn apply_directive(
    table: &mut Table,
    directive: &TransformDirective,
    aliases: &[(String, String)],
    diags: &mut Diagnostics,
) -> TransformResult<()> {
    let sources = ColumnResolver::new(table)
        .with_aliases(aliases)
        .resolve_all(&directive.sources)
        .map_err(|source| TransformError::Column {
            directive: directive.to_string(),
            source,
        })?;

    // Loaded per directive and dropped once the column is computed.
    let lookup = match (directive.function, &directive.lookup_file) {
        (TransformFunction::Lookup, Some(path)) => Some(LookupTable::load(path, diags)?),
        _ => None,
    };

    let values = evaluate(directive.function, table, &sources, lookup.as_ref())?;
    let filled = values.iter().filter(|c| !c.is_empty()).count();
    match destination_index(table, &directive.dest) {
        Some(col) => table.replace_column(col, values),
        None => table.set_column(&directive.dest, values),
    }
    diags.info_indent(
        format!("{} ({} of {} rows filled)", directive, filled, table.height()),
        1,
    );
    Ok(())
}

/// A digit-only destination that names no column addresses a column by
/// position, as sources do.
fn destination_index(table: &Table, dest: &str) -> Option<usize> {
    if table.position(dest).is_some() {
        return None;
    }
    match ColumnSpec::parse(dest) {
        ColumnSpec::Index(col) if col < table.width() => Some(col),
        _ => None,
    }
}

/// Read and transform a CSV file without writing anything.
pub fn load_and_transform(input: &Path, options: &ConvertOptions) -> ConvertResult<Conversion> {
    let mut diagnostics = Diagnostics::new();
    let result = parse_file(input, options.no_header, &mut diagnostics)
        .map_err(ConvertError::from)
        .and_then(|table| {
            diagnostics.info(format!(
                "Read {} rows, {} columns from {}",
                table.height(),
                table.width(),
                input.display()
            ));
            transform_table(table, options, &mut diagnostics)
        });

    match result {
        Ok(table) => Ok(Conversion { table, diagnostics }),
        Err(e) => Err(e.in_file(input)),
    }
}

/// Transform CSV bytes.
///
/// Same as [`load_and_transform`] but accepts raw bytes instead of a path.
pub fn convert_bytes(bytes: &[u8], options: &ConvertOptions) -> ConvertResult<Conversion> {
    let mut diagnostics = Diagnostics::new();
    let table = parse_bytes(bytes, options.no_header, &mut diagnostics)?;
    let table = transform_table(table, options, &mut diagnostics)?;
    Ok(Conversion { table, diagnostics })
}

/// Convert one CSV file and write the spreadsheet to `output`.
pub fn convert_file(input: &Path, output: &Path, options: &ConvertOptions) -> ConvertResult<Conversion> {
    let mut result = load_and_transform(input, options)?;
    write_table(&result.table, output).map_err(|e| ConvertError::from(e).in_file(input))?;
    result.diagnostics.success(format!(
        "Wrote {} rows to {}",
        result.table.height(),
        output.display()
    ));
    Ok(result)
}

/// Input path with its extension replaced by [`DEFAULT_OUTPUT_EXTENSION`].
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension(DEFAULT_OUTPUT_EXTENSION)
}

/// Pair inputs with outputs; with no explicit outputs every input gets
/// its [`default_output_path`].
pub fn output_paths(inputs: &[PathBuf], outputs: &[PathBuf]) -> ConvertResult<Vec<PathBuf>> {
    if outputs.is_empty() {
        return Ok(inputs.iter().map(|p| default_output_path(p)).collect());
    }
    if outputs.len() != inputs.len() {
        return Err(ConvertError::OutputMismatch {
            inputs: inputs.len(),
            outputs: outputs.len(),
        });
    }
    Ok(outputs.to_vec())
}

/// Outcome for one file of a batch
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub result: ConvertResult<Diagnostics>,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per attempted file, in input order
    pub outcomes: Vec<FileOutcome>,

    /// Files not attempted because an earlier one failed
    pub skipped: Vec<PathBuf>,
}

impl BatchReport {
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.len() - self.failed_count()
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0 && self.skipped.is_empty()
    }
}

/// Run `job` over every input, honouring `policy` on failure.
pub fn run_batch<F>(inputs: &[PathBuf], policy: BatchPolicy, mut job: F) -> BatchReport
where
    F: FnMut(usize, &Path) -> ConvertResult<Diagnostics>,
{
    let mut report = BatchReport::default();

    for (i, input) in inputs.iter().enumerate() {
        let result = job(i, input);
        let failed = result.is_err();
        report.outcomes.push(FileOutcome {
            input: input.clone(),
            result,
        });
        if failed && policy == BatchPolicy::Abort {
            report.skipped = inputs[i + 1..].to_vec();
            break;
        }
    }

    report
}

/// Convert each input to its paired output.
pub fn convert_batch(inputs: &[PathBuf], outputs: &[PathBuf], options: &ConvertOptions) -> BatchReport {
    run_batch(inputs, options.policy, |i, input| {
        let output = outputs
            .get(i)
            .cloned()
            .unwrap_or_else(|| default_output_path(input));
        convert_file(input, &output, options).map(|r| r.diagnostics)
    })
}
