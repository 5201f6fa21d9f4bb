//! csv2numbers CLI - Convert CSV files to spreadsheets
//!
//! ```bash
//! csv2numbers statement.csv                          # writes statement.xlsx
//! csv2numbers --day-first --date Date statement.csv
//! csv2numbers --delete Balance --rename 'Description:Payee' statement.csv
//! csv2numbers --transform 'Paid In=POS:Amount,Withdrawn=NEG:Amount' statement.csv
//! csv2numbers a.csv b.csv -o a.xlsx b.xlsx
//! csv2numbers --dry-run statement.csv                # print the result as JSON
//! ```

use clap::Parser;
use csv2numbers::{
    convert_batch, load_and_transform, output_paths, run_batch, BatchPolicy, ConvertOptions,
    Diagnostics, LogEntry, LogLevel, FUNCTIONS_HELP,
};
use serde_json::json;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "csv2numbers", version)]
#[command(about = "Convert CSV files to spreadsheets for Numbers", long_about = None)]
#[command(after_help = FUNCTIONS_HELP)]
struct Cli {
    /// CSV files to convert
    #[arg(required = true)]
    csvfile: Vec<PathBuf>,

    /// Strip whitespace from beginning and end of strings and collapse other whitespace
    #[arg(long)]
    whitespace: bool,

    /// Reverse the order of the data rows
    #[arg(long)]
    reverse: bool,

    /// CSV file has no header row
    #[arg(long)]
    no_header: bool,

    /// Dates are represented day first in the CSV file
    #[arg(long, env = "CSV2NUMBERS_DAY_FIRST")]
    day_first: bool,

    /// Comma-separated list of columns to parse as dates
    #[arg(long = "date", value_name = "COLUMNS")]
    dates: Vec<String>,

    /// Comma-separated list of columns to delete
    #[arg(long = "delete", value_name = "COLUMNS")]
    deletes: Vec<String>,

    /// Comma-separated list of column renames in the form OLD:NEW
    #[arg(long = "rename", value_name = "COLUMNS-MAP")]
    renames: Vec<String>,

    /// Comma-separated list of column transformations
    #[arg(long = "transform", value_name = "COLUMNS-MAP")]
    transforms: Vec<String>,

    /// Output filenames, one per CSV file (default: CSV name with .xlsx)
    #[arg(short, long, num_args = 1..)]
    output: Vec<PathBuf>,

    /// Keep converting the remaining files after one fails
    #[arg(long)]
    continue_on_error: bool,

    /// Print the converted tables as JSON instead of writing files
    #[arg(long)]
    dry_run: bool,

    /// Print every processing step
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            process::exit(1);
        }
    }
}

fn build_options(cli: &Cli) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
    let mut options = ConvertOptions {
        whitespace: cli.whitespace,
        reverse: cli.reverse,
        no_header: cli.no_header,
        day_first: cli.day_first,
        policy: if cli.continue_on_error {
            BatchPolicy::Continue
        } else {
            BatchPolicy::Abort
        },
        ..Default::default()
    };

    for arg in &cli.deletes {
        options.add_deletes(arg)?;
    }
    for arg in &cli.dates {
        options.add_dates(arg)?;
    }
    for arg in &cli.renames {
        options.add_renames(arg)?;
    }
    for arg in &cli.transforms {
        options.add_transforms(arg)?;
    }
    Ok(options)
}

/// Returns `Ok(false)` when some file failed; those errors are already printed.
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    // Argument errors are reported before any file is read.
    let options = build_options(&cli)?;
    let outputs = output_paths(&cli.csvfile, &cli.output)?;

    if cli.verbose {
        eprintln!("⚙️  Options: {}", serde_json::to_string(&options)?);
    }

    let report = if cli.dry_run {
        run_batch(&cli.csvfile, options.policy, |_, input| {
            let result = load_and_transform(input, &options)?;
            let doc = json!({
                "file": input.display().to_string(),
                "rows": result.table.to_json(),
            });
            println!("{}", serde_json::to_string_pretty(&doc).unwrap_or_default());
            Ok(result.diagnostics)
        })
    } else {
        convert_batch(&cli.csvfile, &outputs, &options)
    };

    for outcome in &report.outcomes {
        if cli.verbose {
            eprintln!("📄 Processed: {}", outcome.input.display());
        }
        match &outcome.result {
            Ok(diags) => print_diagnostics(diags, cli.verbose),
            Err(e) => eprintln!("{}", LogEntry::error(e.to_string()).render()),
        }
    }
    for skipped in &report.skipped {
        eprintln!("⚠️  Skipped: {}", skipped.display());
    }

    if cli.csvfile.len() > 1 && (cli.verbose || !report.is_success()) {
        eprintln!(
            "\n📊 Results: {} converted, {} failed, {} skipped",
            report.succeeded_count(),
            report.failed_count(),
            report.skipped.len()
        );
    }

    Ok(report.is_success())
}

fn print_diagnostics(diags: &Diagnostics, verbose: bool) {
    let threshold = if verbose { LogLevel::Info } else { LogLevel::Warning };
    for entry in diags.at_least(threshold) {
        eprintln!("{}", entry.render());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const BANK_CSV: &str = "Date,Amount\n01/02/2023,-5\n01/02/2023,10\n";

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("csv2numbers").chain(args.iter().copied())).unwrap()
    }

    fn path_str(path: &Path) -> &str {
        path.to_str().unwrap()
    }

    #[test]
    fn test_missing_csvfile_rejected() {
        let err = Cli::try_parse_from(["csv2numbers"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_repeatable_lists_and_outputs() {
        let cli = cli(&[
            "--delete", "Balance",
            "--delete", "0",
            "--transform", "Paid In=POS:Amount",
            "a.csv", "b.csv",
            "-o", "a.xlsx", "b.xlsx",
        ]);
        assert_eq!(cli.deletes, vec!["Balance", "0"]);
        assert_eq!(cli.csvfile, vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")]);
        assert_eq!(cli.output.len(), 2);

        let options = build_options(&cli).unwrap();
        assert_eq!(options.delete.len(), 2);
        assert_eq!(options.policy, BatchPolicy::Abort);
    }

    #[test]
    fn test_bad_directive_fails_before_reading() {
        // The input does not exist; a directive error must win.
        let err = run(cli(&["--transform", "XX=FUNC:Account", "/nonexistent/in.csv"])).unwrap_err();
        assert_eq!(err.to_string(), "'FUNC': invalid transformation");

        let err = run(cli(&["--transform", "Amount", "/nonexistent/in.csv"])).unwrap_err();
        assert_eq!(err.to_string(), "'Amount': invalid transformation format");

        let err = run(cli(&["--rename", "A:B:C", "/nonexistent/in.csv"])).unwrap_err();
        assert!(err.to_string().contains("OLD:NEW"));
    }

    #[test]
    fn test_output_count_mismatch() {
        let err = run(cli(&["a.csv", "b.csv", "-o", "a.xlsx"])).unwrap_err();
        assert!(err.to_string().contains("do not match"));
    }

    #[test]
    fn test_quiet_run_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bank.csv");
        std::fs::write(&input, BANK_CSV).unwrap();

        let ok = run(cli(&["--transform", "Paid In=POS:Amount,Withdrawn=NEG:Amount", path_str(&input)]))
            .unwrap();
        assert!(ok);
        assert!(dir.path().join("bank.xlsx").exists());
    }

    #[test]
    fn test_unknown_columns_fail_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bank.csv");
        std::fs::write(&input, BANK_CSV).unwrap();

        assert!(!run(cli(&["--delete", "XX", path_str(&input)])).unwrap());
        assert!(!run(cli(&["--transform", "XX=POS:YY", path_str(&input)])).unwrap());
        assert!(!dir.path().join("bank.xlsx").exists());
    }

    #[test]
    fn test_failed_file_under_each_policy() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.csv");
        let good = dir.path().join("good.csv");
        std::fs::write(&good, BANK_CSV).unwrap();
        let good_output = dir.path().join("good.xlsx");

        assert!(!run(cli(&[path_str(&missing), path_str(&good)])).unwrap());
        assert!(!good_output.exists());

        assert!(!run(cli(&["--continue-on-error", path_str(&missing), path_str(&good)])).unwrap());
        assert!(good_output.exists());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bank.csv");
        std::fs::write(&input, BANK_CSV).unwrap();

        assert!(run(cli(&["--dry-run", path_str(&input)])).unwrap());
        assert!(!dir.path().join("bank.xlsx").exists());
    }
}
