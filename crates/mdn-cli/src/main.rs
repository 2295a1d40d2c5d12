//! MDN CLI - validate, inspect and convert MDN spreadsheet documents

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mdn_sheets::prelude::*;
use mdn_sheets::{validate_with_options, CsvWriteOptions, LineTerminator};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mdn")]
#[command(
    author,
    version,
    about = "Validate, inspect and convert MDN spreadsheet documents"
)]
struct Cli {
    /// Log decoding details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a document and report errors and warnings
    Validate {
        /// Input MDN document
        input: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Show information about a document
    Info {
        /// Input file (mdn, csv)
        input: PathBuf,
    },

    /// List all sheets in a document
    Sheets {
        /// Input file (mdn, csv)
        input: PathBuf,
    },

    /// Decode and re-encode a document with coalesced ranges
    Normalize {
        /// Input file (mdn, csv)
        input: PathBuf,

        /// Output MDN file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export one sheet's grid as CSV to stdout or a file
    #[command(alias = "csv")]
    ToCsv {
        /// Input file (mdn, csv)
        input: PathBuf,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Sheet name or 0-based index (default: 0)
        #[arg(short, long, default_value = "0")]
        sheet: String,

        /// Field delimiter (default: comma)
        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// End lines with CRLF
        #[arg(long)]
        crlf: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Validate {
            input,
            json,
            strict,
        } => validate_file(&input, json, strict),
        Commands::Info { input } => show_info(&input).map(|_| ExitCode::SUCCESS),
        Commands::Sheets { input } => list_sheets(&input).map(|_| ExitCode::SUCCESS),
        Commands::Normalize { input, output } => {
            normalize(&input, output.as_deref()).map(|_| ExitCode::SUCCESS)
        }
        Commands::ToCsv {
            input,
            output,
            sheet,
            delimiter,
            crlf,
        } => to_csv(&input, output.as_deref(), &sheet, delimiter, crlf).map(|_| ExitCode::SUCCESS),
    }
}

/// Send logs to stderr; `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default = if verbose {
        "mdn_core=debug,mdn_csv=debug,mdn_format=debug,mdn_sheets=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn open(input: &Path) -> Result<Workbook> {
    Workbook::open(input).with_context(|| format!("Failed to open '{}'", input.display()))
}

fn validate_file(input: &Path, json: bool, strict: bool) -> Result<ExitCode> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;
    let options = DecodeOptions {
        strict,
        ..Default::default()
    };
    let report = validate_with_options(&text, &options);

    if json {
        let rendered =
            serde_json::to_string_pretty(&report).context("Failed to render the report")?;
        println!("{}", rendered);
    } else {
        print!("{}: {}", input.display(), report);
    }

    Ok(if report.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn show_info(input: &Path) -> Result<()> {
    let workbook = open(input)?;
    let properties = workbook.properties();

    println!("File: {}", input.display());
    println!("Source: {}", properties.source);
    println!("Version: {}", properties.version);
    if let Some(created) = &properties.created {
        println!("Created: {}", created);
    }
    println!("Sheets: {}", workbook.sheet_count());

    for (i, sheet) in workbook.sheets().enumerate() {
        let extent = sheet.extent();
        println!();
        println!("  Sheet {}: \"{}\"", i, sheet.name());
        if extent.is_empty() {
            println!("    Grid: empty");
        } else {
            println!(
                "    Grid: {} rows x {} columns (header included)",
                extent.rows, extent.cols
            );
        }
        println!("    Formulas: {}", sheet.formula_count());
        println!("    Formatted cells: {}", sheet.format_count());
    }

    if let Some(guidance) = workbook.guidance() {
        println!();
        println!("Guidance: {} characters", guidance.chars().count());
    }

    Ok(())
}

fn list_sheets(input: &Path) -> Result<()> {
    let workbook = open(input)?;

    for (i, sheet) in workbook.sheets().enumerate() {
        println!("{}\t{}", i, sheet.name());
    }

    Ok(())
}

fn normalize(input: &Path, output: Option<&Path>) -> Result<()> {
    let workbook = open(input)?;
    let text = encode(&workbook).context("Failed to encode the workbook")?;

    if let Some(output_path) = output {
        std::fs::write(output_path, &text)
            .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
        eprintln!(
            "Wrote {} sheets to '{}'",
            workbook.sheet_count(),
            output_path.display()
        );
    } else {
        io::stdout()
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
    }

    Ok(())
}

/// Find a sheet by exact name, else by 0-based index
fn select_sheet<'a>(workbook: &'a Workbook, selector: &str) -> Result<&'a Sheet> {
    if let Some(sheet) = workbook.sheet_by_name(selector) {
        return Ok(sheet);
    }
    match selector.parse::<usize>() {
        Ok(index) => workbook
            .sheet(index)
            .with_context(|| format!("Sheet index {} not found", index)),
        Err(_) => bail!("Sheet '{}' not found", selector),
    }
}

fn to_csv(
    input: &Path,
    output: Option<&Path>,
    selector: &str,
    delimiter: char,
    crlf: bool,
) -> Result<()> {
    let workbook = open(input)?;
    let sheet = select_sheet(&workbook, selector)?;

    if !delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character");
    }
    let options = CsvWriteOptions {
        delimiter: delimiter as u8,
        line_terminator: if crlf {
            LineTerminator::CRLF
        } else {
            LineTerminator::LF
        },
        ..Default::default()
    };

    if sheet.headers().is_empty() {
        eprintln!("Warning: Sheet appears to be empty");
        return Ok(());
    }

    if let Some(output_path) = output {
        CsvWriter::write_file(sheet, output_path, &options)
            .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
        eprintln!(
            "Wrote {} rows to '{}'",
            sheet.row_count() + 1,
            output_path.display()
        );
    } else {
        let text = CsvWriter::write_string(sheet, &options).context("Failed to render CSV")?;
        io::stdout()
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
    }

    Ok(())
}
