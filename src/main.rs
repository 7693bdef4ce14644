//! Command-line front end: parses a statement page dump, reports reconciliation
//! and optionally computes capital gains.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cas_parser::export::{write_112a_csv, write_csv, write_gains_csv, write_json, write_text};
use cas_parser::{
    FinancialYear, GainsConfig, GainsError, PageDumpExtractor, ParseError, StatementDocument,
    classify_and_parse, compute_all_gains, validate,
};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Json,
    Text,
}

#[derive(Parser, Debug)]
#[command(name = "casparse", version, about = "Parse a Consolidated Account Statement")]
struct Cli {
    /// Page dump of the statement.
    file: PathBuf,

    /// Statement password.
    #[arg(short = 'p', long = "password", default_value = "")]
    password: String,

    /// Output file (stdout when absent).
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Output format; inferred from the output extension when absent.
    #[arg(short = 'f', long = "format", value_enum)]
    format: Option<Format>,

    /// Print the reconciliation summary.
    #[arg(short = 's', long = "summary")]
    summary: bool,

    /// Print every reconciliation mismatch.
    #[arg(short = 'a', long = "all")]
    all: bool,

    /// Compute capital gains.
    #[arg(short = 'g', long = "gains")]
    gains: bool,

    /// Financial year for gains, e.g. FY2020-21.
    #[arg(long = "fy")]
    fy: Option<String>,

    /// Write the schedule 112A CSV for this financial year.
    #[arg(long = "gains-112a")]
    gains_112a: Option<String>,

    /// CSV of `isin,nav` fair values at the grandfathering cutoff.
    #[arg(long = "fair-values")]
    fair_values: Option<PathBuf>,
}

enum Failure {
    Parse(ParseError),
    Gains(GainsError),
}

impl From<ParseError> for Failure {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<GainsError> for Failure {
    fn from(err: GainsError) -> Self {
        Self::Gains(err)
    }
}

impl From<io::Error> for Failure {
    fn from(err: io::Error) -> Self {
        Self::Parse(ParseError::Io(err))
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Gains(GainsError::IncompleteCas)) => {
            eprintln!("CAS is incomplete!");
            ExitCode::from(2)
        }
        Err(Failure::Gains(err)) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
        Err(Failure::Parse(err)) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> Result<(), Failure> {
    let bytes = std::fs::read(&cli.file)?;
    let document = classify_and_parse(&PageDumpExtractor, &bytes, &cli.password)?;

    if cli.summary || cli.all {
        let summary = validate(&document);
        println!("{summary}");
        if cli.all {
            for mismatch in &summary.mismatches {
                println!("  {mismatch}");
            }
        }
    }

    let format = cli
        .format
        .or_else(|| cli.output.as_deref().and_then(format_from_extension))
        .unwrap_or(Format::Json);
    match &cli.output {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            write_document(writer, &document, format)?;
            println!("File saved : {}", path.display());
        }
        None => write_document(io::stdout().lock(), &document, format)?,
    }

    if cli.gains || cli.gains_112a.is_some() {
        write_gains(cli, &document)?;
    }
    Ok(())
}

fn format_from_extension(path: &Path) -> Option<Format> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "csv" => Some(Format::Csv),
        "json" => Some(Format::Json),
        "txt" | "text" => Some(Format::Text),
        _ => None,
    }
}

fn write_document<W: Write>(
    mut writer: W,
    document: &StatementDocument,
    format: Format,
) -> Result<(), ParseError> {
    match format {
        Format::Csv => write_csv(&mut writer, document)?,
        Format::Json => write_json(&mut writer, document)?,
        Format::Text => write_text(&mut writer, document)?,
    }
    writer.flush()?;
    Ok(())
}

fn write_gains(cli: &Cli, document: &StatementDocument) -> Result<(), Failure> {
    let mut config = GainsConfig::default();
    if let Some(path) = &cli.fair_values {
        config.load_fair_values(File::open(path)?)?;
    }

    let year = match cli.gains_112a.as_deref().or(cli.fy.as_deref()) {
        Some(label) => config.financial_year(label)?,
        None => {
            let end = document
                .statement_period
                .map(|period| period.to)
                .ok_or_else(|| GainsError::FinancialYear(String::new()))?;
            FinancialYear::containing(end, config.fy_start_month)?
        }
    };

    let reports = compute_all_gains(document, &year, &config)?;
    // Gains files sit next to the output, or next to the input without one.
    let base = cli.output.as_deref().unwrap_or(cli.file.as_path());
    let gains_path = sibling(base, &format!("gains-{}", year.label));
    write_gains_csv(BufWriter::new(File::create(&gains_path)?), &reports)?;
    println!("File saved : {}", gains_path.display());

    for report in &reports {
        println!(
            "{} / {}: LTCG {} STCG {}",
            report.folio,
            report.scheme,
            report.long_term_gain().round_dp(2),
            report.short_term_gain().round_dp(2)
        );
    }

    if cli.gains_112a.is_some() {
        let rows: Vec<_> = reports
            .iter()
            .flat_map(|report| report.schedule_112a(config.grandfather_cutoff))
            .collect();
        let path = sibling(base, &format!("112a-{}", year.label));
        write_112a_csv(BufWriter::new(File::create(&path)?), &rows)?;
        println!("File saved : {}", path.display());
    }
    Ok(())
}

/// `dir/stem.ext` becomes `dir/stem-{suffix}.csv`.
fn sibling(base: &Path, suffix: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("statement");
    base.with_file_name(format!("{stem}-{suffix}.csv"))
}
