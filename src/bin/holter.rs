//! Holter CLI - Command-line interface for WFDB Holter decoding
//!
//! Commands:
//! - info: Print record metadata from a `.hea` header
//! - convert: Decode a record and write CSV / JSON / NDJSON
//! - extract: Print one channel as `time_s,value` lines

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde::Serialize;
use wfdb_holter::export::{self, ExportFormat};
use wfdb_holter::{HolterParser, Metadata, HOLTER_VERSION};

/// Holter - Decode WFDB-style Holter ECG recordings
#[derive(Parser)]
#[command(name = "holter")]
#[command(version = HOLTER_VERSION)]
#[command(about = "Decode WFDB Holter recordings into calibrated samples", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print record metadata
    Info {
        /// Header (.hea) file path
        #[arg(long)]
        header: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode a record and write all channels
    Convert {
        /// Header (.hea) file path
        #[arg(long)]
        header: PathBuf,

        /// Sample (.dat) file path; defaults to the file named in the header
        #[arg(long)]
        data: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "csv")]
        format: OutputFormat,

        /// Reject channels with zero or non-finite gain
        #[arg(long)]
        strict_gain: bool,
    },

    /// Print a single channel as time/value pairs
    Extract {
        /// Header (.hea) file path
        #[arg(long)]
        header: PathBuf,

        /// Sample (.dat) file path; defaults to the file named in the header
        #[arg(long)]
        data: Option<PathBuf>,

        /// Zero-based channel index
        #[arg(short, long)]
        channel: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One row per frame, one column per channel
    Csv,
    /// Full record as a JSON document
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// One JSON object per frame
    Ndjson,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => ExportFormat::Csv,
            OutputFormat::Json => ExportFormat::Json,
            OutputFormat::JsonPretty => ExportFormat::JsonPretty,
            OutputFormat::Ndjson => ExportFormat::Ndjson,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: Cli) -> Result<(), HolterCliError> {
    match cli.command {
        Commands::Info { header, json } => cmd_info(&header, json),
        Commands::Convert {
            header,
            data,
            output,
            format,
            strict_gain,
        } => cmd_convert(&header, data.as_deref(), &output, format, strict_gain),
        Commands::Extract {
            header,
            data,
            channel,
        } => cmd_extract(&header, data.as_deref(), channel),
    }
}

fn cmd_info(header: &Path, json: bool) -> Result<(), HolterCliError> {
    let header_text = fs::read_to_string(header)?;
    let metadata = wfdb_holter::parse_header(&header_text).map_err(wfdb_holter::HolterError::from)?;

    if json {
        // Pretty output for humans, compact when piped
        let out = if atty::is(atty::Stream::Stdout) {
            serde_json::to_string_pretty(&metadata)?
        } else {
            serde_json::to_string(&metadata)?
        };
        println!("{}", out);
        return Ok(());
    }

    println!("Record:      {}", metadata.record_name);
    println!("Signals:     {}", metadata.num_signals);
    println!("Sample rate: {} Hz", metadata.sample_rate);
    println!("Samples:     {}", metadata.num_samples);
    println!("Start:       {}", metadata.initial_date);
    println!("Duration:    {} s", metadata.duration().num_milliseconds() as f64 / 1000.0);
    println!("Data bytes:  {}", metadata.required_bytes());
    println!("\nChannels:");
    for (i, signal) in metadata.signals.iter().enumerate() {
        println!(
            "  [{}] {} fmt={} gain={} baseline={} units={}",
            i, signal.filename, signal.format, signal.gain, signal.baseline, signal.units
        );
    }
    if metadata.signals.len() != metadata.num_signals {
        println!(
            "\nWarning: header declares {} signals but lists {}",
            metadata.num_signals,
            metadata.signals.len()
        );
    }

    Ok(())
}

fn cmd_convert(
    header: &Path,
    data: Option<&Path>,
    output: &Path,
    format: OutputFormat,
    strict_gain: bool,
) -> Result<(), HolterCliError> {
    let parser = HolterParser::new().with_strict_gain(strict_gain);
    let holter = load_record(&parser, header, data)?;

    if output.to_string_lossy() == "-" {
        let stdout = io::stdout();
        let mut writer = BufWriter::new(stdout.lock());
        export::export(&holter, format.into(), &mut writer)?;
    } else {
        let mut writer = BufWriter::new(fs::File::create(output)?);
        export::export(&holter, format.into(), &mut writer)?;
        writer.flush()?;
        eprintln!(
            "Wrote {} samples x {} channels to {}",
            holter.metadata.num_samples,
            holter.samples.len(),
            output.display()
        );
    }

    Ok(())
}

fn cmd_extract(header: &Path, data: Option<&Path>, channel: usize) -> Result<(), HolterCliError> {
    let holter = load_record(&HolterParser::new(), header, data)?;

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    writeln!(writer, "# Channel {} of {}", channel, holter.metadata.record_name)?;
    writeln!(writer, "# Time (s), Value")?;
    export::write_channel(&holter, channel, &mut writer)?;

    Ok(())
}

// Helper functions

fn load_record(
    parser: &HolterParser,
    header: &Path,
    data: Option<&Path>,
) -> Result<wfdb_holter::HolterData, HolterCliError> {
    let header_text = fs::read_to_string(header)?;
    let metadata = wfdb_holter::parse_header(&header_text).map_err(wfdb_holter::HolterError::from)?;

    let data_path = match data {
        Some(path) => path.to_path_buf(),
        None => resolve_data_path(header, &metadata)?,
    };
    log::debug!("Reading samples from {}", data_path.display());

    let buffer = fs::read(&data_path)?;
    Ok(parser.decode(&buffer, metadata)?)
}

/// The `.dat` file named by the first signal line, relative to the header
fn resolve_data_path(header: &Path, metadata: &Metadata) -> Result<PathBuf, HolterCliError> {
    let signal = metadata.signals.first().ok_or(HolterCliError::NoDataFile)?;
    let dir = header.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(&signal.filename))
}

// Error types

#[derive(Debug)]
enum HolterCliError {
    Io(io::Error),
    Parse(wfdb_holter::HolterError),
    Export(wfdb_holter::ExportError),
    Json(serde_json::Error),
    NoDataFile,
}

impl From<io::Error> for HolterCliError {
    fn from(e: io::Error) -> Self {
        HolterCliError::Io(e)
    }
}

impl From<wfdb_holter::HolterError> for HolterCliError {
    fn from(e: wfdb_holter::HolterError) -> Self {
        HolterCliError::Parse(e)
    }
}

impl From<wfdb_holter::ExportError> for HolterCliError {
    fn from(e: wfdb_holter::ExportError) -> Self {
        HolterCliError::Export(e)
    }
}

impl From<serde_json::Error> for HolterCliError {
    fn from(e: serde_json::Error) -> Self {
        HolterCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    stage: Option<String>,
    hint: Option<String>,
}

impl From<HolterCliError> for CliError {
    fn from(e: HolterCliError) -> Self {
        match e {
            HolterCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                stage: None,
                hint: Some("Check file paths and permissions".to_string()),
            },
            HolterCliError::Parse(e) => {
                let (code, hint) = match e.kind() {
                    wfdb_holter::ErrorKind::HeaderFormat => {
                        ("HEADER_FORMAT", "Check the record and signal lines of the .hea file")
                    }
                    wfdb_holter::ErrorKind::InsufficientData => {
                        ("INSUFFICIENT_DATA", "The .dat file is truncated or belongs to another record")
                    }
                    wfdb_holter::ErrorKind::MetadataMismatch => {
                        ("METADATA_MISMATCH", "The header lists fewer signal lines than it declares")
                    }
                    wfdb_holter::ErrorKind::InvalidGain => {
                        ("INVALID_GAIN", "Fix the channel gain or rerun without --strict-gain")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    stage: Some(e.stage().as_str().to_string()),
                    hint: Some(hint.to_string()),
                }
            }
            HolterCliError::Export(e) => CliError {
                code: "EXPORT_ERROR".to_string(),
                message: e.to_string(),
                stage: None,
                hint: None,
            },
            HolterCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                stage: None,
                hint: None,
            },
            HolterCliError::NoDataFile => CliError {
                code: "NO_DATA_FILE".to_string(),
                message: "Header has no signal lines to name a data file".to_string(),
                stage: None,
                hint: Some("Pass --data explicitly".to_string()),
            },
        }
    }
}
