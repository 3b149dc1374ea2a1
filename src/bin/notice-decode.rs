//! Offline decoder for stored notices.
//!
//! Prints a JSON summary per record. With `--output`, the decoded skymap of
//! each record is written to the matching output file (usually FITS).

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use serde_json::{json, Value};
use thiserror::Error;

use lo2t::config::{MessageFormat, ObservabilityConfig};
use lo2t::notice::{DecodeError, HandlerTable, Notice, RawMessage};
use lo2t::observability::init_logging;

#[derive(Parser)]
#[command(name = "notice-decode")]
#[command(about = "Decode stored GCN notices and print their fields", long_about = None)]
struct Cli {
    /// Payload format of the records
    #[arg(short, long, value_parser = parse_format)]
    format: Option<MessageFormat>,

    /// Topic to attribute the records to
    #[arg(long, default_value = "file")]
    topic: String,

    /// Verbosity level, repeat to increase verbosity
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Skymap output files, one per record
    #[arg(short, long, num_args = 1..)]
    output: Vec<PathBuf>,

    /// Records to decode
    #[arg(short, long = "record", num_args = 1.., required = true)]
    records: Vec<PathBuf>,
}

#[derive(Debug, Error)]
enum RecordError {
    #[error("cannot read record: {0}")]
    Read(#[source] std::io::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("notice carries no skymap")]
    NoSkymap,

    #[error("cannot write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn parse_format(s: &str) -> Result<MessageFormat, String> {
    s.parse()
}

/// Pair every record with its output file, if outputs were requested.
fn pair_outputs(
    records: &[PathBuf],
    outputs: &[PathBuf],
) -> Result<Vec<(PathBuf, Option<PathBuf>)>, String> {
    if outputs.is_empty() {
        return Ok(records.iter().map(|r| (r.clone(), None)).collect());
    }
    if outputs.len() != records.len() {
        return Err(format!(
            "{} records but {} output files; the counts must be equal",
            records.len(),
            outputs.len()
        ));
    }
    Ok(records
        .iter()
        .cloned()
        .zip(outputs.iter().cloned().map(Some))
        .collect())
}

fn write_skymap(notice: &Notice, path: &Path) -> Result<usize, RecordError> {
    let skymap = notice.skymap.as_deref().ok_or(RecordError::NoSkymap)?;
    fs::write(path, skymap).map_err(|source| RecordError::Write {
        path: path.display().to_string(),
        source,
    })?;
    Ok(skymap.len())
}

/// Decode one record and optionally write its skymap.
fn decode_record(
    handlers: &HandlerTable,
    format: Option<MessageFormat>,
    topic: &str,
    record: &Path,
    output: Option<&Path>,
) -> Result<Value, RecordError> {
    let payload = fs::read(record).map_err(RecordError::Read)?;
    let format = format.unwrap_or_else(|| MessageFormat::sniff(&payload));
    let notice = handlers.decode(format, &RawMessage::new(topic, payload))?;

    let mut summary = json!({
        "file": record.display().to_string(),
        "notice": notice,
        "skymap_bytes": notice.skymap.as_ref().map(Vec::len),
    });
    if let Some(path) = output {
        write_skymap(&notice, path)?;
        summary["skymap_file"] = json!(path.display().to_string());
    }
    Ok(summary)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut observability = ObservabilityConfig::default();
    observability.log_level = "warn".to_string();
    if let Err(e) = init_logging(&observability, cli.verbose) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let jobs = match pair_outputs(&cli.records, &cli.output) {
        Ok(jobs) => jobs,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let handlers = HandlerTable::default();
    let mut failed = false;

    for (record, output) in &jobs {
        let decoded = decode_record(&handlers, cli.format, &cli.topic, record, output.as_deref());
        let summary = match decoded {
            Ok(summary) => summary,
            Err(e) => {
                failed = true;
                json!({
                    "file": record.display().to_string(),
                    "error": e.to_string(),
                })
            }
        };
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("{}: {}", record.display(), e),
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
