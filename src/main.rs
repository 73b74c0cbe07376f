use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use resettle::batch::{BatchEntry, BatchSummary, batch_detect, filter_resettled};
use resettle::csv::{OutputError, write_batch_summary};
use resettle::json::{InputError, read_input};
use resettle::{Locale, detect_value, render_full, render_short};

/// Detect resettled bets in transaction logs and ticket details
#[derive(Debug, Parser)]
#[command(name = "resettle", version)]
struct Args {
    /// JSON input file, `-` for stdin
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Report language: zh or en
    #[arg(long, default_value = "zh")]
    locale: Locale,

    #[arg(long, value_enum, default_value_t = Format::Full)]
    format: Format,

    /// Treat the top-level array as independent inputs
    #[arg(long)]
    batch: bool,

    /// Batch mode: only report resettled entries
    #[arg(long, requires = "batch")]
    only_resettled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Multi-section report
    Full,
    /// One-line summary
    Short,
    /// Detection result as JSON
    Json,
    /// index,has_resettlement,method,count
    Csv,
}

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("failed to encode json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), RunError> {
    let input = read_input(&args.input)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if !args.batch {
        let result = detect_value(&input);
        if let Some(reason) = &result.error {
            warn!(path = %args.input.display(), reason = %reason, "input rejected");
        }
        match args.format {
            Format::Full => writeln!(out, "{}", render_full(&result, args.locale))?,
            Format::Short => writeln!(out, "{}", render_short(&result))?,
            Format::Json => {
                serde_json::to_writer_pretty(&mut out, &result)?;
                writeln!(out)?;
            }
            Format::Csv => {
                let entry = BatchEntry {
                    index: 0,
                    has_resettlement: result.is_resettlement,
                    data: input,
                    result,
                };
                write_batch_summary([&entry], &mut out)?;
            }
        }
        out.flush()?;
        return Ok(());
    }

    if !input.is_array() {
        warn!(path = %args.input.display(), "batch input is not an array, nothing to detect");
    }
    let entries = if args.only_resettled {
        filter_resettled(&input)
    } else {
        batch_detect(&input)
    };
    let summary = BatchSummary::of(&entries);
    info!(total = summary.total, resettled = summary.resettled, "batch detected");

    match args.format {
        Format::Full => {
            for (position, entry) in entries.iter().enumerate() {
                if position > 0 {
                    writeln!(out)?;
                }
                writeln!(out, "# {}", entry.index)?;
                writeln!(out, "{}", render_full(&entry.result, args.locale))?;
            }
        }
        Format::Short => {
            for entry in &entries {
                writeln!(out, "{}: {}", entry.index, render_short(&entry.result))?;
            }
        }
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, &entries)?;
            writeln!(out)?;
        }
        Format::Csv => write_batch_summary(&entries, &mut out)?,
    }

    out.flush()?;
    Ok(())
}
