//! storebench CLI.
//!
//! Usage:
//!   storebench run --engine sqlite                 # defaults: 10000 rows
//!   storebench run --engine duckdb --rows 50000 --sink duckdb_results.csv
//!   storebench engines                             # list compiled-in engines

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use storebench::config::EndpointConfig;
use storebench::resources::ResourceSampler;
use storebench::sink::CsvSink;
use storebench::{adapters, driver, report, DatasetFixture, HarnessResult, WorkloadParams};

#[derive(Parser, Debug)]
#[command(name = "storebench", about = "Cross-engine storage workload benchmark harness")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full workload against one engine.
    Run {
        /// Target engine (see `storebench engines`).
        #[arg(long)]
        engine: String,

        /// Fixture rows inserted during the load phase.
        #[arg(long, default_value_t = 10_000)]
        rows: usize,

        /// Sequential inserts for the Write-Intensive burst.
        #[arg(long, default_value_t = 1_000)]
        write_burst: usize,

        /// Disposable tagged rows for the Mixed operation.
        #[arg(long, default_value_t = 500)]
        mixed_rows: usize,

        /// Result CSV destination. Defaults to `{engine}_results.csv`,
        /// appended to across runs.
        #[arg(long)]
        sink: Option<PathBuf>,

        /// JSON endpoint configuration file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// CPU sampling interval in milliseconds.
        #[arg(long, default_value_t = 1_000)]
        sample_interval_ms: u64,
    },
    /// List compiled-in engines and their declared capabilities.
    Engines,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            engine,
            rows,
            write_burst,
            mixed_rows,
            sink,
            config,
            sample_interval_ms,
        } => match run(
            &engine,
            rows,
            write_burst,
            mixed_rows,
            sink,
            config,
            sample_interval_ms,
        ) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("error: {}", e);
                ExitCode::FAILURE
            }
        },
        Command::Engines => {
            report::print_capabilities(&adapters::capability_matrix());
            ExitCode::SUCCESS
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run(
    engine: &str,
    rows: usize,
    write_burst: usize,
    mixed_rows: usize,
    sink: Option<PathBuf>,
    config: Option<PathBuf>,
    sample_interval_ms: u64,
) -> HarnessResult<ExitCode> {
    let endpoints = match config {
        Some(path) => EndpointConfig::from_file(&path)?,
        None => EndpointConfig::default(),
    };

    let params = WorkloadParams {
        rows,
        write_burst,
        mixed_rows,
    };
    let fixture = DatasetFixture::default();
    let sampler = ResourceSampler::new(Duration::from_millis(sample_interval_ms));
    let sink = CsvSink::new(sink.unwrap_or_else(|| PathBuf::from(format!("{}_results.csv", engine))));

    // Scratch directory for embedded engines; lives until the run finishes.
    let scratch = tempfile::tempdir()?;
    let adapter = adapters::open(engine, &endpoints, scratch.path())?;

    let summary = driver::run(adapter, &fixture, &params, &sampler, &sink);
    report::print_summary(&summary);
    if summary.completed() {
        println!("Results logged to {}", sink.path().display());
    }

    Ok(if summary.exit_code() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
