use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use rust_data_qc::aggregation::Aggregator;
use rust_data_qc::config::HeuristicConfig;
use rust_data_qc::execution::{ExecutionEngine, ExecutionOptions};
use rust_data_qc::ingestion::{
    ingest_sources, CompositeObserver, FileObserver, IngestionObserver, IngestionOptions, IngestionSeverity,
    Source, StdErrObserver, WalkOptions,
};
use rust_data_qc::report::{html, table, Report};

#[derive(Parser)]
#[command(
    name = "data-qc",
    version,
    about = "Flag anomalous files from their per-file plugin statistics",
    after_help = "Sources may be directories (walked for cache files), bundle files mapping \
                  filenames to documents, or manifests listing directories and cache files. \
                  Prefix manifest names with '@'."
)]
struct Cli {
    /// Directories, bundle files and/or @manifests to analyze
    #[arg(required = true, value_name = "SOURCE")]
    sources: Vec<String>,
    /// Maximum depth of recursion when scanning directories
    #[arg(long, short = 'd')]
    depth: Option<usize>,
    /// Only include files whose path matches this regular expression
    #[arg(long, short = 'I', value_name = "REGEX")]
    include: Option<String>,
    /// Skip files whose path matches this regular expression
    #[arg(long, short = 'E', value_name = "REGEX")]
    exclude: Option<String>,
    /// Heuristic configuration (JSON); replaces the defaults
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Html)]
    format: Format,
    /// Write the report here instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,
    /// Also write the flattened table as CSV
    #[arg(long, value_name = "CSV")]
    table: Option<PathBuf>,
    /// Worker threads for parsing and flattening files
    #[arg(long, short = 'j')]
    jobs: Option<NonZeroUsize>,
    /// Append ingestion events to this file
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,
    /// Stop at the first file that cannot be added
    #[arg(long)]
    fail_fast: bool,
    /// Log every added file to stderr
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Html,
    Json,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Bad patterns are reported before any directory is visited.
    let walk = WalkOptions {
        max_depth: cli.depth,
        ..WalkOptions::default()
    }
    .with_patterns(cli.include.as_deref(), cli.exclude.as_deref())?;

    let config = match &cli.config {
        Some(path) => HeuristicConfig::from_path(path)?,
        None => HeuristicConfig::default(),
    };

    let options = IngestionOptions {
        walk,
        fail_fast: cli.fail_fast,
        engine: cli.jobs.map(|n| {
            Arc::new(ExecutionEngine::new(ExecutionOptions {
                num_threads: Some(n.get()),
            }))
        }),
        observer: Some(observer(&cli)),
        alert_at_or_above: IngestionSeverity::Critical,
    };

    let sources: Vec<Source> = cli.sources.iter().map(|s| Source::parse(s)).collect();
    let mut aggregator = Aggregator::new(config);
    let summary = ingest_sources(&sources, &options, &mut aggregator)?;
    if cli.verbose {
        eprintln!(
            "[data-qc] added={} rejected={} columns={}",
            summary.added,
            summary.rejected.len(),
            aggregator.columns().len()
        );
    }

    let status = aggregator.analyze();

    if let Some(path) = &cli.table {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        table::write_csv(&aggregator, BufWriter::new(file))?;
    }

    let report = Report::from_aggregator(&aggregator).context("table was not analyzed")?;
    if cli.format == Format::Json || report.has_anomalies() {
        let mut out: Box<dyn Write> = match &cli.output {
            Some(path) => Box::new(BufWriter::new(
                File::create(path).with_context(|| format!("creating {}", path.display()))?,
            )),
            None => Box::new(BufWriter::new(io::stdout().lock())),
        };
        match cli.format {
            Format::Html => html::render(&report, &mut out)?,
            Format::Json => report.write_json(&mut out)?,
        }
        out.flush()?;
    } else {
        eprintln!("{status}");
    }

    Ok(())
}

fn observer(cli: &Cli) -> Arc<dyn IngestionObserver> {
    let stderr: Arc<dyn IngestionObserver> = Arc::new(StdErrObserver { verbose: cli.verbose });
    let Some(path) = &cli.log else {
        return stderr;
    };
    let file: Arc<dyn IngestionObserver> = Arc::new(FileObserver::new(path));
    Arc::new(CompositeObserver::new(vec![stderr, file]))
}
