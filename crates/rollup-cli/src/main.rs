use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rollup_fs::write_result_file;
use rollup_model::{aggregate_csv, write_summary_csv, GroupSummary, Rollup, RollupStats};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Total a sales CSV per department")]
struct Args {
    /// Input CSV; the first row must name a department and a sales column.
    #[arg(long, short)]
    input: PathBuf,

    /// Write the result CSV here instead of stdout; an existing file is replaced only on success.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Print summaries and row statistics as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    departments: &'a [GroupSummary],
    total_sales: i128,
    stats: &'a RollupStats,
}

fn init_logging() {
    // Skipped-row warnings go to stderr so stdout stays a clean CSV.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let file = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let mut rollup: Rollup = aggregate_csv(BufReader::new(file))
        .with_context(|| format!("failed to aggregate {}", args.input.display()))?;
    // Stable output for diffs; the aggregation itself is unordered.
    rollup.summaries.sort_by(|a, b| a.group.cmp(&b.group));

    if args.json {
        let report = JsonReport {
            departments: &rollup.summaries,
            total_sales: rollup.total(),
            stats: &rollup.stats,
        };
        let mut stdout = io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &report).context("failed to write JSON")?;
        writeln!(stdout)?;
        return Ok(());
    }

    match &args.output {
        Some(path) => {
            write_result_file(path, &rollup.summaries)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => write_summary_csv(io::stdout().lock(), &rollup.summaries)
            .context("failed to write result to stdout")?,
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    run(&args)
}
