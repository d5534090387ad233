use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use pruner_core::{
    run_prune, Action, ActionMode, ClassifierKind, PruneOptions, RunSummary, WriterSink,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Conventional status for a run stopped by SIGINT.
const INTERRUPTED_EXIT_CODE: u8 = 130;

#[derive(Debug, Parser)]
#[command(
    name = "pruner",
    version,
    about = "Expand tabs and strip trailing whitespace from text files, or list the files that need it."
)]
struct Cli {
    /// Print the names of any files containing undesired whitespace instead of fixing them.
    #[arg(short = 'D', long)]
    detect: bool,

    /// Print warnings normally suppressed (such as about ignored files or directories).
    #[arg(short, long)]
    verbose: bool,

    /// Skip paths matching this glob, or containing this word (repeatable).
    #[arg(long = "exclude", value_name = "GLOB", action = ArgAction::Append)]
    exclude: Vec<String>,

    /// How to decide whether a file is text.
    #[arg(long, default_value = "extension")]
    classifier: CliClassifierKind,

    /// Optional JSON run summary output file.
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Files and directories to process.
    #[arg(value_name = "INPUT_FILE_OR_DIR", required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum CliClassifierKind {
    Extension,
    #[value(alias = "sniff")]
    Content,
}

impl From<CliClassifierKind> for ClassifierKind {
    fn from(value: CliClassifierKind) -> Self {
        match value {
            CliClassifierKind::Extension => ClassifierKind::Extension,
            CliClassifierKind::Content => ClassifierKind::Content,
        }
    }
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let interrupted = Arc::new(AtomicBool::new(false));
    let handler_flag = interrupted.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("failed to set Ctrl+C handler")?;

    let summary = run_cli(cli, interrupted)?;
    if summary.cancelled {
        warn!(
            visited = summary.files_visited,
            fixed = summary.fixed_files,
            "interrupted; stopped after the file in progress"
        );
        return Ok(ExitCode::from(INTERRUPTED_EXIT_CODE));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_cli(cli: Cli, cancel_flag: Arc<AtomicBool>) -> Result<RunSummary> {
    let Cli {
        detect,
        verbose,
        exclude,
        classifier,
        report,
        inputs,
    } = cli;

    let mode = if detect {
        ActionMode::Report
    } else {
        ActionMode::Fix
    };
    let options = PruneOptions {
        paths: inputs,
        action: Action::new(mode, verbose),
        classifier: classifier.into(),
        excludes: exclude,
        cancel_flag: Some(cancel_flag),
    };

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut sink = WriterSink::new(stdout.lock(), stderr.lock());
    let summary = run_prune(&options, &mut sink).context("whitespace pruning aborted")?;
    drop(sink);

    if let Some(output) = report {
        write_summary(&summary, &output)?;
    }

    Ok(summary)
}

fn write_summary(summary: &RunSummary, output: &Path) -> Result<()> {
    let payload =
        serde_json::to_string_pretty(summary).context("failed to serialize run summary")?;
    fs::write(output, payload)
        .with_context(|| format!("failed to write run summary to {}", output.display()))?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
