//! Command line handling for the `contentforge` binary.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::info;

use contentforge_core::{
    limit_topics, BatchPipeline, BatchReport, ConcurrencyLimit, Config, RunOptions, TopicFile,
    TopicSource,
};

pub const USAGE: &str = "\
Usage:
  contentforge [serve]
  contentforge batch <topics.csv|topics.xlsx> [--column NAME] [--publish] [--concurrency N]

Environment:
  CONTENTFORGE_CONFIG   configuration file (default: config.toml)
  RUST_LOG              log filter (default: info,tower_http=debug)";

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Serve,
    Batch(BatchArgs),
    Help,
}

/// Arguments of a headless batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchArgs {
    pub file: PathBuf,
    /// Column holding the topics; the configured default when absent.
    pub column: Option<String>,
    pub publish: bool,
    pub concurrency: Option<i64>,
}

/// Parse arguments, excluding the program name.
pub fn parse_args<I, S>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);

    let command = match args.next() {
        None => return Ok(Command::Serve),
        Some(c) => c,
    };

    match command.as_str() {
        "serve" => match args.next() {
            None => Ok(Command::Serve),
            Some(extra) => bail!("unexpected argument for serve: {}", extra),
        },
        "help" | "-h" | "--help" => Ok(Command::Help),
        "batch" => parse_batch_args(args),
        other => bail!("unknown command: {}", other),
    }
}

fn parse_batch_args(mut args: impl Iterator<Item = String>) -> Result<Command> {
    let mut file = None;
    let mut column = None;
    let mut publish = false;
    let mut concurrency = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--publish" => publish = true,
            "--column" => {
                column = Some(args.next().context("--column requires a value")?);
            }
            "--concurrency" => {
                let value = args.next().context("--concurrency requires a value")?;
                let n: i64 = value
                    .parse()
                    .with_context(|| format!("invalid --concurrency value: {}", value))?;
                concurrency = Some(n);
            }
            flag if flag.starts_with("--") => bail!("unknown option: {}", flag),
            path => {
                if file.is_some() {
                    bail!("only one topic file may be given");
                }
                file = Some(PathBuf::from(path));
            }
        }
    }

    let file = file.context("batch requires a topic file")?;
    Ok(Command::Batch(BatchArgs {
        file,
        column,
        publish,
        concurrency,
    }))
}

/// Run one batch from a CSV or Excel file and print the summary.
pub async fn run_batch(
    config: &Config,
    pipeline: &BatchPipeline,
    args: BatchArgs,
) -> Result<BatchReport> {
    let mut options = RunOptions::default().with_publish(args.publish);
    if let Some(n) = args.concurrency {
        options = options.with_concurrency(ConcurrencyLimit::new(n)?);
    }

    let column = args
        .column
        .unwrap_or_else(|| config.uploads.default_column.clone());
    let source = TopicFile::new(&args.file, column);
    let topics = source
        .load()
        .with_context(|| format!("Failed to read topics from {}", args.file.display()))?;
    let topics = limit_topics(topics, config.pipeline.max_topics);
    info!(count = topics.len(), file = %args.file.display(), "Loaded topics");

    let report = pipeline.run(topics, options).await?;
    println!("{}", format_summary(&report));
    Ok(report)
}

/// One line per topic, then the totals.
pub fn format_summary(report: &BatchReport) -> String {
    let mut out = String::new();

    for outcome in &report.outcomes {
        if outcome.is_success() {
            let mut detail = format!("{} words, stored", outcome.word_count.unwrap_or(0));
            if outcome.published {
                detail.push_str(", published");
            } else if let Some(ref e) = outcome.publish_error {
                let _ = write!(detail, ", publish failed: {}", e);
            }
            let _ = writeln!(
                out,
                "[ok]     {}: \"{}\" ({})",
                outcome.topic,
                outcome.title.as_deref().unwrap_or_default(),
                detail
            );
        } else {
            let _ = writeln!(
                out,
                "[failed] {}: {}",
                outcome.topic,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    let _ = write!(
        out,
        "Processed {} topics in {:.2}s: {} succeeded, {} failed, {} published",
        report.total,
        report.duration_ms as f64 / 1000.0,
        report.succeeded,
        report.failed,
        report.published
    );
    out
}
