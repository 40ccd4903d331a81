use anyhow::{Context as _, Result, anyhow, bail};
use clap::{Args, ValueEnum};
use issueline_core::collab::PayloadCollaborators;
use issueline_core::config::TimelineConfig;
use issueline_core::model::Issue;
use issueline_core::model::issue::IssueParseError;
use issueline_core::row::ActionRow;
use issueline_core::timeline::derive_timeline;
use issueline_core::{ErrorCode, TimelineError};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{error, info};

use crate::cmd::load_effective_config;
use crate::output::{OutputMode, pretty_kv, render};

#[derive(Args, Debug)]
pub struct DeriveArgs {
    /// Issue JSON files (tracker REST payload with changelog).
    #[arg(value_name = "ISSUE", required = true)]
    pub issues: Vec<PathBuf>,

    /// Config file.
    #[arg(short, long, value_name = "PATH", default_value = "issueline.toml")]
    pub config: PathBuf,

    /// Override the as-of end date (beats config file and ISSUELINE_END_DATE).
    #[arg(long, value_name = "TIMESTAMP")]
    pub end_date: Option<String>,

    /// Row format.
    #[arg(long, value_enum, default_value_t = RowFormat::Jsonl)]
    pub format: RowFormat,

    /// Output path (defaults to stdout).
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Worker threads (defaults to available parallelism).
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<NonZeroUsize>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum RowFormat {
    /// One JSON object per snapshot.
    Jsonl,
    /// Tab-separated with a header line.
    Tsv,
}

/// Per-run totals, printed to stderr so they never mix with rows.
#[derive(Debug, Serialize)]
struct DeriveSummary {
    issues: usize,
    failed: usize,
    rows: usize,
    failures: Vec<IssueFailure>,
}

#[derive(Debug, Serialize)]
struct IssueFailure {
    path: String,
    code: &'static str,
    message: String,
}

type IssueResult = Result<Vec<ActionRow>>;

pub fn run_derive(args: &DeriveArgs, output: OutputMode) -> Result<()> {
    let config = load_effective_config(&args.config, args.end_date.as_deref())?;
    let jobs = args
        .jobs
        .or_else(|| thread::available_parallelism().ok())
        .map_or(1, NonZeroUsize::get);

    info!(
        issues = args.issues.len(),
        jobs,
        end_date = %config.end_date,
        "deriving timelines"
    );
    let results = derive_all(&args.issues, &config, jobs)?;

    let mut out: Box<dyn Write> = match args.output.as_ref() {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create output file {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let mut summary = DeriveSummary {
        issues: args.issues.len(),
        failed: 0,
        rows: 0,
        failures: Vec::new(),
    };
    let mut header_written = false;

    for (path, result) in args.issues.iter().zip(results) {
        match result {
            Ok(rows) => {
                write_rows(&mut *out, args.format, &rows, &mut header_written)?;
                summary.rows += rows.len();
            }
            Err(err) => {
                let code = error_code(&err);
                error!(path = %path.display(), code = code.code(), "{err:#}");
                summary.failed += 1;
                summary.failures.push(IssueFailure {
                    path: path.display().to_string(),
                    code: code.code(),
                    message: format!("{err:#}"),
                });
            }
        }
    }
    out.flush().context("failed to flush rows")?;
    drop(out);

    info!(rows = summary.rows, failed = summary.failed, "derive finished");
    render(&mut io::stderr().lock(), output, &summary, render_summary)?;

    if summary.failed > 0 {
        bail!("{} of {} issues failed", summary.failed, summary.issues);
    }
    Ok(())
}

fn render_summary(summary: &DeriveSummary, w: &mut dyn Write) -> io::Result<()> {
    pretty_kv(w, "issues", summary.issues.to_string())?;
    pretty_kv(w, "rows", summary.rows.to_string())?;
    pretty_kv(w, "failed", summary.failed.to_string())?;
    for failure in &summary.failures {
        writeln!(w, "  {} [{}] {}", failure.path, failure.code, failure.message)?;
    }
    Ok(())
}

/// Derive every issue, `jobs` workers at a time. Results keep input order.
fn derive_all(paths: &[PathBuf], config: &TimelineConfig, jobs: usize) -> Result<Vec<IssueResult>> {
    if paths.is_empty() {
        return Ok(Vec::new());
    }
    let chunk_size = paths.len().div_ceil(jobs.max(1));

    thread::scope(|scope| {
        let handles: Vec<_> = paths
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|path| derive_file(path, config))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut results = Vec::with_capacity(paths.len());
        for handle in handles {
            let chunk = handle
                .join()
                .map_err(|_| anyhow!("derive worker panicked"))?;
            results.extend(chunk);
        }
        Ok(results)
    })
}

fn derive_file(path: &Path, config: &TimelineConfig) -> IssueResult {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let issue = Issue::from_json(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let collab = PayloadCollaborators::for_issue(&issue);
    let actions = derive_timeline(&issue, config, collab.as_collaborators())
        .with_context(|| format!("failed to derive timeline for {}", issue.key))?;
    Ok(actions.iter().map(ActionRow::from).collect())
}

fn error_code(err: &anyhow::Error) -> ErrorCode {
    if let Some(timeline) = err.downcast_ref::<TimelineError>() {
        timeline.code()
    } else if let Some(parse) = err.downcast_ref::<IssueParseError>() {
        parse.code()
    } else {
        ErrorCode::InternalUnexpected
    }
}

fn write_rows(
    out: &mut dyn Write,
    format: RowFormat,
    rows: &[ActionRow],
    header_written: &mut bool,
) -> Result<()> {
    for row in rows {
        match format {
            RowFormat::Jsonl => {
                writeln!(out, "{}", serde_json::to_string(row)?)?;
            }
            RowFormat::Tsv => {
                if !*header_written {
                    writeln!(out, "{}", row.tsv_header())?;
                    *header_written = true;
                }
                writeln!(out, "{}", row.tsv_line())?;
            }
        }
    }
    Ok(())
}
