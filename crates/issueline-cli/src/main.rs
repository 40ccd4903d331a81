#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "issueline",
    author,
    version,
    about = "issueline: point-in-time action timelines from issue changelogs",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Derive snapshot rows for issue files",
        long_about = "Replay each issue's changelog and comments and write one row per snapshot.",
        after_help = "EXAMPLES:\n    # JSON lines to stdout\n    issueline derive issues/*.json\n\n    # TSV to a file with an explicit end date\n    issueline derive --format tsv --output rows.tsv --end-date 2024-01-01T00:00:00Z issues/*.json"
    )]
    Derive(cmd::derive::DeriveArgs),

    #[command(
        about = "Validate and print the resolved configuration",
        after_help = "EXAMPLES:\n    # Check the default config file\n    issueline check-config\n\n    # Emit machine-readable output\n    issueline check-config --config ci.toml --json"
    )]
    CheckConfig(cmd::check_config::CheckConfigArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("ISSUELINE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "issueline=debug,issueline_core=debug,info"
        } else {
            "issueline=info,issueline_core=info,warn"
        })
    });

    let format = env::var("ISSUELINE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    // Logs share stderr with the run summary; stdout carries rows only.
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        debug!("Verbose mode enabled");
    }

    let output = cli.output_mode();
    match cli.command {
        Commands::Derive(ref args) => cmd::derive::run_derive(args, output),
        Commands::CheckConfig(ref args) => cmd::check_config::run_check_config(args, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmd::derive::RowFormat;
    use std::path::PathBuf;

    #[test]
    fn derive_defaults() {
        let cli = Cli::parse_from(["issueline", "derive", "a.json", "b.json"]);
        let Commands::Derive(args) = cli.command else {
            panic!("expected derive");
        };
        assert_eq!(args.issues, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
        assert_eq!(args.config, PathBuf::from("issueline.toml"));
        assert_eq!(args.format, RowFormat::Jsonl);
        assert!(args.output.is_none());
        assert!(args.jobs.is_none());
    }

    #[test]
    fn derive_requires_an_issue() {
        assert!(Cli::try_parse_from(["issueline", "derive"]).is_err());
    }

    #[test]
    fn derive_options_parse() {
        let cli = Cli::parse_from([
            "issueline",
            "derive",
            "--format",
            "tsv",
            "--output",
            "rows.tsv",
            "--end-date",
            "2024-01-01T00:00:00Z",
            "-j",
            "4",
            "issue.json",
        ]);
        let Commands::Derive(args) = cli.command else {
            panic!("expected derive");
        };
        assert_eq!(args.format, RowFormat::Tsv);
        assert_eq!(args.output, Some(PathBuf::from("rows.tsv")));
        assert_eq!(args.end_date.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(args.jobs.map(std::num::NonZeroUsize::get), Some(4));
    }

    #[test]
    fn json_flag_after_subcommand() {
        let cli = Cli::parse_from(["issueline", "check-config", "--json"]);
        assert!(cli.json);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn default_output_is_human() {
        let cli = Cli::parse_from(["issueline", "check-config"]);
        assert!(!cli.output_mode().is_json());
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["issueline", "derive", "--format", "xml", "a.json"]).is_err());
    }
}
