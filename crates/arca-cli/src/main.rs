//! # arca CLI entry point
//!
//! Parses arguments, initializes tracing, wires Ctrl-C to cancellation and
//! hands off to [`arca_cli::sync::run`].

use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use arca_cli::config::RunArgs;
use arca_cli::output::Reporter;

/// Host content from Ace Archive on the IPFS network.
///
/// To pin content with an IPFS pinning service, pass `--pin-endpoint` and
/// `--pin-token`. To upload content to the archival service, pass
/// `--w3s-token`; the IPFS node at `--ipfs-api` supplies the archives.
/// Both destinations may be used in one run.
#[derive(Parser, Debug)]
#[command(name = "arca", version, about)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log line format on stderr.
    #[arg(long, value_enum, env = "ARCA_LOG_FORMAT", default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(verbose: u8, format: LogFormat) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    tracing::debug!(args = ?cli.run, "arca starting");

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling run");
            interrupt.cancel();
        }
    });

    let reporter = Reporter::new(cli.run.output, cli.run.action);
    match arca_cli::sync::run(&cli.run, &reporter, cancel).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            reporter.error(&format!("{e:#}"));
            ExitCode::from(1)
        }
    }
}
