//! `segfetch`: download one file over HTTP as concurrent byte ranges.

mod cli;
mod progress;
mod settings;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use segfetch::{ReqwestClient, TransferCoordinator, TransferOutcome, TransferRequest};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::progress::TransferBar;
use crate::settings::Settings;

/// Initialize tracing, as JSON when `LOG_FORMAT=json`.
fn init_tracing(default_filter: &str) {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.default_log_filter());

    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("download failed: {e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when some segments failed and nothing was written.
async fn run(cli: &Cli) -> anyhow::Result<bool> {
    let settings =
        Settings::load(cli.config.as_deref(), &cli.overrides()).context("loading settings")?;
    info!(?settings, "effective settings");

    let request = match &cli.output {
        Some(output) => TransferRequest::new(&cli.url, settings.concurrency, output.clone())?,
        None => TransferRequest::in_directory(&cli.url, settings.concurrency, &settings.dir)?,
    };

    let bar = if cli.no_progress {
        TransferBar::hidden()
    } else {
        TransferBar::new(&request.file_name())
    };
    let options = settings.fetch_options(&cli.headers).on_progress(bar.reporter());

    let client = ReqwestClient::with_timeouts(settings.timeouts()).context("building HTTP client")?;
    let outcome = TransferCoordinator::new(client)
        .with_options(options)
        .run(&request)
        .await;
    bar.finish();

    match outcome? {
        TransferOutcome::Success(report) => {
            println!(
                "File {} downloaded in {:.2} seconds. (Speed: {:.2} MB/s)",
                request.file_name(),
                report.elapsed.as_secs_f64(),
                report.throughput_mbps()
            );
            Ok(true)
        }
        TransferOutcome::Failure { failed_segments } => {
            eprintln!(
                "{} segment(s) failed, {} was not written:",
                failed_segments.len(),
                request.destination().display()
            );
            for failed in &failed_segments {
                eprintln!("  {failed}");
            }
            Ok(false)
        }
    }
}
