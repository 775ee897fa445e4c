use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::settings::Overrides;

/// Download a file over HTTP as many concurrent byte ranges.
#[derive(Clone, Debug, Parser)]
#[command(name = "segfetch", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct Cli {
    /// URL of the file to download.
    pub url: String,

    /// Number of segments to split the file into.
    #[arg(short, long)]
    pub concurrency: Option<u32>,

    /// Output file. Defaults to the URL's file name inside `--dir`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory to save into when `--output` is not given.
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Cap on segment requests in flight at once.
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    /// Abort the transfer after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,

    /// Extra request header, as `Name: value`. May be repeated; every
    /// occurrence is sent, and a name given here replaces the same header
    /// from the configuration file.
    #[arg(short = 'H', long = "header", value_name = "HEADER", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Configuration file. Defaults to `segfetch.toml` when present.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Hide the progress bar.
    #[arg(long)]
    pub no_progress: bool,

    /// Raise log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Settings given on the command line, layered over every other source.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            concurrency:   self.concurrency,
            dir:           self.dir.clone(),
            max_in_flight: self.max_in_flight,
            deadline_secs: self.deadline,
        }
    }

    pub fn default_log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "segfetch=warn",
            1 => "segfetch=info",
            _ => "segfetch=debug",
        }
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `Name: value`, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in {raw:?}"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
