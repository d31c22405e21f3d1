#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
#![warn(clippy::perf)]
#![warn(clippy::complexity)]
#![warn(clippy::style)]
#![allow(clippy::multiple_crate_versions)]

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Result, ensure};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use streamdir::{
    batch,
    config::{Config, DEFAULT_INPUT_FILE, DEFAULT_OUTPUT_FILE, Profile},
    heuristics::Language,
    util::running_in_github_actions,
    ytdlp::YtDlp,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Resolves video links into a JSON directory of directly playable stations
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Text file with one video URL per line
    #[arg(short, long, default_value = DEFAULT_INPUT_FILE)]
    input: PathBuf,

    /// Where the station JSON array is written
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Extraction preset
    #[arg(short, long, value_enum, default_value_t = Profile::Hardened)]
    profile: Profile,

    /// Path to the yt-dlp executable [default: $YT_DLP_PATH, then `yt-dlp` from PATH]
    #[arg(long = "yt-dlp")]
    yt_dlp: Option<PathBuf>,

    /// Language assumed when a title gives no hint
    #[arg(long)]
    default_language: Option<String>,

    /// Bitrate reported for every station
    #[arg(long)]
    bitrate: Option<u32>,

    /// Don't wait between links or retries
    #[arg(long)]
    no_delay: bool,
}

impl Args {
    fn config(&self) -> Config {
        let mut config = Config::for_profile(self.profile);
        config.input.clone_from(&self.input);
        config.output.clone_from(&self.output);

        if let Some(language) = &self.default_language {
            config.default_language = Language::from_name(language);
        }
        if let Some(bitrate) = self.bitrate {
            config.bitrate = bitrate;
        }
        if self.no_delay {
            config = config.without_delays();
        }

        config
    }

    fn yt_dlp_binary(&self) -> PathBuf {
        self.yt_dlp
            .clone()
            .or_else(|| std::env::var_os("YT_DLP_PATH").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("yt-dlp"))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    info!("Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    info!(
        "Current time: {}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
    );
    if running_in_github_actions() {
        info!("Running in GitHub Actions environment");
    }

    ensure!(
        args.input.exists(),
        "{} not found. Please create it with your video URLs.",
        args.input.display()
    );

    let config = args.config();
    let resolver = YtDlp::new(args.yt_dlp_binary(), &config);
    ensure!(resolver.is_installed().await, "yt-dlp is not installed!");

    info!("Using the {:?} profile", args.profile);
    let report = batch::run(&config, &resolver).await?;

    match report.failure_reason() {
        None => {
            info!("All done successfully!");
            Ok(ExitCode::SUCCESS)
        }
        Some(reason) => {
            error!("Completed with errors: {reason}");
            Ok(ExitCode::FAILURE)
        }
    }
}
