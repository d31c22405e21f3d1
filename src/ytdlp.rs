use std::{io::ErrorKind, path::PathBuf, process::Stdio, time::Duration};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::{
    config::{Config, Disguise},
    extractor::{RawInfo, ResolveMode, Resolver},
};

/// Format selector handed to yt-dlp: best audio-only, else best muxed
const FORMAT_SELECTOR: &str = "ba/b";

/// Requests the flat pass skips: the watch page and the player configs
const FLAT_PLAYER_SKIP: &str = "webpage,configs";

/// [`Resolver`] backed by the `yt-dlp` executable
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    socket_timeout: Duration,
    disguise: Option<Disguise>,
    fallback_client: String,
}

impl YtDlp {
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            binary: binary.into(),
            socket_timeout: config.socket_timeout,
            disguise: config.disguise.clone(),
            fallback_client: config.fallback_client.clone(),
        }
    }

    /// Checks if yt-dlp is installed / runnable
    pub async fn is_installed(&self) -> bool {
        debug!("Checking for yt-dlp installation at {:?}", self.binary);
        tokio::process::Command::new(&self.binary)
            .arg("--version")
            .stderr(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .await
            .is_ok_and(|status| status.success())
    }

    fn args(&self, url: &str, mode: ResolveMode) -> Vec<String> {
        let mut args: Vec<String> = [
            "--dump-single-json",
            "--skip-download",
            "--no-playlist",
            "--no-warnings",
            "--no-check-certificates",
            "--format",
            FORMAT_SELECTOR,
            "--socket-timeout",
        ]
        .map(String::from)
        .to_vec();
        args.push(self.socket_timeout.as_secs().to_string());

        if mode == ResolveMode::Flat {
            args.push("--flat-playlist".to_string());
        }

        if let Some(disguise) = &self.disguise {
            args.push("--user-agent".to_string());
            args.push(disguise.user_agent.clone());
            for (name, value) in &disguise.headers {
                args.push("--add-header".to_string());
                args.push(format!("{name}:{value}"));
            }
            args.push("--sleep-requests".to_string());
            args.push(disguise.sleep_requests.to_string());
        }

        let player_client = match mode {
            ResolveMode::AlternateClient => Some(self.fallback_client.as_str()),
            ResolveMode::Primary | ResolveMode::Flat => {
                self.disguise.as_ref().map(|d| d.player_client.as_str())
            }
        };

        // yt-dlp keeps only one `--extractor-args` per extractor, so they're joined with `;`
        let mut youtube_args = Vec::new();
        if let Some(client) = player_client {
            youtube_args.push(format!("player_client={client}"));
        }
        if mode == ResolveMode::Flat {
            youtube_args.push(format!("player_skip={FLAT_PLAYER_SKIP}"));
        }
        if !youtube_args.is_empty() {
            args.push("--extractor-args".to_string());
            args.push(format!("youtube:{}", youtube_args.join(";")));
        }

        args.push("--".to_string());
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl Resolver for YtDlp {
    #[instrument(skip(self))]
    async fn resolve(&self, url: &str, mode: ResolveMode) -> Result<RawInfo> {
        let child = match tokio::process::Command::new(&self.binary)
            .args(self.args(url, mode))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                bail!("`yt-dlp` is not installed or available in PATH!")
            }
            Err(e) => bail!("Unable to spawn yt-dlp: {e}"),
        };

        let out = child
            .wait_with_output()
            .await
            .context("Waiting for yt-dlp to exit")?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            debug!("yt-dlp stderr: {stderr}");
            bail!("yt-dlp exited with {}: {}", out.status, stderr.trim());
        }

        serde_json::from_slice::<RawInfo>(&out.stdout).context("Parsing yt-dlp JSON output")
    }
}
