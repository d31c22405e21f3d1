use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, ensure};
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::{
    config::Config,
    extractor::{ResolveError, Resolver, extract_media, points_to_page},
    station::Station,
    util::truncate_string,
};

/// Why a single link didn't make it into the output
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("no direct media link, resolution returned {0}")]
    Unresolved(String),
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub failed: usize,
    pub total: usize,
    /// Where the stations were written, if they were
    pub output: Option<PathBuf>,
}

impl BatchReport {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.processed > 0 && self.output.is_some()
    }

    /// Why the run counts as failed, or `None` when it succeeded
    #[must_use]
    pub fn failure_reason(&self) -> Option<String> {
        if self.total == 0 {
            Some("no links to process".to_string())
        } else if self.processed == 0 {
            Some(format!("all {} links failed, nothing was written", self.total))
        } else if self.output.is_none() {
            Some(format!(
                "{} of {} links processed but the output file could not be written",
                self.processed, self.total
            ))
        } else {
            None
        }
    }
}

/// Reads video links, one per line. Blank lines and `#` comments are skipped.
///
/// # Errors
/// Errors when the file is missing or unreadable
pub async fn read_links(path: &Path, dedupe: bool) -> Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Reading links from {}", path.display()))?;

    let mut seen = HashSet::new();
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| !dedupe || seen.insert(*line))
        .map(ToString::to_string)
        .collect())
}

/// Resolves one link and turns it into a station
///
/// # Errors
/// Errors when the link can't be resolved to a direct media stream
pub async fn process_link<R: Resolver + ?Sized>(
    resolver: &R,
    url: &str,
    config: &Config,
) -> Result<Station, ItemError> {
    let media = extract_media(resolver, url, config).await?;

    if config.reject_unresolved && points_to_page(&media.stream_url, url) {
        return Err(ItemError::Unresolved(media.stream_url));
    }

    Ok(Station::assemble(url, &media, Utc::now(), config))
}

/// Writes `stations` as a pretty JSON array and checks the file actually landed
///
/// # Errors
/// Errors on serialization / IO failure, or when the written file is empty
pub async fn save_stations(stations: &[Station], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(stations).context("Serializing stations")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Writing stations to {}", path.display()))?;

    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Verifying {}", path.display()))?;
    ensure!(
        metadata.len() > 0,
        "{} was created but is empty",
        path.display()
    );

    info!("Saved {} stations to {}", stations.len(), path.display());
    Ok(())
}

/// Processes every link of `config.input` in order and writes the stations to `config.output`
///
/// Failing links are logged and counted, never fatal.
///
/// # Errors
/// Errors only when the input file can't be read
#[instrument(skip_all, fields(input = %config.input.display()))]
pub async fn run<R: Resolver + ?Sized>(config: &Config, resolver: &R) -> Result<BatchReport> {
    let links = read_links(&config.input, config.dedupe).await?;
    let total = links.len();

    if links.is_empty() {
        error!("No links found to process!");
        return Ok(BatchReport::default());
    }
    info!("Found {total} links to process");

    let mut stations = Vec::with_capacity(total);
    let mut failed = 0;

    for (index, link) in links.iter().enumerate() {
        info!("Processing {}/{total}: {link}", index + 1);

        match process_link(resolver, link, config).await {
            Ok(station) => {
                info!(
                    "Successfully processed: {}",
                    truncate_string(&station.name, 50)
                );
                stations.push(station);
            }
            Err(e) => {
                error!("Failed to process {link}: {e}");
                failed += 1;
            }
        }

        if index + 1 < total {
            let delay = config.item_delay.sample();
            debug!("Waiting {delay:?} before the next link");
            tokio::time::sleep(delay).await;
        }
    }

    let processed = stations.len();
    if stations.is_empty() {
        error!("No data was processed successfully");
        return Ok(BatchReport {
            processed,
            failed,
            total,
            output: None,
        });
    }

    let output = match save_stations(&stations, &config.output).await {
        Ok(()) => Some(config.output.clone()),
        Err(e) => {
            error!("{e:#}");
            None
        }
    };

    info!("Processing complete! processed: {processed}, failed: {failed}, total: {total}");

    Ok(BatchReport {
        processed,
        failed,
        total,
        output,
    })
}
