use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;

pub mod classify;
pub mod structs;

pub use classify::{ResolveError, TerminalKind};
pub use structs::{MediaInfo, RawFormat, RawInfo};

/// URL fragments that only ever show up in hosting pages, never in media streams
const HOSTING_PAGE_MARKERS: &[&str] = &["youtube.com/watch", "youtu.be/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Full extraction with the configured options
    Primary,
    /// Lightweight pass that skips the watch page and player config requests
    Flat,
    /// Full extraction through the fallback player client
    AlternateClient,
}

/// Something that can turn a video page URL into extractor metadata
#[async_trait]
pub trait Resolver: Send + Sync {
    /// # Errors
    /// Errors carry the extractor's own message, which gets classified by [`extract_media`]
    async fn resolve(&self, url: &str, mode: ResolveMode) -> Result<RawInfo>;
}

/// Whether `resolved` is still a web page rather than a media stream
#[must_use]
pub fn points_to_page(resolved: &str, page_url: &str) -> bool {
    let lower = resolved.to_lowercase();
    resolved == page_url || HOSTING_PAGE_MARKERS.iter().any(|m| lower.contains(m))
}

/// Resolves `url` into a playable stream, retrying transient failures
///
/// # Errors
/// Returns the classified failure once retries or fallbacks are exhausted
#[instrument(skip(resolver, config))]
pub async fn extract_media<R: Resolver + ?Sized>(
    resolver: &R,
    url: &str,
    config: &Config,
) -> Result<MediaInfo, ResolveError> {
    let attempts = config.retry_attempts.max(1);
    let mut attempt = 1;

    loop {
        let error = match resolver.resolve(url, ResolveMode::Primary).await {
            Ok(raw) => return Ok(MediaInfo::from_raw(raw, url, &config.known_audio_codecs)),
            Err(e) => ResolveError::classify(&format!("{e:#}")),
        };

        match error {
            ResolveError::Terminal(kind) => {
                warn!("{url} is {kind}, not retrying");
                return Err(error);
            }
            ResolveError::BotDetection => {
                warn!("Bot detection triggered for {url}");
                return bypass_bot_detection(resolver, url, config).await;
            }
            ResolveError::Transient(ref reason) => {
                warn!("Attempt {attempt}/{attempts} failed for {url}: {reason}");
                if attempt >= attempts {
                    return Err(error);
                }

                let delay = config.backoff_base * attempt;
                debug!("Retrying {url} in {delay:?}");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Tries a flat pass first, then a full pass through the fallback player client
async fn bypass_bot_detection<R: Resolver + ?Sized>(
    resolver: &R,
    url: &str,
    config: &Config,
) -> Result<MediaInfo, ResolveError> {
    info!("Trying lightweight extraction for {url}");
    match resolver.resolve(url, ResolveMode::Flat).await {
        Ok(raw) if raw.url.as_deref().is_some_and(|u| !points_to_page(u, url)) => {
            return Ok(MediaInfo::from_raw(raw, url, &config.known_audio_codecs));
        }
        Ok(_) => debug!("Lightweight extraction of {url} gave no direct link"),
        Err(e) => debug!("Lightweight extraction of {url} failed: {e:#}"),
    }

    info!(
        "Retrying {url} with the `{}` player client",
        config.fallback_client
    );
    match resolver.resolve(url, ResolveMode::AlternateClient).await {
        Ok(raw) => Ok(MediaInfo::from_raw(raw, url, &config.known_audio_codecs)),
        Err(e) => {
            warn!("Alternate client failed for {url}: {e:#}");
            Err(ResolveError::BotDetection)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;

    use super::*;
    use crate::config::Profile;

    /// Answers each call with the next scripted reply and records the mode it was called with
    struct Scripted {
        replies: Mutex<Vec<Result<RawInfo, String>>>,
        calls: Mutex<Vec<ResolveMode>>,
    }

    impl Scripted {
        fn new(mut replies: Vec<Result<RawInfo, String>>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<ResolveMode> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Resolver for Scripted {
        async fn resolve(&self, _url: &str, mode: ResolveMode) -> Result<RawInfo> {
            self.calls.lock().unwrap().push(mode);
            self.replies
                .lock()
                .unwrap()
                .pop()
                .expect("unexpected resolver call")
                .map_err(|e| anyhow!(e))
        }
    }

    fn direct(url: &str) -> RawInfo {
        RawInfo {
            title: Some("Song".to_string()),
            url: Some(url.to_string()),
            ..Default::default()
        }
    }

    fn config() -> Config {
        Config::for_profile(Profile::Hardened).without_delays()
    }

    const PAGE: &str = "https://www.youtube.com/watch?v=abc";

    #[tokio::test]
    async fn resolves_on_first_try() {
        let resolver = Scripted::new(vec![Ok(direct("https://cdn.example/a.m4a"))]);
        let info = extract_media(&resolver, PAGE, &config()).await.unwrap();
        assert_eq!(info.stream_url, "https://cdn.example/a.m4a");
        assert_eq!(resolver.calls(), vec![ResolveMode::Primary]);
    }

    #[tokio::test]
    async fn private_video_is_not_retried() {
        let resolver = Scripted::new(vec![Err("ERROR: [youtube] abc: Private video".to_string())]);
        let err = extract_media(&resolver, PAGE, &config()).await.unwrap_err();
        assert_eq!(err, ResolveError::Terminal(TerminalKind::Private));
        assert_eq!(resolver.calls().len(), 1);
    }

    #[tokio::test]
    async fn transient_errors_retry_until_ceiling() {
        let resolver = Scripted::new(vec![
            Err("HTTP Error 503".to_string()),
            Err("HTTP Error 503".to_string()),
        ]);
        let err = extract_media(&resolver, PAGE, &config()).await.unwrap_err();
        assert!(matches!(err, ResolveError::Transient(_)));
        assert_eq!(resolver.calls().len(), 2);
    }

    #[tokio::test]
    async fn transient_error_then_success() {
        let resolver = Scripted::new(vec![
            Err("read timed out".to_string()),
            Ok(direct("https://cdn.example/b.webm")),
        ]);
        let info = extract_media(&resolver, PAGE, &config()).await.unwrap();
        assert_eq!(info.stream_url, "https://cdn.example/b.webm");
    }

    #[tokio::test]
    async fn bot_detection_uses_flat_pass_when_it_has_a_stream() {
        let resolver = Scripted::new(vec![
            Err("Sign in to confirm you're not a bot".to_string()),
            Ok(direct("https://cdn.example/flat.m4a")),
        ]);
        let info = extract_media(&resolver, PAGE, &config()).await.unwrap();
        assert_eq!(info.stream_url, "https://cdn.example/flat.m4a");
        assert_eq!(resolver.calls(), vec![ResolveMode::Primary, ResolveMode::Flat]);
    }

    #[tokio::test]
    async fn bot_detection_falls_through_to_alternate_client() {
        let resolver = Scripted::new(vec![
            Err("Sign in to confirm you're not a bot".to_string()),
            Ok(direct(PAGE)),
            Ok(direct("https://cdn.example/alt.m4a")),
        ]);
        let info = extract_media(&resolver, PAGE, &config()).await.unwrap();
        assert_eq!(info.stream_url, "https://cdn.example/alt.m4a");
        assert_eq!(
            resolver.calls(),
            vec![
                ResolveMode::Primary,
                ResolveMode::Flat,
                ResolveMode::AlternateClient
            ]
        );
    }

    #[tokio::test]
    async fn bot_detection_gives_up_after_fallback() {
        let resolver = Scripted::new(vec![
            Err("Sign in to confirm you're not a bot".to_string()),
            Err("still a bot".to_string()),
            Err("Sign in to confirm you're not a bot".to_string()),
        ]);
        let err = extract_media(&resolver, PAGE, &config()).await.unwrap_err();
        assert_eq!(err, ResolveError::BotDetection);
        assert_eq!(resolver.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_grows_with_each_attempt() {
        let mut config = Config::for_profile(Profile::Classic);
        config.retry_attempts = 3;
        let resolver = Scripted::new(vec![
            Err("HTTP Error 503".to_string()),
            Err("HTTP Error 503".to_string()),
            Err("HTTP Error 503".to_string()),
        ]);

        let start = tokio::time::Instant::now();
        let err = extract_media(&resolver, PAGE, &config).await.unwrap_err();
        assert!(matches!(err, ResolveError::Transient(_)));
        assert_eq!(resolver.calls().len(), 3);
        // 3 s before the second attempt, 6 s before the third
        assert_eq!(start.elapsed(), std::time::Duration::from_secs(9));
    }

    #[tokio::test]
    async fn age_gate_takes_the_retry_path() {
        let resolver = Scripted::new(vec![
            Err("Sign in to confirm your age".to_string()),
            Err("Sign in to confirm your age".to_string()),
        ]);
        let err = extract_media(&resolver, PAGE, &config()).await.unwrap_err();
        assert!(matches!(err, ResolveError::Transient(_)));
        assert_eq!(
            resolver.calls(),
            vec![ResolveMode::Primary, ResolveMode::Primary]
        );
    }

    #[test]
    fn page_detection() {
        assert!(points_to_page(PAGE, PAGE));
        assert!(points_to_page("https://YouTube.com/watch?v=zzz", PAGE));
        assert!(points_to_page("https://example.org/page", "https://example.org/page"));
        assert!(!points_to_page("https://rr3.googlevideo.com/videoplayback?id=1", PAGE));
    }
}
