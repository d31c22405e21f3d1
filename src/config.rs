use std::{path::PathBuf, time::Duration};

use clap::ValueEnum;
use rand::Rng;

use crate::heuristics::Language;

pub const DEFAULT_INPUT_FILE: &str = "links.txt";
pub const DEFAULT_OUTPUT_FILE: &str = "output.json";

pub const DEFAULT_HOMEPAGE: &str = "https://youtube.com";
pub const DEFAULT_FAVICON: &str = "https://youtube.com/favicon.ico";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Named configuration presets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    /// Plain extraction with short fixed delays
    Classic,
    /// Browser disguise, rate limiting, jittered delays and stricter output checks
    #[default]
    Hardened,
}

/// How long to wait between two links of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemDelay {
    Fixed(Duration),
    /// Uniformly random in `[min, max)`
    Jitter { min: Duration, max: Duration },
}

impl ItemDelay {
    #[must_use]
    pub fn sample(&self) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Jitter { min, max } if max > min => rand::thread_rng().gen_range(min..max),
            Self::Jitter { min, .. } => min,
        }
    }
}

/// Options passed to the extractor to look less like an automated client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disguise {
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
    /// Seconds the extractor sleeps between its own requests
    pub sleep_requests: u32,
    pub player_client: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,

    /// Total primary resolution attempts for transient failures
    pub retry_attempts: u32,
    /// Delay before attempt `n + 1` is `backoff_base * n`
    pub backoff_base: Duration,
    pub item_delay: ItemDelay,
    pub socket_timeout: Duration,

    pub tag_limit: usize,
    pub max_field_len: usize,
    pub default_language: Language,
    pub bitrate: u32,
    pub homepage: String,
    pub default_favicon: String,

    pub dedupe: bool,
    pub strip_query: bool,
    /// Fail items whose resolved URL still points at the hosting page
    pub reject_unresolved: bool,

    /// Audio codec prefixes preferred when picking from a format list
    pub known_audio_codecs: Vec<String>,
    pub disguise: Option<Disguise>,
    /// Player client used when bypassing bot detection
    pub fallback_client: String,
}

impl Config {
    #[must_use]
    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Classic => Self {
                input: PathBuf::from(DEFAULT_INPUT_FILE),
                output: PathBuf::from(DEFAULT_OUTPUT_FILE),
                retry_attempts: 2,
                backoff_base: Duration::from_secs(3),
                item_delay: ItemDelay::Fixed(Duration::from_secs(2)),
                socket_timeout: Duration::from_secs(30),
                tag_limit: 8,
                max_field_len: 100,
                default_language: Language::new("Unknown", "UNK"),
                bitrate: 128,
                homepage: DEFAULT_HOMEPAGE.to_string(),
                default_favicon: DEFAULT_FAVICON.to_string(),
                dedupe: false,
                strip_query: false,
                reject_unresolved: false,
                known_audio_codecs: Vec::new(),
                disguise: None,
                fallback_client: "android".to_string(),
            },
            Profile::Hardened => Self {
                input: PathBuf::from(DEFAULT_INPUT_FILE),
                output: PathBuf::from(DEFAULT_OUTPUT_FILE),
                retry_attempts: 2,
                backoff_base: Duration::from_secs(5),
                item_delay: ItemDelay::Jitter {
                    min: Duration::from_secs(3),
                    max: Duration::from_secs(8),
                },
                socket_timeout: Duration::from_secs(60),
                tag_limit: 6,
                max_field_len: 80,
                default_language: Language::from_name("tamil"),
                bitrate: 128,
                homepage: DEFAULT_HOMEPAGE.to_string(),
                default_favicon: DEFAULT_FAVICON.to_string(),
                dedupe: true,
                strip_query: true,
                reject_unresolved: true,
                known_audio_codecs: ["opus", "mp4a", "aac", "vorbis"]
                    .map(String::from)
                    .to_vec(),
                disguise: Some(Disguise {
                    user_agent: BROWSER_USER_AGENT.to_string(),
                    headers: vec![
                        ("Accept-Language".to_string(), "en-US,en;q=0.9".to_string()),
                        ("Sec-Fetch-Mode".to_string(), "navigate".to_string()),
                    ],
                    sleep_requests: 1,
                    player_client: "web,android".to_string(),
                }),
                fallback_client: "android".to_string(),
            },
        }
    }

    /// Drops every sleep between links and between retries
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.item_delay = ItemDelay::Fixed(Duration::ZERO);
        self.backoff_base = Duration::ZERO;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::for_profile(Profile::default())
    }
}
