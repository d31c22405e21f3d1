//! String heuristics used to fill in station metadata
//!
//! Everything in here is a pure function of its inputs: the same title or URL
//! always yields the same tags, language, codec and filename.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());
static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static FILENAME_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-\s]+").unwrap());

const STOP_WORDS: &[&str] = &[
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "official",
    "video", "audio", "hd",
];

// Order matters, the first language with a matching keyword wins
const LANGUAGE_KEYWORDS: &[(&str, &[&str])] = &[
    ("tamil", &["tamil", "tamizh", "tam"]),
    ("hindi", &["hindi", "hind"]),
    ("english", &["english", "eng"]),
    ("telugu", &["telugu", "tel"]),
    ("malayalam", &["malayalam", "mal"]),
    ("kannada", &["kannada", "kan"]),
    ("spanish", &["spanish", "español", "esp"]),
    ("french", &["french", "français", "fr"]),
];

pub const DEFAULT_EXTENSION: &str = "m4a";
pub const DEFAULT_CODEC: &str = "MP4A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    /// Display name, e.g. `Tamil`
    pub name: String,
    /// Short code, e.g. `TAMIL`
    pub code: String,
}

impl Language {
    #[must_use]
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }

    /// Builds a language from its name, deriving the code from the upper-cased name
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let mut chars = name.chars();
        let display = chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
        });
        let code = name.to_uppercase().chars().take(5).collect();

        Self {
            name: display,
            code,
        }
    }

    /// Lower-cased two letter form used in `languagecodes`
    #[must_use]
    pub fn short_code(&self) -> String {
        self.code.to_lowercase().chars().take(2).collect()
    }
}

/// Picks up to `limit` comma-separated tags out of a title
#[must_use]
pub fn extract_tags(title: &str, limit: usize) -> String {
    let title = title.to_lowercase();

    WORD_REGEX
        .find_iter(&title)
        .map(|m| m.as_str())
        .filter(|word| !STOP_WORDS.contains(word) && word.chars().count() > 2)
        .take(limit)
        .collect::<Vec<&str>>()
        .join(",")
}

/// Guesses the language of a title from keywords, falling back to `default`
#[must_use]
pub fn guess_language(title: &str, default: &Language) -> Language {
    let title = title.to_lowercase();

    LANGUAGE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| title.contains(k)))
        .map_or_else(|| default.clone(), |(name, _)| Language::from_name(name))
}

/// Extension of the last path segment of `url`, lower-cased. Empty when there is none.
#[must_use]
pub fn file_extension(url: &str, strip_query: bool) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) if strip_query => url.split(['?', '#']).next().unwrap_or(url).to_string(),
        Err(_) => url.to_string(),
    };

    let segment = path.rsplit('/').next().unwrap_or(&path);
    segment
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

/// Maps an extension to a codec label. The bitrate is not probed; `bitrate` is passed through.
#[must_use]
pub fn guess_codec(extension: &str, bitrate: u32) -> (&'static str, u32) {
    let codec = match extension {
        "m4a" | "mp4" => "MP4A",
        "mp3" => "MP3",
        "aac" => "AAC",
        "webm" => "OPUS",
        "ogg" => "OGG",
        "m3u8" => "HLS",
        _ => DEFAULT_CODEC,
    };

    (codec, bitrate)
}

#[must_use]
pub fn is_hls(url: &str) -> bool {
    url.to_lowercase().contains(".m3u8")
}

/// Turns a title into a filesystem-friendly name with the given extension
#[must_use]
pub fn derive_filename(title: &str, extension: &str) -> String {
    let safe = UNSAFE_FILENAME_CHARS.replace_all(title, "");
    let safe = FILENAME_SEPARATORS.replace_all(&safe, "_");
    let extension = if extension.is_empty() {
        DEFAULT_EXTENSION
    } else {
        extension
    };

    format!("{safe}.{extension}")
}
