use serde::Deserialize;

/// Subset of the extractor's JSON document we care about
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInfo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    /// Direct media URL, present when a single format got selected
    pub url: Option<String>,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub view_count: Option<u64>,
    pub formats: Option<Vec<RawFormat>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFormat {
    pub url: Option<String>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
}

impl RawFormat {
    fn is_audio_only(&self) -> bool {
        self.url.is_some() && self.vcodec.as_deref() == Some("none")
    }
}

/// A resolved video, ready to be turned into a station
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub stream_url: String,
    pub duration: f64,
    pub uploader: String,
    pub view_count: u64,
}

impl MediaInfo {
    /// Picks the stream URL out of `raw`, falling back to `page_url` when nothing usable is listed
    #[must_use]
    pub fn from_raw(raw: RawInfo, page_url: &str, known_audio_codecs: &[String]) -> Self {
        let stream_url = raw
            .url
            .clone()
            .or_else(|| {
                select_format(raw.formats.as_deref().unwrap_or_default(), known_audio_codecs)
                    .and_then(|f| f.url.clone())
            })
            .unwrap_or_else(|| page_url.to_string());

        Self {
            title: raw.title.unwrap_or_else(|| "Unknown Title".to_string()),
            description: raw.description.unwrap_or_default(),
            thumbnail: raw.thumbnail.filter(|t| !t.is_empty()),
            stream_url,
            duration: raw.duration.unwrap_or_default(),
            uploader: raw.uploader.unwrap_or_default(),
            view_count: raw.view_count.unwrap_or_default(),
        }
    }
}

/// Formats are listed worst to best, so every pick scans from the end.
///
/// Preference: audio-only with a known codec, any audio-only, anything with a URL.
fn select_format<'a>(formats: &'a [RawFormat], known_audio_codecs: &[String]) -> Option<&'a RawFormat> {
    let known_codec = |f: &&RawFormat| {
        f.acodec
            .as_deref()
            .is_some_and(|a| known_audio_codecs.iter().any(|k| a.starts_with(k.as_str())))
    };

    formats
        .iter()
        .rev()
        .filter(|f| f.is_audio_only())
        .find(known_codec)
        .or_else(|| formats.iter().rev().find(|f| f.is_audio_only()))
        .or_else(|| formats.iter().rev().find(|f| f.url.is_some()))
}
