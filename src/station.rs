use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::Config,
    extractor::MediaInfo,
    heuristics::{
        derive_filename, extract_tags, file_extension, guess_codec, guess_language, is_hls,
    },
    util::truncate_string,
};

/// One timestamp rendered the two ways the directory schema wants it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    /// `YYYY-MM-DDTHH:MM:SS`
    pub local: String,
    /// ISO-8601 with microseconds and a `Z` suffix
    pub iso8601: String,
}

impl Timestamp {
    #[must_use]
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            local: at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            iso8601: at.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// A directory entry, serialized field for field in the order below
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub changeuuid: String,
    pub stationuuid: String,
    pub serveruuid: String,
    pub name: String,
    pub url: String,
    pub url_resolved: String,
    pub homepage: String,
    pub favicon: String,
    pub tags: String,
    pub country: String,
    pub countrycode: String,
    pub state: String,
    pub language: String,
    pub languagecodes: String,
    pub votes: u32,
    pub lastchangetime: String,
    pub lastchangetime_iso8601: String,
    pub codec: String,
    pub bitrate: u32,
    pub file_name_from_url: String,
    pub hls: u8,
    pub lastcheckok: u8,
    pub lastchecktime: String,
    pub lastchecktime_iso8601: String,
    pub lastcheckoktime: String,
    pub lastcheckoktime_iso8601: String,
    pub lastlocalchecktime: String,
    pub lastlocalchecktime_iso8601: String,
    pub clicktimestamp: String,
    pub clicktimestamp_iso8601: String,
    pub clickcount: u32,
    pub clicktrend: i32,
    pub ssl_error: u8,
    pub geo_lat: Option<f64>,
    pub geo_long: Option<f64>,
    pub geo_distance: Option<f64>,
    pub has_extended_info: bool,
}

impl Station {
    /// Builds a station for `page_url` out of its resolved media, stamping `now` everywhere
    #[must_use]
    pub fn assemble(page_url: &str, media: &MediaInfo, now: DateTime<Utc>, config: &Config) -> Self {
        let Timestamp { local, iso8601 } = Timestamp::new(now);
        let max_len = config.max_field_len;

        let stream_url = &media.stream_url;
        let extension = file_extension(stream_url, config.strip_query);
        let (codec, bitrate) = guess_codec(&extension, config.bitrate);
        let tags = extract_tags(&media.title, config.tag_limit);
        let language = guess_language(&media.title, &config.default_language);
        let filename = derive_filename(&media.title, &extension);

        Self {
            changeuuid: Uuid::new_v4().to_string(),
            stationuuid: Uuid::new_v4().to_string(),
            serveruuid: Uuid::new_v4().to_string(),
            name: truncate_string(&media.title, max_len),
            url: page_url.to_string(),
            url_resolved: stream_url.clone(),
            homepage: config.homepage.clone(),
            favicon: media
                .thumbnail
                .clone()
                .unwrap_or_else(|| config.default_favicon.clone()),
            tags: truncate_string(&tags, max_len),
            country: format!("User Defined ({} Videos)", language.name),
            countrycode: language.code.clone(),
            state: format!("{} State", language.name),
            languagecodes: language.short_code(),
            language: language.name,
            votes: 0,
            lastchangetime: local.clone(),
            lastchangetime_iso8601: iso8601.clone(),
            codec: codec.to_string(),
            bitrate,
            file_name_from_url: truncate_string(&filename, max_len),
            hls: u8::from(is_hls(stream_url)),
            lastcheckok: 1,
            lastchecktime: local.clone(),
            lastchecktime_iso8601: iso8601.clone(),
            lastcheckoktime: local.clone(),
            lastcheckoktime_iso8601: iso8601.clone(),
            lastlocalchecktime: local.clone(),
            lastlocalchecktime_iso8601: iso8601.clone(),
            clicktimestamp: local,
            clicktimestamp_iso8601: iso8601,
            clickcount: 0,
            clicktrend: 0,
            ssl_error: 0,
            geo_lat: None,
            geo_long: None,
            geo_distance: None,
            has_extended_info: false,
        }
    }

    /// Every `(local, iso8601)` timestamp pair of this station
    #[must_use]
    pub fn timestamp_pairs(&self) -> [(&str, &str); 5] {
        [
            (&self.lastchangetime, &self.lastchangetime_iso8601),
            (&self.lastchecktime, &self.lastchecktime_iso8601),
            (&self.lastcheckoktime, &self.lastcheckoktime_iso8601),
            (&self.lastlocalchecktime, &self.lastlocalchecktime_iso8601),
            (&self.clicktimestamp, &self.clicktimestamp_iso8601),
        ]
        .map(|(local, iso)| (local.as_str(), iso.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::Value;

    use super::*;
    use crate::config::Profile;

    fn media(title: &str, stream_url: &str) -> MediaInfo {
        MediaInfo {
            title: title.to_string(),
            description: String::new(),
            thumbnail: None,
            stream_url: stream_url.to_string(),
            duration: 0.0,
            uploader: String::new(),
            view_count: 0,
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 12, 30, 5).unwrap()
    }

    #[test]
    fn timestamp_formats() {
        let ts = Timestamp::new(noon());
        assert_eq!(ts.local, "2024-05-17T12:30:05");
        assert_eq!(ts.iso8601, "2024-05-17T12:30:05.000000Z");
    }

    #[test]
    fn tamil_rhyme_station() {
        let config = Config::for_profile(Profile::Classic);
        let station = Station::assemble(
            "https://youtu.be/abc",
            &media("Tamil Nursery Rhyme Official Video", "https://cdn.example/abc.m4a"),
            noon(),
            &config,
        );

        assert_eq!(station.codec, "MP4A");
        assert_eq!(station.bitrate, 128);
        assert_eq!(station.hls, 0);
        assert_eq!(station.language, "Tamil");
        assert_eq!(station.countrycode, "TAMIL");
        assert_eq!(station.languagecodes, "ta");
        assert_eq!(station.country, "User Defined (Tamil Videos)");
        assert_eq!(station.state, "Tamil State");
        assert_eq!(station.tags, "tamil,nursery,rhyme");
        assert_eq!(
            station.file_name_from_url,
            "Tamil_Nursery_Rhyme_Official_Video.m4a"
        );
        assert_eq!(station.favicon, "https://youtube.com/favicon.ico");
        assert_eq!(station.homepage, "https://youtube.com");
        assert_eq!(station.url, "https://youtu.be/abc");
        assert_eq!(station.url_resolved, "https://cdn.example/abc.m4a");
    }

    #[test]
    fn timestamp_pairs_match() {
        let station = Station::assemble(
            "https://youtu.be/abc",
            &media("Song", "https://cdn.example/abc.mp3"),
            noon(),
            &Config::default(),
        );
        let pairs = station.timestamp_pairs();
        assert!(pairs.iter().all(|p| *p == pairs[0]));
        assert_eq!(pairs[0], ("2024-05-17T12:30:05", "2024-05-17T12:30:05.000000Z"));
    }

    #[test]
    fn identifiers_are_fresh() {
        let m = media("Song", "https://cdn.example/abc.mp3");
        let a = Station::assemble("https://youtu.be/abc", &m, noon(), &Config::default());
        let b = Station::assemble("https://youtu.be/abc", &m, noon(), &Config::default());

        assert_ne!(a.stationuuid, b.stationuuid);
        assert_ne!(a.changeuuid, a.stationuuid);
        assert_ne!(a.serveruuid, a.changeuuid);
        assert!(Uuid::parse_str(&a.serveruuid).is_ok());
    }

    #[test]
    fn hls_flag_follows_resolved_url() {
        let config = Config::default();
        let live = Station::assemble(
            "https://youtu.be/live",
            &media("Live", "https://manifest.example/api/INDEX.M3U8?x=1"),
            noon(),
            &config,
        );
        assert_eq!(live.hls, 1);
        assert_eq!(live.codec, "HLS");
    }

    #[test]
    fn long_fields_are_capped() {
        let title = "word ".repeat(60);
        let config = Config::for_profile(Profile::Hardened);
        let station = Station::assemble(
            "https://youtu.be/abc",
            &media(&title, "https://cdn.example/abc.m4a"),
            noon(),
            &config,
        );

        assert_eq!(station.name.chars().count(), 80);
        assert!(station.file_name_from_url.chars().count() <= 80);
        assert!(station.tags.chars().count() <= 80);
        assert_eq!(station.tags, "word,word,word,word,word,word");
    }

    #[test]
    fn serializes_with_schema_field_names() {
        let station = Station::assemble(
            "https://youtu.be/abc",
            &media("Song", "https://cdn.example/abc.webm"),
            noon(),
            &Config::default(),
        );
        let json = serde_json::to_value(&station).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 37);
        assert_eq!(object["geo_lat"], Value::Null);
        assert_eq!(object["has_extended_info"], Value::Bool(false));
        assert_eq!(object["codec"], "OPUS");
        assert_eq!(object["votes"], 0);
    }
}
