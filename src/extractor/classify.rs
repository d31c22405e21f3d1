use thiserror::Error;

/// The age gate also asks to "sign in to confirm", so only the bot wording counts
const BOT_DETECTION_MARKERS: &[&str] = &["not a bot"];

/// Why a resolution failed, decided once from the extractor's error text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Content is gone or locked, retrying won't help
    #[error("{0}")]
    Terminal(TerminalKind),
    #[error("blocked by bot detection")]
    BotDetection,
    #[error("{0}")]
    Transient(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TerminalKind {
    #[error("video unavailable")]
    Unavailable,
    #[error("private video")]
    Private,
    #[error("video not available")]
    NotAvailable,
}

impl ResolveError {
    #[must_use]
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();

        if BOT_DETECTION_MARKERS.iter().any(|m| lower.contains(m)) {
            Self::BotDetection
        } else if lower.contains("video unavailable") {
            Self::Terminal(TerminalKind::Unavailable)
        } else if lower.contains("private video") {
            Self::Terminal(TerminalKind::Private)
        } else if lower.contains("not available") {
            Self::Terminal(TerminalKind::NotAvailable)
        } else {
            Self::Transient(message.trim().to_string())
        }
    }
}
