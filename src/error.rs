use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuakeError {
    #[error("Source '{source_name}' unavailable: {reason}")]
    SourceUnavailable {
        source_name: &'static str,
        reason: String,
    },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("All earthquake sources exhausted")]
    AllSourcesExhausted,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl QuakeError {
    pub fn unavailable(source_name: &'static str, reason: impl Into<String>) -> Self {
        QuakeError::SourceUnavailable {
            source_name,
            reason: reason.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        QuakeError::MalformedRecord(reason.into())
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            QuakeError::SourceUnavailable { .. } => "source_unavailable",
            QuakeError::MalformedRecord(_) => "malformed_record",
            QuakeError::AllSourcesExhausted => "all_sources_exhausted",
            QuakeError::Http(_) => "http",
            QuakeError::Toml(_) => "toml",
            QuakeError::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, QuakeError>;
