#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    NoConfigDir,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: HTTP {0}")]
    Api(u16),

    #[error("Rate limited by the API (HTTP 429)")]
    RateLimited,
}

impl Error {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
