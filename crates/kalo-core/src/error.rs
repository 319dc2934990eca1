use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Failures talking to a Halo site.
///
/// Consumers only ever see these as a message inside an
/// [`Envelope`](crate::envelope::Envelope); the variants exist so the client
/// and its tests can tell them apart.
#[derive(Debug, Error)]
pub enum HaloError {
    #[error("invalid site address: {0}")]
    InvalidUrl(String),

    #[error("timeout")]
    Timeout,

    #[error("{0}")]
    Http(String),

    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("response data is empty")]
    EmptyBody,

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for HaloError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HaloError::Timeout
        } else {
            HaloError::Http(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Load(#[from] figment::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
