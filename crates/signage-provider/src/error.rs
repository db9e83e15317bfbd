use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error(transparent)]
    HttpError(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    StatusError {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error(transparent)]
    DecodeError(#[from] serde_json::Error),

    #[error(transparent)]
    CoreError(#[from] signage_core::error::CoreError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Gave up after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ProviderError>,
    },
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
