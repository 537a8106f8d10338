use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Tip service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Tip service returned no text")]
    EmptyResponse,

    #[error("Tip service is not configured")]
    NotConfigured,
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Request(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
