use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Server,
    Encoding,
    Decoding,
    Configuration,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("metric {metric:?} has a non-finite point [{timestamp}, {value}]")]
    NonFiniteValue {
        metric: String,
        timestamp: f64,
        value: f64,
    },
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("malformed scope segment: {0:?}")]
    MalformedScope(String),
    #[error("timestamp out of range: {0}")]
    InvalidTimestamp(i64),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Transport(_) => ErrorKind::Network,
            ClientError::Status { .. } => ErrorKind::Server,
            ClientError::Encode(_) | ClientError::NonFiniteValue { .. } => ErrorKind::Encoding,
            ClientError::Decode(_)
            | ClientError::MalformedScope(_)
            | ClientError::InvalidTimestamp(_) => ErrorKind::Decoding,
            ClientError::InvalidUrl(_) | ClientError::MissingCredential(_) => {
                ErrorKind::Configuration
            }
        }
    }
}
