use reqwest::StatusCode;
use thiserror::Error;

/// Every way a backend call can fail. Call sites usually collapse these into a
/// single failure outcome; the variants exist for diagnostics.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("`{endpoint}` answered with status {status}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
    },
    #[error("malformed response from `{endpoint}`: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid base url `{0}`")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }
}
