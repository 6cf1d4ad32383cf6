use thiserror::Error;

/// Failure taxonomy for a single resolution strategy. All variants are
/// recovered at the strategy boundary; nothing here reaches the caller of
/// `resolve` as an error.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("network request failed: {0}")]
    Network(String),

    #[error("failed to parse page content: {0}")]
    Parse(String),

    #[error("invalid encoded payload: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ResolveError {
    fn from(err: reqwest::Error) -> Self {
        ResolveError::Network(err.to_string())
    }
}

impl From<base64::DecodeError> for ResolveError {
    fn from(err: base64::DecodeError) -> Self {
        ResolveError::Decode(err.to_string())
    }
}
