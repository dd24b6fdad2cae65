use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    /// Scorer not configured or not reachable.
    #[error("scoring unavailable: {0}")]
    Unavailable(String),

    #[error("scoring request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("scoring service returned {status}: {body}")]
    Server { status: u16, body: String },

    /// Response did not parse into candidate pairings.
    #[error("malformed scoring response: {0}")]
    MalformedResponse(String),

    #[error("scoring timed out after {0:?}")]
    Timeout(Duration),
}
