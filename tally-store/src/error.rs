//! Error types for store access

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("could not decode store response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("store returned no rows for {0}")]
    Empty(&'static str),

    #[error("no changes requested")]
    NoChanges,

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}
