use thiserror::Error;

/// Errors from the debrid API client.
#[derive(Debug, Error)]
pub enum DebridError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        /// Upstream error code, when the error body was parseable.
        code: Option<i32>,
        message: String,
    },

    #[error("parse error: {0}")]
    Parse(String),
}
