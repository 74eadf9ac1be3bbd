use thiserror::Error;

use castgate_api::cast::CastError;
use castgate_api::debrid::DebridError;

#[derive(Debug, Error)]
pub enum CastgateError {
    /// Non-2xx from either upstream API. Carries the upstream status
    /// and the decoded error body when one was available.
    #[error("upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    /// Network-level failure or undecodable response from an upstream.
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    /// A torrent job reached a terminal state without a usable link.
    #[error("no usable link: torrent ended in status '{status}'")]
    NoLinks { status: String },

    /// A synthetic virtual filename did not decode.
    #[error("malformed virtual filename: {0}")]
    MalformedIdentifier(String),

    /// Cache or listing miss.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DebridError> for CastgateError {
    fn from(e: DebridError) -> Self {
        match e {
            DebridError::Api {
                status,
                code,
                message,
            } => CastgateError::Upstream {
                status,
                message: match code {
                    Some(code) => format!("{message} (code {code})"),
                    None => message,
                },
            },
            DebridError::Http(e) => CastgateError::Unreachable(e.to_string()),
            DebridError::Parse(m) => CastgateError::Unreachable(m),
        }
    }
}

impl From<CastError> for CastgateError {
    fn from(e: CastError) -> Self {
        match e {
            CastError::Api { status, message } => CastgateError::Upstream { status, message },
            CastError::Http(e) => CastgateError::Unreachable(e.to_string()),
            CastError::Parse(m) => CastgateError::Unreachable(m),
        }
    }
}
