use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One link cast to the account, identified by content hash + IMDb id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastedLink {
    /// The playable URL for this cast.
    pub url: String,
    #[serde(default)]
    pub filename: String,
    /// Lowercase hex content hash of the source torrent.
    pub hash: String,
    pub imdb_id: String,
    #[serde(default)]
    pub size: u64,
    pub updated_at: DateTime<Utc>,
}
