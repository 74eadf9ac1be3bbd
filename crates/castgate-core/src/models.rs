//! Shared data model: the cached link entry and its identifier scheme.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One cached link, keyed by its stable link identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkEntry {
    /// The upstream short link. Stable for the life of the entry.
    pub original_link: String,
    /// Time-limited direct-download URL, trusted only within the
    /// freshness window after `generated_at`.
    pub unrestricted_url: String,
    /// When `unrestricted_url` was last (re)generated.
    pub generated_at: DateTime<Utc>,
    pub filename: String,
    /// True when the entry came from an explicit user submission rather
    /// than passive observation of the download-history feed. Never
    /// flips back to false once set.
    pub manually_added: bool,
    #[serde(default)]
    pub filesize: u64,
}

/// Payload for a cache write. `generated_at` is stamped by the cache.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub original_link: String,
    pub unrestricted_url: String,
    pub filename: String,
    pub manually_added: bool,
    pub filesize: u64,
}

/// Extract the stable link identifier from an upstream short link:
/// the last non-empty path segment, e.g.
/// `https://debrid.example/d/JKTPXUWMICsrs` -> `JKTPXUWMICsrs`.
pub fn stable_link_id(link: &str) -> Option<String> {
    let url = url::Url::parse(link).ok()?;
    let id = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?;
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_link_id() {
        assert_eq!(
            stable_link_id("https://debrid.example/d/JKTPXUWMICsrs").as_deref(),
            Some("JKTPXUWMICsrs")
        );
        // Trailing slash does not hide the identifier.
        assert_eq!(
            stable_link_id("https://debrid.example/d/JKTPXUWMICsrs/").as_deref(),
            Some("JKTPXUWMICsrs")
        );
        assert_eq!(stable_link_id("not a url"), None);
        assert_eq!(stable_link_id("https://debrid.example/"), None);
    }

    #[test]
    fn test_link_entry_roundtrip() {
        let entry = LinkEntry {
            original_link: "https://debrid.example/d/ABC".into(),
            unrestricted_url: "https://cdn.debrid.example/dl/xyz".into(),
            generated_at: Utc::now(),
            filename: "file.mkv".into(),
            manually_added: true,
            filesize: 42,
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: LinkEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
