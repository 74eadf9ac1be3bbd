use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Torrent job is waiting for the caller to pick which files to fetch.
pub const STATUS_WAITING_SELECTION: &str = "waiting_files_selection";
/// Torrent job finished; its `links` are ready to be unrestricted.
pub const STATUS_DOWNLOADED: &str = "downloaded";

// ── Torrent job responses ───────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AddedTorrent {
    pub id: String,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TorrentInfo {
    pub id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub bytes: u64,
    pub status: String,
    #[serde(default)]
    pub files: Vec<TorrentFile>,
    #[serde(default)]
    pub links: Vec<String>,
}

/// One file inside a torrent job. `selected` follows the wire encoding:
/// 0 = not selected, anything else = selected.
#[derive(Debug, Clone, Deserialize)]
pub struct TorrentFile {
    pub id: u64,
    pub path: String,
    pub bytes: u64,
    #[serde(default)]
    pub selected: u8,
}

impl TorrentFile {
    pub fn is_selected(&self) -> bool {
        self.selected != 0
    }

    /// The file's display name: the last component of its path.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

// ── Unrestrict responses ────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct UnrestrictedLink {
    pub id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub filesize: u64,
    /// The original hoster link this URL was generated from.
    pub link: String,
    /// The time-limited direct-download URL.
    pub download: String,
}

// ── Download history feed ───────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadItem {
    pub id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub filesize: u64,
    /// The stable hoster link.
    pub link: String,
    /// The direct-download URL generated at `generated_at`.
    pub download: String,
    #[serde(rename = "generated")]
    pub generated_at: DateTime<Utc>,
}

/// Error body the upstream attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    pub error_code: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_torrent_info() {
        let json = r#"{
            "id": "ABCDEF12345",
            "filename": "Some.Movie.2021.1080p.mkv",
            "hash": "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef",
            "bytes": 2621440,
            "status": "waiting_files_selection",
            "files": [
                { "id": 1, "path": "/Some.Movie.2021.1080p.mkv", "bytes": 2621440, "selected": 0 },
                { "id": 2, "path": "/Sample/sample.mkv", "bytes": 1048576, "selected": 0 }
            ],
            "links": []
        }"#;

        let info: TorrentInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.status, STATUS_WAITING_SELECTION);
        assert_eq!(info.files.len(), 2);
        assert_eq!(info.files[0].name(), "Some.Movie.2021.1080p.mkv");
        assert_eq!(info.files[1].name(), "sample.mkv");
        assert!(!info.files[0].is_selected());
        assert!(info.links.is_empty());
    }

    #[test]
    fn test_deserialize_downloaded_info_without_files() {
        // A finished job may omit the file list entirely.
        let json = r#"{
            "id": "ABCDEF12345",
            "filename": "Some.Movie.2021.1080p.mkv",
            "hash": "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef",
            "bytes": 2621440,
            "status": "downloaded",
            "links": ["https://debrid.example/d/JKTPXUWMICsrs"]
        }"#;

        let info: TorrentInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.status, STATUS_DOWNLOADED);
        assert!(info.files.is_empty());
        assert_eq!(info.links.len(), 1);
    }

    #[test]
    fn test_deserialize_download_item() {
        let json = r#"[{
            "id": "JKTPXUWMICsrs",
            "filename": "Some.Movie.2021.1080p.mkv",
            "filesize": 2621440,
            "link": "https://debrid.example/d/JKTPXUWMICsrs",
            "download": "https://cdn.debrid.example/dl/xyz/Some.Movie.2021.1080p.mkv",
            "generated": "2024-04-12T18:40:43.000Z"
        }]"#;

        let items: Vec<DownloadItem> = serde_json::from_str(json).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "JKTPXUWMICsrs");
        assert_eq!(items[0].generated_at.timestamp(), 1712947243);
    }

    #[test]
    fn test_deserialize_error_body() {
        let json = r#"{ "error": "infringing_file", "error_code": 35 }"#;
        let body: ApiErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.error, "infringing_file");
        assert_eq!(body.error_code, Some(35));

        let json = r#"{ "error": "bad_token" }"#;
        let body: ApiErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.error_code, None);
    }
}
