//! Torrent resolution pipeline: magnet or infohash in, cached
//! streamable URL out.
//!
//! Single forward path with one branch:
//!
//! ```text
//! submit --> settle --> poll --> { needs selection | ready | failed }
//! needs selection --> select --> settle --> poll --> { ready | failed }
//! ready --> unrestrict --> cache write --> delete upstream job
//! ```

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use castgate_api::debrid::types::{
    TorrentFile, TorrentInfo, STATUS_DOWNLOADED, STATUS_WAITING_SELECTION,
};
use castgate_api::traits::DebridService;

use crate::cache::LinkCache;
use crate::error::CastgateError;
use crate::models::{stable_link_id, NewLink};

/// Upstream status is not immediately consistent after a submission or
/// a selection; wait this long before the single status poll.
const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Auto-selection considers only files larger than this (2 MiB).
const AUTO_SELECT_MIN_BYTES: u64 = 2 * 1024 * 1024;

/// Outcome of a resolve run.
#[derive(Debug, Clone)]
pub enum Resolution {
    Complete(ResolvedMedia),
    /// Not an error: the torrent has zero or several plausible files and
    /// the caller must pick one via [`ResolvePipeline::complete_selection`].
    SelectionRequired(PendingSelection),
}

#[derive(Debug, Clone)]
pub struct ResolvedMedia {
    pub infohash: String,
    pub filename: String,
    pub bytes: u64,
}

#[derive(Debug, Clone)]
pub struct PendingSelection {
    pub session_id: String,
    pub title: String,
    /// The torrent's full file list. The first file arrives pre-checked
    /// by convention.
    pub files: Vec<TorrentFile>,
}

pub struct ResolvePipeline<D> {
    debrid: Arc<D>,
    cache: Arc<LinkCache>,
}

impl<D> ResolvePipeline<D>
where
    D: DebridService,
    CastgateError: From<D::Error>,
{
    pub fn new(debrid: Arc<D>, cache: Arc<LinkCache>) -> Self {
        Self { debrid, cache }
    }

    /// Drive a magnet link or bare infohash to a streamable URL, or
    /// surface the file choice when it cannot be made automatically.
    pub async fn resolve(
        &self,
        input: &str,
        ip: Option<IpAddr>,
    ) -> Result<Resolution, CastgateError> {
        let magnet = normalize_magnet(input);
        let added = self.debrid.add_magnet(&magnet).await?;
        info!(session = %added.id, "torrent submitted");

        tokio::time::sleep(SETTLE_DELAY).await;
        let info = self.debrid.torrent_info(&added.id).await?;

        match info.status.as_str() {
            STATUS_WAITING_SELECTION => {
                let qualifying: Vec<u64> = info
                    .files
                    .iter()
                    .filter(|f| f.bytes > AUTO_SELECT_MIN_BYTES)
                    .map(|f| f.id)
                    .collect();

                if let [file_id] = qualifying.as_slice() {
                    debug!(session = %added.id, file_id, "auto-selecting the single large file");
                    self.debrid
                        .select_files(&added.id, &file_id.to_string())
                        .await?;
                    let media = self.settle_and_finish(&added.id, Some(*file_id), ip).await?;
                    Ok(Resolution::Complete(media))
                } else {
                    // Zero or several plausible files: surface the choice,
                    // never guess.
                    debug!(
                        session = %added.id,
                        candidates = qualifying.len(),
                        "selection is ambiguous, surfacing to caller"
                    );
                    let mut files = info.files.clone();
                    if let Some(first) = files.first_mut() {
                        first.selected = 1;
                    }
                    Ok(Resolution::SelectionRequired(PendingSelection {
                        session_id: added.id,
                        title: display_title(&info, &magnet),
                        files,
                    }))
                }
            }
            STATUS_DOWNLOADED => {
                let media = self.finish(info, None, ip).await?;
                Ok(Resolution::Complete(media))
            }
            _ => Err(CastgateError::NoLinks {
                status: info.status,
            }),
        }
    }

    /// Second half of an ambiguous resolve: the caller has picked a file.
    pub async fn complete_selection(
        &self,
        session_id: &str,
        file_id: u64,
        ip: Option<IpAddr>,
    ) -> Result<ResolvedMedia, CastgateError> {
        self.debrid
            .select_files(session_id, &file_id.to_string())
            .await?;
        self.settle_and_finish(session_id, Some(file_id), ip).await
    }

    async fn settle_and_finish(
        &self,
        session_id: &str,
        selected: Option<u64>,
        ip: Option<IpAddr>,
    ) -> Result<ResolvedMedia, CastgateError> {
        tokio::time::sleep(SETTLE_DELAY).await;
        let info = self.debrid.torrent_info(session_id).await?;
        self.finish(info, selected, ip).await
    }

    /// Ready job -> unrestrict -> cache write -> upstream delete.
    async fn finish(
        &self,
        info: TorrentInfo,
        selected: Option<u64>,
        ip: Option<IpAddr>,
    ) -> Result<ResolvedMedia, CastgateError> {
        let link = match info.links.first() {
            Some(link) => link.clone(),
            None => {
                return Err(CastgateError::NoLinks {
                    status: info.status,
                })
            }
        };

        let hint = routing_hint(ip);
        let unrestricted = self.debrid.unrestrict(&link, hint.as_deref()).await?;

        // Displayed name and size come from the chosen file when one was
        // explicitly selected, falling back to the job aggregate.
        let (filename, bytes) = match selected
            .and_then(|id| info.files.iter().find(|f| f.id == id && f.is_selected()))
        {
            Some(file) => (file.name().to_string(), file.bytes),
            None => (info.filename.clone(), info.bytes),
        };

        match stable_link_id(&link) {
            Some(id) => {
                self.cache.put(
                    &id,
                    NewLink {
                        original_link: link,
                        unrestricted_url: unrestricted.download,
                        filename: filename.clone(),
                        manually_added: true,
                        filesize: bytes,
                    },
                )?;
            }
            None => {
                warn!(link = %link, "no stable id in upstream link, skipping cache write");
            }
        }

        self.debrid.delete_torrent(&info.id).await?;
        info!(infohash = %info.hash, filename = %filename, "torrent resolved");

        Ok(ResolvedMedia {
            infohash: info.hash,
            filename,
            bytes,
        })
    }
}

/// Wrap a bare infohash as a magnet URI; pass magnets through untouched.
pub fn normalize_magnet(input: &str) -> String {
    let input = input.trim();
    if input.starts_with("magnet:") {
        input.to_string()
    } else {
        format!("magnet:?xt=urn:btih:{input}")
    }
}

/// The magnet's `dn` display-name parameter, when present.
fn magnet_display_name(magnet: &str) -> Option<String> {
    let url = url::Url::parse(magnet).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "dn")
        .map(|(_, v)| v.into_owned())
}

/// Best display title for a pending selection: the job's filename when
/// the upstream already has one, else the magnet's display name, else
/// the infohash.
fn display_title(info: &TorrentInfo, magnet: &str) -> String {
    if !info.filename.is_empty() {
        return info.filename.clone();
    }
    magnet_display_name(magnet).unwrap_or_else(|| info.hash.clone())
}

/// Format the caller's IP as an unrestrict routing hint. Addresses that
/// are not globally routable are dropped rather than forwarded.
fn routing_hint(ip: Option<IpAddr>) -> Option<String> {
    let ip = ip?;
    let global = match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => {
            let seg = v6.segments();
            let unique_local = (seg[0] & 0xfe00) == 0xfc00;
            let link_local = (seg[0] & 0xffc0) == 0xfe80;
            !(v6.is_loopback() || v6.is_unspecified() || unique_local || link_local)
        }
    };
    if global {
        Some(ip.to_string())
    } else {
        debug!(ip = %ip, "caller address is not globally routable, omitting hint");
        None
    }
}
