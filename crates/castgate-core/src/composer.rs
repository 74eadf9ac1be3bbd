//! Virtual directory composer.
//!
//! Synthesizes listings from the two upstream feeds and answers
//! single-file fetches by recomputing the relevant listing. There is no
//! local index to drift from upstream truth; the feeds' retention
//! windows are short and the expected request volume is a household of
//! WebDAV clients.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use castgate_api::cast::types::CastedLink;
use castgate_api::traits::{CastService, DebridService};

use crate::cache::{self, LinkCache};
use crate::error::CastgateError;
use crate::models::{stable_link_id, NewLink};

/// Raw feed entries fetched per observed listing.
const OBSERVED_FETCH_LIMIT: u32 = 20;

/// Unique entries exposed per observed listing.
const OBSERVED_LIST_CAP: usize = 10;

/// Casted links not updated within this many days are hidden.
const CASTED_WINDOW_DAYS: i64 = 7;

pub const STRM_CONTENT_TYPE: &str = "text/plain";

/// Which upstream feed backs a virtual directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryKind {
    /// The account's download-history feed.
    Observed,
    /// The casted-links catalog.
    Casted,
}

/// One listing entry. Computed on demand, never persisted. The content
/// is the resolved URL, and the size is the byte length of that URL:
/// the entry is a redirect pointer, not the media itself.
#[derive(Debug, Clone)]
pub struct VirtualFile {
    pub name: String,
    pub url: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub content_type: &'static str,
}

impl VirtualFile {
    fn new(name: String, url: String, modified: DateTime<Utc>) -> Self {
        let size = url.len() as u64;
        Self {
            name,
            url,
            size,
            modified,
            content_type: STRM_CONTENT_TYPE,
        }
    }
}

pub struct DirectoryComposer<D, C> {
    debrid: Arc<D>,
    cast: Arc<C>,
    cache: Arc<LinkCache>,
}

impl<D, C> DirectoryComposer<D, C>
where
    D: DebridService,
    C: CastService,
    CastgateError: From<D::Error> + From<C::Error>,
{
    pub fn new(debrid: Arc<D>, cast: Arc<C>, cache: Arc<LinkCache>) -> Self {
        Self {
            debrid,
            cast,
            cache,
        }
    }

    /// The authoritative listing for one virtual directory.
    pub async fn list(&self, kind: DirectoryKind) -> Result<Vec<VirtualFile>, CastgateError> {
        match kind {
            DirectoryKind::Observed => self.observed_files().await,
            DirectoryKind::Casted => self.casted_files().await,
        }
    }

    /// Resolve a virtual filename to its content URL by recomputing the
    /// relevant listing.
    pub async fn resolve_virtual_file(
        &self,
        kind: DirectoryKind,
        name: &str,
    ) -> Result<String, CastgateError> {
        let files = self.list(kind).await?;
        files
            .into_iter()
            .find(|f| f.name == name)
            .map(|f| f.url)
            .ok_or_else(|| CastgateError::NotFound(name.to_string()))
    }

    /// Delete a casted link by its virtual filename. The name must carry
    /// the embedded hash and IMDb id; nothing is sent upstream otherwise.
    pub async fn delete_virtual_file(&self, name: &str) -> Result<(), CastgateError> {
        let (hash, imdb_id) = decode_cast_filename(name)
            .ok_or_else(|| CastgateError::MalformedIdentifier(name.to_string()))?;
        self.cast.delete_casted(&hash, &imdb_id).await?;
        Ok(())
    }

    /// Serve a cached URL, eagerly regenerating it when it has aged past
    /// the freshness window. A failed refresh falls back to the previous
    /// URL: a stale-but-previously-working link beats a hard error.
    pub async fn refresh_if_stale(&self, id: &str) -> Result<String, CastgateError> {
        let entry = self
            .cache
            .get(id)?
            .ok_or_else(|| CastgateError::NotFound(id.to_string()))?;

        if !cache::is_stale(&entry, Utc::now()) {
            return Ok(entry.unrestricted_url);
        }

        debug!(id, "cached URL is stale, regenerating");
        match self.debrid.unrestrict(&entry.original_link, None).await {
            Ok(fresh) => {
                self.cache.update_url(id, &fresh.download)?;
                Ok(fresh.download)
            }
            Err(e) => {
                warn!(id, error = %e, "refresh failed, serving previous URL");
                Ok(entry.unrestricted_url)
            }
        }
    }

    async fn observed_files(&self) -> Result<Vec<VirtualFile>, CastgateError> {
        let mut items = self.debrid.recent_downloads(OBSERVED_FETCH_LIMIT).await?;
        items.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));

        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for item in items {
            // First occurrence after the sort wins: it is the most
            // recently generated instance of that feed id.
            if !seen.insert(item.id.clone()) {
                continue;
            }
            if files.len() == OBSERVED_LIST_CAP {
                break;
            }

            // Passive observation keeps the cache warm without ever
            // stomping a user-curated entry.
            match stable_link_id(&item.link) {
                Some(id) => self.cache.put(
                    &id,
                    NewLink {
                        original_link: item.link.clone(),
                        unrestricted_url: item.download.clone(),
                        filename: item.filename.clone(),
                        manually_added: false,
                        filesize: item.filesize,
                    },
                )?,
                None => {
                    debug!(link = %item.link, "no stable id in feed link, skipping cache write");
                }
            }

            files.push(VirtualFile::new(
                format!("{}.strm", item.filename),
                item.download,
                item.generated_at,
            ));
        }
        Ok(materialize(files))
    }

    async fn casted_files(&self) -> Result<Vec<VirtualFile>, CastgateError> {
        let now = Utc::now();
        let mut links = self.cast.list_casted().await?;
        links.retain(|l| now - l.updated_at <= Duration::days(CASTED_WINDOW_DAYS));
        links.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let files = links
            .into_iter()
            .map(|l| {
                let name = cast_filename(&l);
                VirtualFile::new(name, l.url, l.updated_at)
            })
            .collect();
        Ok(materialize(files))
    }
}

/// Dedup by synthetic filename, keeping the most recently modified
/// instance: a link can be re-observed under a recycled name within the
/// cache window. Output is sorted newest first.
fn materialize(files: Vec<VirtualFile>) -> Vec<VirtualFile> {
    let mut by_name: HashMap<String, VirtualFile> = HashMap::new();
    for file in files {
        match by_name.get(&file.name) {
            Some(existing) if existing.modified >= file.modified => {}
            _ => {
                by_name.insert(file.name.clone(), file);
            }
        }
    }
    let mut out: Vec<VirtualFile> = by_name.into_values().collect();
    out.sort_by(|a, b| b.modified.cmp(&a.modified));
    out
}

/// Synthesize the casted virtual filename. The embedded hash and IMDb
/// id make the entry deletable later without a local index.
fn cast_filename(link: &CastedLink) -> String {
    let title = link
        .filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(&link.filename);
    format!("{title}{{hash-{}}}{{imdb-{}}}.strm", link.hash, link.imdb_id)
}

/// Decode the hash and IMDb id embedded by [`cast_filename`]. Returns
/// `None` when the name does not match the embedding pattern.
fn decode_cast_filename(name: &str) -> Option<(String, String)> {
    let stem = name.strip_suffix(".strm")?;
    let rest = stem.strip_suffix('}')?;
    let imdb_start = rest.rfind("{imdb-")?;
    let imdb = &rest[imdb_start + "{imdb-".len()..];
    let head = rest[..imdb_start].strip_suffix('}')?;
    let hash_start = head.rfind("{hash-")?;
    let hash = &head[hash_start + "{hash-".len()..];
    if hash.is_empty() || imdb.is_empty() || hash.contains('{') || imdb.contains('{') {
        return None;
    }
    Some((hash.to_string(), imdb.to_string()))
}
