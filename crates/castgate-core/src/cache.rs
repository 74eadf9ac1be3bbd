//! Link cache: maps a stable link identifier to cached resolution data.
//!
//! The cache owns the freshness and retention policy and the
//! manual-over-passive precedence rule. Persistence is delegated to a
//! pluggable [`LinkStore`] backing selected at startup by configuration.

pub mod json_store;
pub mod sqlite_store;
pub mod store;

pub use json_store::JsonStore;
pub use sqlite_store::SqliteStore;
pub use store::LinkStore;

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::{AppConfig, StorageBackend};
use crate::error::CastgateError;
use crate::models::{LinkEntry, NewLink};

/// Days after which an entry is purged regardless of URL freshness.
const RETENTION_DAYS: i64 = 7;

/// Hours after which a cached URL is regenerated before being served.
const FRESHNESS_HOURS: i64 = 48;

/// True when the entry has outlived the retention window. An entry
/// exactly at the boundary is retained.
pub fn expired(entry: &LinkEntry, now: DateTime<Utc>) -> bool {
    now - entry.generated_at > Duration::days(RETENTION_DAYS)
}

/// True when the entry's URL has aged past the freshness window. An
/// entry exactly at the boundary is still fresh.
pub fn is_stale(entry: &LinkEntry, now: DateTime<Utc>) -> bool {
    now - entry.generated_at > Duration::hours(FRESHNESS_HOURS)
}

/// The link cache. The mutex serializes whole read-modify-write cycles,
/// which the document-store backing requires for correctness.
pub struct LinkCache {
    store: Mutex<Box<dyn LinkStore>>,
}

impl LinkCache {
    pub fn new(store: Box<dyn LinkStore>) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Open the backing named by the configuration.
    pub fn open(config: &AppConfig) -> Result<Self, CastgateError> {
        let dir = config.ensure_store_dir()?;
        let store: Box<dyn LinkStore> = match config.storage.backend {
            StorageBackend::Sqlite => Box::new(SqliteStore::open(&dir.join("links.db"))?),
            StorageBackend::Json => Box::new(JsonStore::new(dir.join("links.json"))),
        };
        Ok(Self::new(store))
    }

    pub fn get(&self, id: &str) -> Result<Option<LinkEntry>, CastgateError> {
        self.lock().get(id)
    }

    /// Write or refresh an entry.
    ///
    /// A passive write over a manually-added entry does not touch the
    /// payload; it only bumps `generated_at`, keeping the user-curated
    /// entry alive in listings driven by passive polling without letting
    /// the poll stomp its canonical URL.
    pub fn put(&self, id: &str, link: NewLink) -> Result<(), CastgateError> {
        let mut store = self.lock();
        let now = Utc::now();

        if !link.manually_added {
            if let Some(mut existing) = store.get(id)? {
                if existing.manually_added {
                    debug!(id, "passive write over manual entry, extending retention only");
                    existing.generated_at = now;
                    return store.put(id, &existing);
                }
            }
        }

        store.put(
            id,
            &LinkEntry {
                original_link: link.original_link,
                unrestricted_url: link.unrestricted_url,
                generated_at: now,
                filename: link.filename,
                manually_added: link.manually_added,
                filesize: link.filesize,
            },
        )
    }

    /// In-place URL refresh. A missing entry is a no-op, not an error.
    pub fn update_url(&self, id: &str, new_url: &str) -> Result<(), CastgateError> {
        let mut store = self.lock();
        match store.get(id)? {
            Some(mut entry) => {
                entry.unrestricted_url = new_url.to_string();
                entry.generated_at = Utc::now();
                store.put(id, &entry)
            }
            None => Ok(()),
        }
    }

    /// All live entries, pruning expired ones as a side effect.
    pub fn list_all(&self) -> Result<Vec<(String, LinkEntry)>, CastgateError> {
        let mut store = self.lock();
        let now = Utc::now();
        let mut out = Vec::new();
        for (id, entry) in store.entries()? {
            if expired(&entry, now) {
                debug!(id = %id, "pruning expired link entry");
                store.remove(&id)?;
            } else {
                out.push((id, entry));
            }
        }
        Ok(out)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Box<dyn LinkStore>> {
        // A poisoned lock only means another thread panicked mid-write;
        // the store itself stays consistent, so keep going.
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_link(url: &str, manual: bool) -> NewLink {
        NewLink {
            original_link: "https://debrid.example/d/ABC".into(),
            unrestricted_url: url.into(),
            filename: "file.mkv".into(),
            manually_added: manual,
            filesize: 100,
        }
    }

    fn aged_entry(manual: bool, age: Duration) -> LinkEntry {
        LinkEntry {
            original_link: "https://debrid.example/d/ABC".into(),
            unrestricted_url: "https://cdn.debrid.example/dl/original".into(),
            generated_at: Utc::now() - age,
            filename: "curated.mkv".into(),
            manually_added: manual,
            filesize: 100,
        }
    }

    fn memory_cache() -> LinkCache {
        LinkCache::new(Box::new(SqliteStore::open_memory().unwrap()))
    }

    #[test]
    fn test_put_and_get() {
        let cache = memory_cache();
        cache.put("ABC", new_link("https://cdn.debrid.example/dl/1", true)).unwrap();

        let entry = cache.get("ABC").unwrap().unwrap();
        assert_eq!(entry.unrestricted_url, "https://cdn.debrid.example/dl/1");
        assert!(entry.manually_added);
        assert_eq!(cache.get("missing").unwrap(), None);
    }

    #[test]
    fn test_passive_write_never_overwrites_manual_payload() {
        let mut store = SqliteStore::open_memory().unwrap();
        let seeded = aged_entry(true, Duration::days(3));
        store.put("ABC", &seeded).unwrap();
        let cache = LinkCache::new(Box::new(store));

        cache
            .put("ABC", new_link("https://cdn.debrid.example/dl/other", false))
            .unwrap();

        let entry = cache.get("ABC").unwrap().unwrap();
        assert_eq!(entry.original_link, seeded.original_link);
        assert_eq!(entry.unrestricted_url, seeded.unrestricted_url);
        assert_eq!(entry.filename, seeded.filename);
        assert_eq!(entry.filesize, seeded.filesize);
        assert!(entry.manually_added);
        // Retention was extended.
        assert!(entry.generated_at > seeded.generated_at);
    }

    #[test]
    fn test_manual_write_replaces_passive_entry() {
        let cache = memory_cache();
        cache.put("ABC", new_link("https://cdn.debrid.example/dl/passive", false)).unwrap();
        cache.put("ABC", new_link("https://cdn.debrid.example/dl/manual", true)).unwrap();

        let entry = cache.get("ABC").unwrap().unwrap();
        assert_eq!(entry.unrestricted_url, "https://cdn.debrid.example/dl/manual");
        assert!(entry.manually_added);
    }

    #[test]
    fn test_passive_write_replaces_passive_entry() {
        let cache = memory_cache();
        cache.put("ABC", new_link("https://cdn.debrid.example/dl/1", false)).unwrap();
        cache.put("ABC", new_link("https://cdn.debrid.example/dl/2", false)).unwrap();

        let entry = cache.get("ABC").unwrap().unwrap();
        assert_eq!(entry.unrestricted_url, "https://cdn.debrid.example/dl/2");
        assert!(!entry.manually_added);
    }

    #[test]
    fn test_update_url_refreshes_in_place() {
        let mut store = SqliteStore::open_memory().unwrap();
        let seeded = aged_entry(true, Duration::days(3));
        store.put("ABC", &seeded).unwrap();
        let cache = LinkCache::new(Box::new(store));

        cache.update_url("ABC", "https://cdn.debrid.example/dl/fresh").unwrap();

        let entry = cache.get("ABC").unwrap().unwrap();
        assert_eq!(entry.unrestricted_url, "https://cdn.debrid.example/dl/fresh");
        assert!(entry.generated_at > seeded.generated_at);
        assert!(entry.manually_added);
    }

    #[test]
    fn test_update_url_missing_entry_is_noop() {
        let cache = memory_cache();
        cache.update_url("missing", "https://cdn.debrid.example/dl/x").unwrap();
        assert_eq!(cache.get("missing").unwrap(), None);
    }

    #[test]
    fn test_list_all_prunes_expired_entries() {
        let mut store = SqliteStore::open_memory().unwrap();
        store.put("old", &aged_entry(true, Duration::days(8))).unwrap();
        store.put("live", &aged_entry(false, Duration::days(2))).unwrap();
        let cache = LinkCache::new(Box::new(store));

        let all = cache.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, "live");
        // The expired entry was removed from the backing, not just hidden.
        assert_eq!(cache.get("old").unwrap(), None);
    }

    #[test]
    fn test_retention_boundary() {
        let entry = aged_entry(true, Duration::zero());
        assert!(!expired(&entry, entry.generated_at + Duration::days(7)));
        assert!(expired(
            &entry,
            entry.generated_at + Duration::days(7) + Duration::microseconds(1)
        ));
    }

    #[test]
    fn test_freshness_boundary() {
        let entry = aged_entry(true, Duration::zero());
        assert!(!is_stale(&entry, entry.generated_at + Duration::hours(48)));
        assert!(is_stale(
            &entry,
            entry.generated_at + Duration::hours(48) + Duration::microseconds(1)
        ));
    }

    #[test]
    fn test_identical_semantics_on_json_backing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.json");

        let mut store = JsonStore::new(path.clone());
        store.put("ABC", &aged_entry(true, Duration::days(3))).unwrap();
        let cache = LinkCache::new(Box::new(store));

        cache
            .put("ABC", new_link("https://cdn.debrid.example/dl/other", false))
            .unwrap();

        let entry = cache.get("ABC").unwrap().unwrap();
        assert_eq!(entry.filename, "curated.mkv");
        assert!(entry.manually_added);
    }
}
