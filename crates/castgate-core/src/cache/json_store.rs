use std::collections::HashMap;
use std::path::PathBuf;

use super::store::LinkStore;
use crate::error::CastgateError;
use crate::models::LinkEntry;

/// Single-writer local document store: one JSON file holding every
/// entry, loaded lazily into memory and rewritten wholesale on each
/// mutation. [`crate::cache::LinkCache`] serializes the load-mutate-save
/// cycles; this type assumes it is the only writer of its file.
pub struct JsonStore {
    path: PathBuf,
    cache: Option<HashMap<String, LinkEntry>>,
}

impl JsonStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path, cache: None }
    }

    fn ensure_loaded(&mut self) -> Result<(), CastgateError> {
        if self.cache.is_none() {
            let map = if self.path.exists() {
                serde_json::from_str(&std::fs::read_to_string(&self.path)?)?
            } else {
                HashMap::new()
            };
            self.cache = Some(map);
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), CastgateError> {
        let map = match &self.cache {
            Some(map) => map,
            None => return Ok(()),
        };
        let json = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl LinkStore for JsonStore {
    fn get(&mut self, id: &str) -> Result<Option<LinkEntry>, CastgateError> {
        self.ensure_loaded()?;
        Ok(self.cache.as_ref().and_then(|m| m.get(id).cloned()))
    }

    fn put(&mut self, id: &str, entry: &LinkEntry) -> Result<(), CastgateError> {
        self.ensure_loaded()?;
        if let Some(map) = self.cache.as_mut() {
            map.insert(id.to_string(), entry.clone());
        }
        self.persist()
    }

    fn remove(&mut self, id: &str) -> Result<(), CastgateError> {
        self.ensure_loaded()?;
        if let Some(map) = self.cache.as_mut() {
            map.remove(id);
        }
        self.persist()
    }

    fn entries(&mut self) -> Result<Vec<(String, LinkEntry)>, CastgateError> {
        self.ensure_loaded()?;
        Ok(self
            .cache
            .as_ref()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }
}
