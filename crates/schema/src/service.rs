//! Cached schema lookups for live objects.

use crate::introspector::Introspector;
use contentpilot_config::CacheConfig;
use contentpilot_core::cache::{Schema, SchemaCache};
use contentpilot_core::content::{ContentStore, ObjectId};
use contentpilot_core::error::StoreError;
use std::sync::Arc;

/// Introspection behind a [`SchemaCache`].
///
/// Entries are keyed by type, identity and last-modified marker, so a
/// persisted change to the object yields a new key.
pub struct SchemaService {
    introspector: Introspector,
    cache: Arc<dyn SchemaCache>,
    config: CacheConfig,
}

impl SchemaService {
    pub fn new(introspector: Introspector, cache: Arc<dyn SchemaCache>, config: CacheConfig) -> Self {
        Self {
            introspector,
            cache,
            config,
        }
    }

    pub fn introspector(&self) -> &Introspector {
        &self.introspector
    }

    /// The schema tree for a live object.
    pub fn describe(&self, store: &dyn ContentStore, id: ObjectId) -> Result<Schema, StoreError> {
        let type_name = store.type_of(id)?;
        if !self.config.enabled {
            return Ok(self.introspector.introspect(&type_name));
        }

        let key = self.key_for(store, id, &type_name)?;
        Ok(self
            .cache
            .get_or_create(&key, self.config.ttl(), &mut || self.introspector.introspect(&type_name)))
    }

    /// Drop the cached schema of one object. Returns whether an entry existed.
    pub fn invalidate(&self, store: &dyn ContentStore, id: ObjectId) -> Result<bool, StoreError> {
        let type_name = store.type_of(id)?;
        let key = self.key_for(store, id, &type_name)?;
        let removed = self.cache.delete(&key);
        tracing::debug!(key = %key, removed, "Schema cache entry invalidated");
        Ok(removed)
    }

    /// Drop every cached schema.
    pub fn clear(&self) {
        self.cache.clear();
        tracing::info!(cache = %self.cache.name(), "Schema cache cleared");
    }

    fn key_for(&self, store: &dyn ContentStore, id: ObjectId, type_name: &str) -> Result<String, StoreError> {
        let marker = store.last_modified(id)?;
        Ok(cache_key(&self.config.key_prefix, type_name, id, marker.as_deref()))
    }
}

/// Deterministic cache key. Characters outside `[A-Za-z0-9_.-]` become `_`.
pub fn cache_key(prefix: &str, type_name: &str, id: ObjectId, marker: Option<&str>) -> String {
    let raw = format!("{prefix}_{type_name}_{id}_{}", marker.unwrap_or("new"));
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
