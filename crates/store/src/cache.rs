//! Schema cache backends.

use contentpilot_core::cache::{Schema, SchemaCache};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct CacheEntry {
    schema: Schema,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// A process-local cache with per-entry expiry.
///
/// Expired entries are ignored on read and evicted on the next write.
#[derive(Default)]
pub struct InMemorySchemaCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemorySchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.values().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SchemaCache for InMemorySchemaCache {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn get(&self, key: &str) -> Option<Schema> {
        let now = Instant::now();
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.schema.clone())
    }

    fn set(&self, key: &str, value: Schema, ttl: Option<Duration>) {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, e| e.is_live(now));
        entries.insert(
            key.to_string(),
            CacheEntry {
                schema: value,
                expires_at: ttl.map(|ttl| now + ttl),
            },
        );
    }

    fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).is_some_and(|e| e.is_live(now))
    }

    fn delete(&self, key: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key).is_some()
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

/// A cache that stores nothing; every lookup re-derives the schema.
pub struct NoopSchemaCache;

impl SchemaCache for NoopSchemaCache {
    fn name(&self) -> &str {
        "none"
    }

    fn get(&self, _key: &str) -> Option<Schema> {
        None
    }

    fn set(&self, _key: &str, _value: Schema, _ttl: Option<Duration>) {}

    fn has(&self, _key: &str) -> bool {
        false
    }

    fn delete(&self, _key: &str) -> bool {
        false
    }

    fn clear(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentpilot_core::schema::{FieldDescriptor, ScalarType};

    fn schema() -> Schema {
        vec![FieldDescriptor::scalar("Title", "Title", ScalarType::Text)]
    }

    #[test]
    fn set_get_delete() {
        let cache = InMemorySchemaCache::new();
        cache.set("page_1", schema(), None);
        assert!(cache.has("page_1"));
        assert_eq!(cache.get("page_1"), Some(schema()));

        assert!(cache.delete("page_1"));
        assert!(!cache.delete("page_1"));
        assert!(cache.get("page_1").is_none());
    }

    #[test]
    fn expired_entries_are_invisible() {
        let cache = InMemorySchemaCache::new();
        cache.set("short", schema(), Some(Duration::ZERO));
        assert!(!cache.has("short"));
        assert!(cache.get("short").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_all() {
        let cache = InMemorySchemaCache::new();
        cache.set("a", schema(), None);
        cache.set("b", schema(), None);
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn noop_cache_always_produces() {
        let cache = NoopSchemaCache;
        let mut calls = 0;
        let mut producer = || {
            calls += 1;
            schema()
        };
        cache.get_or_create("k", None, &mut producer);
        cache.get_or_create("k", None, &mut producer);
        assert_eq!(calls, 2);
    }
}
