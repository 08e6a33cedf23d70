//! Schema cache contract.
//!
//! Descriptor trees are cached per (type, identity, last-modified marker).
//! The cache is read-mostly; concurrent writers only ever store the same
//! derived schema, so overwrites are harmless.

use crate::schema::FieldDescriptor;
use std::time::Duration;

/// A cached schema: the top-level descriptor list of one content object.
pub type Schema = Vec<FieldDescriptor>;

/// The core SchemaCache trait.
///
/// Implementations: in-memory (TTL map), none (no-op).
pub trait SchemaCache: Send + Sync {
    /// The cache name (e.g., "in_memory", "none").
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Option<Schema>;

    /// Store a schema; `None` ttl means no expiry.
    fn set(&self, key: &str, value: Schema, ttl: Option<Duration>);

    fn has(&self, key: &str) -> bool;

    /// Remove one entry; returns whether it existed.
    fn delete(&self, key: &str) -> bool;

    /// Drop every entry.
    fn clear(&self);

    /// Return the cached schema, or produce, store and return it.
    fn get_or_create(
        &self,
        key: &str,
        ttl: Option<Duration>,
        producer: &mut dyn FnMut() -> Schema,
    ) -> Schema {
        if let Some(cached) = self.get(key) {
            tracing::debug!(key = %key, cache = %self.name(), "Schema cache hit");
            return cached;
        }
        tracing::debug!(key = %key, cache = %self.name(), "Schema cache miss");
        let schema = producer();
        self.set(key, schema.clone(), ttl);
        schema
    }
}
