//! The content populator.

use crate::tags;
use contentpilot_config::PopulateConfig;
use contentpilot_core::content::{ContentModel, ContentStore, ObjectId, RelationCardinality, RelationMeta};
use contentpilot_core::error::{PopulateError, StoreError};
use contentpilot_core::transaction::Transaction;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// Writes recovered value trees onto live objects.
pub struct Populator {
    model: Arc<dyn ContentModel>,
    config: PopulateConfig,
    tag_keys: Vec<String>,
    excluded: HashSet<String>,
}

/// Counters for one population run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PopulateStats {
    /// Objects created (related objects, children, areas, blocks).
    pub created: usize,
    /// Scalar values written.
    pub written: usize,
    /// Keys, items or entries skipped.
    pub skipped: usize,
}

impl Populator {
    pub fn new(model: Arc<dyn ContentModel>, config: PopulateConfig) -> Self {
        let tag_keys = tags::tag_keys(&config.extra_type_tag_keys);
        Self {
            model,
            config,
            tag_keys,
            excluded: HashSet::new(),
        }
    }

    /// Never write these field names, even when a reply carries them.
    pub fn excluding(mut self, fields: impl IntoIterator<Item = String>) -> Self {
        self.excluded.extend(fields);
        self
    }

    /// Type-tag keys in lookup order.
    pub fn type_tag_keys(&self) -> &[String] {
        &self.tag_keys
    }

    /// Apply `values` to object `id` inside one transaction.
    ///
    /// Any store failure rolls back every write of this call and is returned
    /// as [`PopulateError::RolledBack`].
    pub fn populate(
        &self,
        store: &mut dyn ContentStore,
        id: ObjectId,
        values: &Map<String, Value>,
        persist: bool,
    ) -> Result<ObjectId, PopulateError> {
        self.populate_with_stats(store, id, values, persist)
            .map(|_| id)
    }

    /// Like [`populate`](Self::populate), returning what was done.
    pub fn populate_with_stats(
        &self,
        store: &mut dyn ContentStore,
        id: ObjectId,
        values: &Map<String, Value>,
        persist: bool,
    ) -> Result<PopulateStats, PopulateError> {
        let mut tx = Transaction::begin(store)?;

        let mut pass = Pass {
            populator: self,
            store: &mut *tx,
            stats: PopulateStats::default(),
        };
        match pass.apply(id, values, persist) {
            Ok(()) => {
                let stats = pass.stats;
                tx.commit()?;
                tracing::info!(
                    object = id,
                    created = stats.created,
                    written = stats.written,
                    skipped = stats.skipped,
                    "Content populated"
                );
                Ok(stats)
            }
            Err(source) => {
                tracing::error!(object = id, error = %source, "Population failed, rolling back");
                if let Err(e) = tx.rollback() {
                    tracing::error!(object = id, error = %e, "Rollback failed");
                }
                Err(PopulateError::RolledBack { object: id, source })
            }
        }
    }
}

/// One population run over a store.
struct Pass<'a> {
    populator: &'a Populator,
    store: &'a mut dyn ContentStore,
    stats: PopulateStats,
}

impl Pass<'_> {
    fn apply(&mut self, id: ObjectId, values: &Map<String, Value>, persist: bool) -> Result<(), StoreError> {
        let type_name = self.store.type_of(id)?;

        for (key, value) in values {
            if is_blank(value) {
                tracing::debug!(object = id, key = %key, "Empty value, skipping");
                self.stats.skipped += 1;
                continue;
            }

            let relation = self.populator.model.relation(&type_name, key).cloned();
            match relation {
                Some(relation) if !self.populator.model.is_instantiable(&relation.target) => {
                    tracing::warn!(
                        object = id,
                        relation = %relation.name,
                        target = %relation.target,
                        "Relation target is unknown or abstract, skipping"
                    );
                    self.stats.skipped += 1;
                }
                Some(relation) => match relation.cardinality {
                    RelationCardinality::Single => self.single_relation(id, &relation, value)?,
                    RelationCardinality::MultiOwned | RelationCardinality::MultiAssociated => {
                        self.multi_relation(id, &type_name, &relation, value)?
                    }
                    RelationCardinality::BlockArea => {
                        self.block_area(id, &type_name, &relation, value)?
                    }
                },
                None => self.scalar(id, &type_name, key, value)?,
            }
        }

        if persist {
            self.store.persist(id)?;
        }
        Ok(())
    }

    fn scalar(&mut self, id: ObjectId, type_name: &str, key: &str, value: &Value) -> Result<(), StoreError> {
        if value.is_object() || value.is_array() {
            tracing::warn!(object = id, key = %key, "Structured value for a scalar field, skipping");
            self.stats.skipped += 1;
            return Ok(());
        }
        if self.populator.excluded.contains(key) {
            tracing::warn!(object = id, key = %key, "Excluded field, skipping");
            self.stats.skipped += 1;
            return Ok(());
        }
        if self.populator.model.field(type_name, key).is_none() {
            tracing::debug!(type_name = %type_name, key = %key, "Writing undeclared field");
        }

        let value = self.coerce_choice(type_name, key, value);
        self.store.write(id, key, value)?;
        self.stats.written += 1;
        Ok(())
    }

    /// A choice label is written as its option value.
    fn coerce_choice(&self, type_name: &str, key: &str, value: &Value) -> Value {
        let coerced = value.as_str().and_then(|text| {
            let field = self.populator.model.field(type_name, key)?;
            if field.options.iter().any(|o| o.value == text) {
                return None;
            }
            field
                .options
                .iter()
                .find(|o| o.label.eq_ignore_ascii_case(text.trim()))
                .map(|o| Value::String(o.value.clone()))
        });
        coerced.unwrap_or_else(|| value.clone())
    }

    fn single_relation(&mut self, id: ObjectId, relation: &RelationMeta, value: &Value) -> Result<(), StoreError> {
        let Some(fields) = value.as_object() else {
            tracing::debug!(object = id, relation = %relation.name, "Single relation value is not a mapping, skipping");
            self.stats.skipped += 1;
            return Ok(());
        };

        let child = self.create(&relation.target)?;
        self.apply(child, fields, true)?;
        self.store.write(id, &relation.name, Value::from(child))?;
        Ok(())
    }

    fn multi_relation(
        &mut self,
        id: ObjectId,
        owner_type: &str,
        relation: &RelationMeta,
        value: &Value,
    ) -> Result<(), StoreError> {
        let Some(items) = value.as_array() else {
            tracing::debug!(object = id, relation = %relation.name, "Multi relation value is not a list, skipping");
            self.stats.skipped += 1;
            return Ok(());
        };

        if !self.store.is_persisted(id)? {
            self.store.persist(id)?;
        }

        let owning_key = (relation.cardinality == RelationCardinality::MultiOwned)
            .then(|| self.populator.model.owning_key(owner_type, &relation.name));

        for (index, item) in items.iter().enumerate() {
            let Some(fields) = item.as_object().filter(|f| !f.is_empty()) else {
                tracing::debug!(object = id, relation = %relation.name, index, "Item is not a mapping, skipping");
                self.stats.skipped += 1;
                continue;
            };

            let child = self.create(&relation.target)?;
            self.apply(child, fields, false)?;
            if let Some(key) = &owning_key {
                self.store.write(child, key, Value::from(id))?;
            }
            self.store.persist(child)?;
            if owning_key.is_none() {
                self.store.add_related(id, &relation.name, child)?;
            }
        }
        Ok(())
    }

    fn block_area(
        &mut self,
        id: ObjectId,
        owner_type: &str,
        relation: &RelationMeta,
        value: &Value,
    ) -> Result<(), StoreError> {
        let Some(entries) = value.as_array() else {
            tracing::debug!(object = id, relation = %relation.name, "Block area value is not a list, skipping");
            self.stats.skipped += 1;
            return Ok(());
        };

        let populator = self.populator;
        let container = self.ensure_area(id, relation)?;
        let allowed = populator.model.allowed_block_types(owner_type, &relation.name);
        let mut sort: u64 = 0;

        for (index, entry) in entries.iter().enumerate() {
            let Some(fields) = entry.as_object() else {
                tracing::warn!(object = id, area = %relation.name, index, "Block entry is not a mapping, skipping");
                self.stats.skipped += 1;
                continue;
            };
            let Some(tag) = tags::find_tag(&populator.tag_keys, fields) else {
                tracing::warn!(object = id, area = %relation.name, index, "Block entry has no type tag, skipping");
                self.stats.skipped += 1;
                continue;
            };
            let Some(block_type) = tags::resolve(populator.model.as_ref(), tag, &allowed) else {
                tracing::warn!(
                    object = id,
                    area = %relation.name,
                    index,
                    tag = %tag,
                    "Block type is unknown or not allowed here, skipping"
                );
                self.stats.skipped += 1;
                continue;
            };

            sort += 1;
            let block = self.create(block_type)?;
            let rest: Map<String, Value> = fields
                .iter()
                .filter(|(key, _)| !populator.tag_keys.contains(*key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            self.apply(block, &rest, false)?;
            self.store
                .write(block, &populator.config.block_parent_field, Value::from(container))?;
            self.store
                .write(block, &populator.config.sort_field, Value::from(sort))?;
            self.store.persist(block)?;
            tracing::debug!(block, block_type = %block_type, sort, "Block created");
        }
        Ok(())
    }

    /// The parent's area container, created and linked when missing.
    fn ensure_area(&mut self, id: ObjectId, relation: &RelationMeta) -> Result<ObjectId, StoreError> {
        if let Some(existing) = self.store.read(id, &relation.name)?.and_then(|v| v.as_u64()) {
            match self.store.type_of(existing) {
                Ok(_) => return Ok(existing),
                Err(StoreError::NotFound(_)) => {
                    tracing::warn!(object = id, area = %relation.name, container = existing, "Area container is missing, creating a new one");
                }
                Err(e) => return Err(e),
            }
        }

        let area = self.create(&relation.target)?;
        self.store.persist(area)?;
        self.store.write(id, &relation.name, Value::from(area))?;
        Ok(area)
    }

    fn create(&mut self, type_name: &str) -> Result<ObjectId, StoreError> {
        let id = self.store.create(type_name)?;
        self.stats.created += 1;
        Ok(id)
    }
}

/// Null, empty or whitespace-only strings, and empty lists or mappings.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
