//! In-memory content store: useful for testing, previews and the CLI.
//!
//! Transactions are snapshots: `begin` clones the graph, `rollback` restores
//! the clone, `commit` discards it. One transaction may be open at a time.

use chrono::{DateTime, Utc};
use contentpilot_core::content::{ContentModel, ContentStore, ObjectId};
use contentpilot_core::error::StoreError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One object in the graph.
#[derive(Debug, Clone, Serialize)]
pub struct StoredObject {
    pub id: ObjectId,
    pub type_name: String,
    pub fields: Map<String, Value>,
    /// Association-style relation members, by relation name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub associations: BTreeMap<String, Vec<ObjectId>>,
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    /// Incremented on every persist.
    pub version: u64,
}

#[derive(Debug, Clone, Default)]
struct Graph {
    objects: BTreeMap<ObjectId, StoredObject>,
    next_id: ObjectId,
}

/// An object graph that lives in a map.
pub struct InMemoryStore {
    model: Arc<dyn ContentModel>,
    graph: Graph,
    snapshot: Option<Graph>,
}

impl InMemoryStore {
    pub fn new(model: Arc<dyn ContentModel>) -> Self {
        Self {
            model,
            graph: Graph {
                objects: BTreeMap::new(),
                next_id: 1,
            },
            snapshot: None,
        }
    }

    pub fn model(&self) -> &Arc<dyn ContentModel> {
        &self.model
    }

    pub fn object(&self, id: ObjectId) -> Option<&StoredObject> {
        self.graph.objects.get(&id)
    }

    /// Ids of every object of exactly this type, in creation order.
    pub fn objects_of_type(&self, type_name: &str) -> Vec<ObjectId> {
        self.graph
            .objects
            .values()
            .filter(|o| o.type_name == type_name)
            .map(|o| o.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.graph.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.objects.is_empty()
    }

    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Every object as JSON, in creation order.
    pub fn dump(&self) -> Value {
        Value::Array(
            self.graph
                .objects
                .values()
                .filter_map(|o| serde_json::to_value(o).ok())
                .collect(),
        )
    }

    fn get(&self, id: ObjectId) -> Result<&StoredObject, StoreError> {
        self.graph.objects.get(&id).ok_or(StoreError::NotFound(id))
    }

    fn get_mut(&mut self, id: ObjectId) -> Result<&mut StoredObject, StoreError> {
        self.graph.objects.get_mut(&id).ok_or(StoreError::NotFound(id))
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("objects", &self.graph.objects.len())
            .field("next_id", &self.graph.next_id)
            .field("in_transaction", &self.in_transaction())
            .finish_non_exhaustive()
    }
}

impl ContentStore for InMemoryStore {
    fn type_of(&self, id: ObjectId) -> Result<String, StoreError> {
        Ok(self.get(id)?.type_name.clone())
    }

    fn read(&self, id: ObjectId, field: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.get(id)?.fields.get(field).cloned())
    }

    fn write(&mut self, id: ObjectId, field: &str, value: Value) -> Result<(), StoreError> {
        self.get_mut(id)?.fields.insert(field.to_string(), value);
        Ok(())
    }

    fn create(&mut self, type_name: &str) -> Result<ObjectId, StoreError> {
        if self.model.type_info(type_name).is_none() {
            return Err(StoreError::UnknownType(type_name.to_string()));
        }
        if !self.model.is_instantiable(type_name) {
            return Err(StoreError::NotInstantiable(type_name.to_string()));
        }

        let id = self.graph.next_id;
        self.graph.next_id += 1;
        self.graph.objects.insert(
            id,
            StoredObject {
                id,
                type_name: type_name.to_string(),
                fields: Map::new(),
                associations: BTreeMap::new(),
                persisted: false,
                last_modified: None,
                version: 0,
            },
        );
        tracing::debug!(object = id, type_name = %type_name, "Object created");
        Ok(id)
    }

    fn persist(&mut self, id: ObjectId) -> Result<(), StoreError> {
        let object = self.get_mut(id)?;
        object.persisted = true;
        object.version += 1;
        object.last_modified = Some(Utc::now());
        Ok(())
    }

    fn is_persisted(&self, id: ObjectId) -> Result<bool, StoreError> {
        Ok(self.get(id)?.persisted)
    }

    fn add_related(
        &mut self,
        owner: ObjectId,
        relation: &str,
        child: ObjectId,
    ) -> Result<(), StoreError> {
        self.get(child)?;
        let members = self
            .get_mut(owner)?
            .associations
            .entry(relation.to_string())
            .or_default();
        if !members.contains(&child) {
            members.push(child);
        }
        Ok(())
    }

    fn related(&self, owner: ObjectId, relation: &str) -> Result<Vec<ObjectId>, StoreError> {
        Ok(self
            .get(owner)?
            .associations
            .get(relation)
            .cloned()
            .unwrap_or_default())
    }

    fn last_modified(&self, id: ObjectId) -> Result<Option<String>, StoreError> {
        let object = self.get(id)?;
        Ok(object
            .last_modified
            .map(|ts| format!("{}-v{}", ts.timestamp_micros(), object.version)))
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if self.snapshot.is_some() {
            return Err(StoreError::Transaction("a transaction is already open".into()));
        }
        self.snapshot = Some(self.graph.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.snapshot
            .take()
            .map(|_| ())
            .ok_or_else(|| StoreError::Transaction("commit without an open transaction".into()))
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        let snapshot = self.snapshot.take().ok_or_else(|| {
            StoreError::Transaction("rollback without an open transaction".into())
        })?;
        self.graph = snapshot;
        tracing::debug!("Transaction rolled back");
        Ok(())
    }
}
