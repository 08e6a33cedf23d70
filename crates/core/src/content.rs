//! Content contracts: the object model ContentPilot reads from and writes to.
//!
//! Two traits split the external CMS into what it *declares* and what it
//! *holds*:
//!
//! - [`ContentModel`]: type metadata: declared fields, relations with their
//!   cardinality, inheritance, block types and per-field block constraints.
//! - [`ContentStore`]: live objects: read, write, create, persist, plus the
//!   transaction hooks used by the populator.
//!
//! Relation cardinality is declared on [`RelationMeta`] and resolved once, so
//! every consumer dispatches with a plain `match`.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identity of a content object inside a [`ContentStore`].
pub type ObjectId = u64;

/// How a relation holds its related objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationCardinality {
    /// Zero or one related object, referenced by identity from the owner.
    Single,
    /// Many children, each pointing back to the owner through an owning key.
    MultiOwned,
    /// Many related objects joined through an association collection.
    MultiAssociated,
    /// An area container holding an ordered list of typed blocks.
    BlockArea,
}

impl RelationCardinality {
    /// Whether the relation holds a list of objects.
    pub fn is_many(&self) -> bool {
        matches!(self, Self::MultiOwned | Self::MultiAssociated)
    }
}

/// One entry of an enumerated choice set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub value: String,
}

/// A declared scalar field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,

    /// Storage type as the model declares it, e.g. `Varchar(255)`, `HTMLText`.
    pub field_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
}

impl FieldMeta {
    /// The storage type without parameters: `Varchar(255)` → `Varchar`.
    pub fn base_type(&self) -> &str {
        match self.field_type.find('(') {
            Some(idx) => self.field_type[..idx].trim(),
            None => self.field_type.trim(),
        }
    }
}

/// A declared relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationMeta {
    pub name: String,

    pub cardinality: RelationCardinality,

    /// Type of the related object (the area container type for block areas).
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Field on the child that points back at the owner (`MultiOwned` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owning_key: Option<String>,

    /// Explicitly configured block types (`BlockArea` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_types: Option<Vec<String>>,
}

/// Declared metadata of one content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,

    #[serde(default)]
    pub fields: Vec<FieldMeta>,

    #[serde(default)]
    pub relations: Vec<RelationMeta>,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            title: None,
            description: None,
            options: Vec::new(),
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add choice options from `(label, value)` pairs.
    pub fn with_options<L: Into<String>, V: Into<String>>(
        mut self,
        options: impl IntoIterator<Item = (L, V)>,
    ) -> Self {
        self.options.extend(options.into_iter().map(|(label, value)| ChoiceOption {
            label: label.into(),
            value: value.into(),
        }));
        self
    }
}

impl RelationMeta {
    pub fn new(
        name: impl Into<String>,
        cardinality: RelationCardinality,
        target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            cardinality,
            target: target.into(),
            title: None,
            description: None,
            owning_key: None,
            allowed_types: None,
        }
    }

    pub fn owned_by(mut self, owning_key: impl Into<String>) -> Self {
        self.owning_key = Some(owning_key.into());
        self
    }

    pub fn allowing<T: Into<String>>(mut self, types: impl IntoIterator<Item = T>) -> Self {
        self.allowed_types = Some(types.into_iter().map(Into::into).collect());
        self
    }
}

impl TypeInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            title: None,
            description: None,
            is_abstract: false,
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn field(mut self, field: FieldMeta) -> Self {
        self.fields.push(field);
        self
    }

    pub fn relation(mut self, relation: RelationMeta) -> Self {
        self.relations.push(relation);
        self
    }
}

/// Type metadata of the content system.
///
/// Implementors provide the three lookups; everything else (inheritance,
/// block eligibility, owning keys) is derived from them.
pub trait ContentModel: Send + Sync {
    /// Metadata for a type, if the type is known.
    fn type_info(&self, name: &str) -> Option<&TypeInfo>;

    /// All known type names, in declaration order.
    fn type_names(&self) -> Vec<&str>;

    /// The base type every block type descends from, if the model has blocks.
    fn block_base(&self) -> Option<&str>;

    /// The type followed by its ancestors, most-derived first.
    ///
    /// Stops at an unknown parent or a parent cycle.
    fn ancestry<'a>(&'a self, name: &'a str) -> Vec<&'a TypeInfo> {
        let mut chain = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = Some(name);
        while let Some(type_name) = current {
            if !seen.insert(type_name) {
                break;
            }
            match self.type_info(type_name) {
                Some(info) => {
                    chain.push(info);
                    current = info.parent.as_deref();
                }
                None => break,
            }
        }
        chain
    }

    /// Inheritance-style "is-a" check; a type is-a itself.
    fn is_a(&self, name: &str, ancestor: &str) -> bool {
        self.ancestry(name).iter().any(|t| t.name == ancestor)
    }

    /// Declared fields including inherited ones, root type first.
    fn fields_of<'a>(&'a self, name: &'a str) -> Vec<&'a FieldMeta> {
        self.ancestry(name)
            .into_iter()
            .rev()
            .flat_map(|t| t.fields.iter())
            .collect()
    }

    /// Declared relations including inherited ones, root type first.
    fn relations_of<'a>(&'a self, name: &'a str) -> Vec<&'a RelationMeta> {
        self.ancestry(name)
            .into_iter()
            .rev()
            .flat_map(|t| t.relations.iter())
            .collect()
    }

    /// A single field, searched from the most-derived type upwards.
    fn field<'a>(&'a self, type_name: &'a str, field: &str) -> Option<&'a FieldMeta> {
        self.ancestry(type_name)
            .into_iter()
            .find_map(|t| t.fields.iter().find(|f| f.name == field))
    }

    /// A single relation, searched from the most-derived type upwards.
    fn relation<'a>(&'a self, type_name: &'a str, relation: &str) -> Option<&'a RelationMeta> {
        self.ancestry(type_name)
            .into_iter()
            .find_map(|t| t.relations.iter().find(|r| r.name == relation))
    }

    fn is_instantiable(&self, name: &str) -> bool {
        self.type_info(name).is_some_and(|t| !t.is_abstract)
    }

    fn is_block_type(&self, name: &str) -> bool {
        self.block_base().is_some_and(|base| self.is_a(name, base))
    }

    /// Every concrete block type known to the model.
    fn concrete_block_types(&self) -> Vec<String> {
        self.type_names()
            .into_iter()
            .filter(|name| self.is_block_type(name) && self.is_instantiable(name))
            .map(str::to_string)
            .collect()
    }

    /// Block types explicitly configured on one block-area relation.
    fn configured_block_types(&self, owner_type: &str, relation: &str) -> Option<Vec<String>> {
        self.relation(owner_type, relation)
            .and_then(|r| r.allowed_types.clone())
            .filter(|types| !types.is_empty())
    }

    /// Block types a block-area relation accepts.
    ///
    /// Explicit configuration wins (restricted to concrete block types);
    /// otherwise every concrete block type is allowed.
    fn allowed_block_types(&self, owner_type: &str, relation: &str) -> Vec<String> {
        match self.configured_block_types(owner_type, relation) {
            Some(configured) => configured
                .into_iter()
                .filter(|name| {
                    let eligible = self.is_block_type(name) && self.is_instantiable(name);
                    if !eligible {
                        tracing::warn!(
                            owner = %owner_type,
                            relation = %relation,
                            block_type = %name,
                            "Configured block type is unknown or not instantiable, ignoring"
                        );
                    }
                    eligible
                })
                .collect(),
            None => self.concrete_block_types(),
        }
    }

    /// Field on the child type that references the owner of a `MultiOwned` relation.
    fn owning_key(&self, owner_type: &str, relation: &str) -> String {
        self.relation(owner_type, relation)
            .and_then(|r| r.owning_key.clone())
            .unwrap_or_else(|| format!("{owner_type}ID"))
    }
}

/// The live object graph.
///
/// Values are JSON values; single relations and area containers are stored
/// on the owner as the related object's [`ObjectId`].
pub trait ContentStore: Send + Sync {
    /// Type identifier of an object.
    fn type_of(&self, id: ObjectId) -> Result<String, StoreError>;

    fn read(&self, id: ObjectId, field: &str) -> Result<Option<serde_json::Value>, StoreError>;

    fn write(
        &mut self,
        id: ObjectId,
        field: &str,
        value: serde_json::Value,
    ) -> Result<(), StoreError>;

    /// Create a new, not yet persisted object of the given type.
    fn create(&mut self, type_name: &str) -> Result<ObjectId, StoreError>;

    fn persist(&mut self, id: ObjectId) -> Result<(), StoreError>;

    fn is_persisted(&self, id: ObjectId) -> Result<bool, StoreError>;

    /// Add `child` to an association-style relation of `owner`.
    fn add_related(
        &mut self,
        owner: ObjectId,
        relation: &str,
        child: ObjectId,
    ) -> Result<(), StoreError>;

    /// Members of an association-style relation.
    fn related(&self, owner: ObjectId, relation: &str) -> Result<Vec<ObjectId>, StoreError>;

    /// Version marker that changes whenever the object is persisted.
    fn last_modified(&self, id: ObjectId) -> Result<Option<String>, StoreError>;

    fn begin(&mut self) -> Result<(), StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    fn rollback(&mut self) -> Result<(), StoreError>;
}
