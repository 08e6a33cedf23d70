//! Schema descriptors: the bounded, serializable description of a content type.
//!
//! A [`FieldDescriptor`] tree is produced by the introspector, rendered into
//! the system prompt by the formatter and cached between requests.

use crate::content::{ChoiceOption, RelationCardinality};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Semantic subtype of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Text,
    LongText,
    RichText,
    Number,
    Boolean,
    Date,
    Choice,
}

impl ScalarType {
    /// Stable lowercase token, used by the compact prompt encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::LongText => "long-text",
            Self::RichText => "rich-text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Choice => "choice",
        }
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Scalar,
    RelationSingle,
    RelationMany,
    BlockArea,
}

impl From<RelationCardinality> for FieldKind {
    fn from(cardinality: RelationCardinality) -> Self {
        match cardinality {
            RelationCardinality::Single => Self::RelationSingle,
            RelationCardinality::MultiOwned | RelationCardinality::MultiAssociated => {
                Self::RelationMany
            }
            RelationCardinality::BlockArea => Self::BlockArea,
        }
    }
}

/// What a descriptor's value is: a scalar subtype or a related object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "type", rename_all = "snake_case")]
pub enum ValueType {
    Scalar(ScalarType),
    Object(String),
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(scalar) => write!(f, "{scalar}"),
            Self::Object(type_name) => f.write_str(type_name),
        }
    }
}

/// One node of the schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Identifier, unique within the parent's field list.
    pub name: String,

    /// Human-readable label.
    pub title: String,

    pub kind: FieldKind,

    pub value_type: ValueType,

    /// Relation cardinality as declared by the model (relations only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<RelationCardinality>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,

    /// Fields of the related type (relations only, depth-bounded).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FieldDescriptor>,

    /// Permissible block types (block areas only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_types: Vec<BlockTypeDescriptor>,
}

impl FieldDescriptor {
    /// A scalar descriptor with no description or options.
    pub fn scalar(name: impl Into<String>, title: impl Into<String>, scalar: ScalarType) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            kind: FieldKind::Scalar,
            value_type: ValueType::Scalar(scalar),
            cardinality: None,
            description: None,
            options: Vec::new(),
            children: Vec::new(),
            allowed_types: Vec::new(),
        }
    }

    /// A relation descriptor; the kind follows from the cardinality.
    pub fn relation(
        name: impl Into<String>,
        title: impl Into<String>,
        cardinality: RelationCardinality,
        target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            kind: cardinality.into(),
            value_type: ValueType::Object(target.into()),
            cardinality: Some(cardinality),
            description: None,
            options: Vec::new(),
            children: Vec::new(),
            allowed_types: Vec::new(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.kind == FieldKind::Scalar
    }

    pub fn is_relation(&self) -> bool {
        matches!(self.kind, FieldKind::RelationSingle | FieldKind::RelationMany)
    }

    pub fn is_block_area(&self) -> bool {
        self.kind == FieldKind::BlockArea
    }

    /// Number of levels in this subtree, counting this node as one.
    pub fn depth(&self) -> usize {
        let children = self.children.iter().map(FieldDescriptor::depth).max().unwrap_or(0);
        let blocks = self
            .allowed_types
            .iter()
            .map(BlockTypeDescriptor::depth)
            .max()
            .unwrap_or(0);
        1 + children.max(blocks)
    }
}

/// A block type permitted in a block area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTypeDescriptor {
    /// Type identifier; echoed back by the LLM as the block's type tag.
    pub type_name: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Field subtree, shared by every occurrence of the type at one depth.
    #[serde(default)]
    pub children: Arc<Vec<FieldDescriptor>>,
}

impl BlockTypeDescriptor {
    /// Levels in the block's field subtree (zero for a block without fields).
    pub fn depth(&self) -> usize {
        self.children.iter().map(FieldDescriptor::depth).max().unwrap_or(0)
    }
}

/// Keys that name a block entry's type, checked in order.
///
/// The first is the key the prompt asks the LLM to use.
pub const TYPE_TAG_KEYS: &[&str] = &["BlockType", "ClassName", "_type", "type"];

/// Maximum depth over a whole descriptor list.
pub fn tree_depth(fields: &[FieldDescriptor]) -> usize {
    fields.iter().map(FieldDescriptor::depth).max().unwrap_or(0)
}
