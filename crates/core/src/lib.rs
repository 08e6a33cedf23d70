//! # ContentPilot Core
//!
//! Domain types, traits, and error definitions for ContentPilot, which maps a
//! natural-language request onto a structured content object using an LLM.
//! This crate has **zero framework dependencies**: it defines the domain
//! model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here:
//! - [`ContentModel`]: declared types, fields and relations
//! - [`ContentStore`]: the live object graph (read/write/create/persist)
//! - [`SchemaCache`]: the schema cache contract
//! - [`Provider`]: the LLM backend
//!
//! Implementations live in their respective crates, so every stage of the
//! pipeline can be tested against in-memory stand-ins.

pub mod cache;
pub mod content;
pub mod error;
pub mod message;
pub mod provider;
pub mod schema;
pub mod transaction;

// Re-export key types at crate root for ergonomics
pub use cache::{Schema, SchemaCache};
pub use content::{
    ChoiceOption, ContentModel, ContentStore, FieldMeta, ObjectId, RelationCardinality,
    RelationMeta, TypeInfo,
};
pub use error::{Error, PopulateError, ProviderError, Result, StoreError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use schema::{
    BlockTypeDescriptor, FieldDescriptor, FieldKind, ScalarType, TYPE_TAG_KEYS, ValueType,
};
pub use transaction::Transaction;
