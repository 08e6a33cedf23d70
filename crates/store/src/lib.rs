//! In-process implementations of the ContentPilot content and cache contracts.
//!
//! - [`ModelRegistry`]: a data-driven [`ContentModel`](contentpilot_core::ContentModel)
//!   loaded from TOML model definitions
//! - [`InMemoryStore`]: an object graph with snapshot transactions
//! - [`InMemorySchemaCache`] / [`NoopSchemaCache`]: schema cache backends

pub mod cache;
pub mod in_memory;
pub mod model;

pub use cache::{InMemorySchemaCache, NoopSchemaCache};
pub use in_memory::{InMemoryStore, StoredObject};
pub use model::{ModelDefinition, ModelError, ModelRegistry};
