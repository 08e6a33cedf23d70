//! Schema introspection.
//!
//! Turns a content type's declared fields and relations into a bounded
//! [`FieldDescriptor`](contentpilot_core::FieldDescriptor) tree:
//!
//! 1. Scalar fields pass the exclusion list and the content-field-type allow-list
//! 2. Relations are included only when an allow rule matches (default: exclude)
//! 3. Relation targets recurse up to `max_relation_depth`
//! 4. Block areas expand their allowed block types up to `max_block_depth`,
//!    each block type described once per walk
//!
//! Introspection never fails; unresolvable pieces are logged and skipped.

mod introspector;
mod service;

pub use introspector::{Introspector, humanize};
pub use service::{SchemaService, cache_key};
