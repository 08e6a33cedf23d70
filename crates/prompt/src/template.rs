//! The instruction template around the formatted schema.

use crate::formatter;
use crate::token;
use contentpilot_config::PromptMode;
use contentpilot_core::schema::{FieldDescriptor, TYPE_TAG_KEYS};
use serde::{Deserialize, Serialize};

/// A system/user prompt pair ready for the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptPayload {
    pub system: String,
    pub user: String,
    /// Rough size of both prompts together.
    pub estimated_tokens: usize,
}

const COMPACT_LEGEND: &str = "\
Schema notation: `name:type` is a field, `(a,b)` lists choice values, `|text` is a description,
`one>Type{...}` is a single relation, `many>Type{...}` is a list relation,
`area[Type{...};...]` is a block area and `Type^` means the block type was described above.";

/// Build the system prompt for a content type.
pub fn system_prompt(type_name: &str, fields: &[FieldDescriptor], mode: PromptMode) -> String {
    let tag = TYPE_TAG_KEYS[0];
    let keys: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    let keys = if keys.is_empty() {
        "(none)".to_string()
    } else {
        keys.join(", ")
    };

    let mut prompt = format!(
        "You write content for a \"{type_name}\" record in a content management system.

Respond with a single YAML document and nothing else. Do not add commentary before or after it and do not wrap it in ``` code fences.

Use exactly these top-level keys, spelled as shown: {keys}.
Nested keys must match the field names listed under each relation or block type. Omit any key you have no content for.

Value shapes:
- Content fields take a plain value. Choice fields take one of the listed values.
- A single relation is a nested mapping of the related type's fields.
- A list relation is a list of mappings, one per related item.
- A block area is a list of mappings. Every entry must have a \"{tag}\" key naming one of the allowed block types, followed by that block's fields.

Shape example:
<content_field>: value
<single_relation>:
  <field>: value
<list_relation>:
  - <field>: value
<block_area>:
  - {tag}: <block type>
    <field>: value

"
    );

    if mode == PromptMode::Compact {
        prompt.push_str(COMPACT_LEGEND);
        prompt.push_str("\n\n");
    }
    prompt.push_str("Schema:\n");
    prompt.push_str(&formatter::format(fields, mode));
    prompt
}

/// Build the full prompt pair for one generation request.
pub fn build_prompt(
    type_name: &str,
    fields: &[FieldDescriptor],
    mode: PromptMode,
    request: &str,
) -> PromptPayload {
    let system = system_prompt(type_name, fields, mode);
    let user = request.trim().to_string();
    let estimated_tokens = token::estimate_prompt(&system, &user);

    tracing::debug!(
        type_name = %type_name,
        mode = ?mode,
        fields = fields.len(),
        estimated_tokens,
        "Prompt built"
    );

    PromptPayload {
        system,
        user,
        estimated_tokens,
    }
}
