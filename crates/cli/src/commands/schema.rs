//! `contentpilot schema`: Show the schema tree of a content type.

use super::{CommandResult, load_config, load_model};
use crate::SchemaFormat;
use contentpilot_config::{AppConfig, PromptMode};
use contentpilot_schema::Introspector;
use std::path::Path;
use std::sync::Arc;

pub fn run(
    config_path: Option<&Path>,
    model_path: &Path,
    type_name: &str,
    format: SchemaFormat,
) -> CommandResult {
    let config = load_config(config_path)?;
    let model = load_model(model_path, type_name)?;
    print!("{}", render(&config, model, type_name, format)?);
    Ok(())
}

pub fn render(
    config: &AppConfig,
    model: contentpilot_store::ModelRegistry,
    type_name: &str,
    format: SchemaFormat,
) -> CommandResult<String> {
    let introspector = Introspector::new(Arc::new(model), config.schema.clone());
    let fields = introspector.introspect(type_name);
    tracing::debug!(type_name = %type_name, fields = fields.len(), "Schema introspected");

    Ok(match format {
        SchemaFormat::Verbose => contentpilot_prompt::format(&fields, PromptMode::Verbose),
        SchemaFormat::Compact => contentpilot_prompt::format(&fields, PromptMode::Compact),
        SchemaFormat::Json => {
            let mut json = serde_json::to_string_pretty(&fields)?;
            json.push('\n');
            json
        }
    })
}
