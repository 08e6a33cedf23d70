//! `contentpilot prompt`: Show the full system prompt for a content type.

use super::{CommandResult, load_config, load_model};
use contentpilot_config::PromptMode;
use contentpilot_schema::Introspector;
use std::path::Path;
use std::sync::Arc;

pub fn run(
    config_path: Option<&Path>,
    model_path: &Path,
    type_name: &str,
    mode: Option<PromptMode>,
) -> CommandResult {
    let config = load_config(config_path)?;
    let model = load_model(model_path, type_name)?;
    let mode = mode.unwrap_or(config.prompt_mode);

    let fields = Introspector::new(Arc::new(model), config.schema).introspect(type_name);
    let system = contentpilot_prompt::system_prompt(type_name, &fields, mode);

    print!("{system}");
    if !system.ends_with('\n') {
        println!();
    }
    eprintln!(
        "~{} tokens ({mode:?} mode)",
        contentpilot_prompt::token::estimate_tokens(&system)
    );
    Ok(())
}
