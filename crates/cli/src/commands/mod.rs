pub mod init;
pub mod populate;
pub mod prompt;
pub mod recover;
pub mod schema;

use contentpilot_config::{AppConfig, ConfigError};
use contentpilot_core::content::ContentModel;
use contentpilot_store::ModelRegistry;
use std::path::Path;

pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Load the explicit config file, or the default one with env overrides.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
}

/// Load a model file and check that it defines `type_name`.
pub fn load_model(path: &Path, type_name: &str) -> CommandResult<ModelRegistry> {
    let model = ModelRegistry::load(path)?;
    if model.type_info(type_name).is_none() {
        return Err(format!("type '{type_name}' is not defined in {}", path.display()).into());
    }
    Ok(model)
}
