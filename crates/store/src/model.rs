//! Model registry: type metadata loaded from a TOML model definition.
//!
//! ```toml
//! block_base = "BaseBlock"
//!
//! [[types]]
//! name = "Page"
//! fields = [{ name = "Title", field_type = "Varchar(255)" }]
//! relations = [{ name = "Author", cardinality = "single", target = "Person" }]
//!
//! [[types]]
//! name = "BaseBlock"
//! abstract = true
//! ```

use contentpilot_core::content::{ContentModel, TypeInfo};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The on-disk shape of a model file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_base: Option<String>,

    #[serde(default)]
    pub types: Vec<TypeInfo>,
}

/// An in-memory [`ContentModel`].
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    order: Vec<String>,
    types: HashMap<String, TypeInfo>,
    block_base: Option<String>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type, replacing any previous definition with the same name.
    pub fn register(mut self, info: TypeInfo) -> Self {
        if !self.types.contains_key(&info.name) {
            self.order.push(info.name.clone());
        }
        self.types.insert(info.name.clone(), info);
        self
    }

    pub fn with_block_base(mut self, base: impl Into<String>) -> Self {
        self.block_base = Some(base.into());
        self
    }

    /// Build a registry from a definition, rejecting duplicate type names.
    pub fn from_definition(definition: ModelDefinition) -> Result<Self, ModelError> {
        let mut registry = Self::new();
        for info in definition.types {
            if registry.types.contains_key(&info.name) {
                return Err(ModelError::DuplicateType(info.name));
            }
            registry = registry.register(info);
        }

        if let Some(base) = definition.block_base {
            if !registry.types.contains_key(&base) {
                return Err(ModelError::UnknownBlockBase(base));
            }
            registry.block_base = Some(base);
        }

        for info in registry.types.values() {
            if let Some(parent) = &info.parent {
                if !registry.types.contains_key(parent) {
                    tracing::warn!(type_name = %info.name, parent = %parent, "Parent type is not defined");
                }
            }
        }

        tracing::debug!(types = registry.order.len(), "Content model loaded");
        Ok(registry)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ModelError> {
        let definition: ModelDefinition =
            toml::from_str(content).map_err(|e| ModelError::Parse(e.to_string()))?;
        Self::from_definition(definition)
    }

    /// Load a model definition file.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|e| ModelError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl ContentModel for ModelRegistry {
    fn type_info(&self, name: &str) -> Option<&TypeInfo> {
        self.types.get(name)
    }

    fn type_names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    fn block_base(&self) -> Option<&str> {
        self.block_base.as_deref()
    }
}

/// Errors from loading a model definition.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read model file at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse model definition: {0}")]
    Parse(String),

    #[error("Type defined twice: {0}")]
    DuplicateType(String),

    #[error("Block base type is not defined: {0}")]
    UnknownBlockBase(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentpilot_core::content::RelationCardinality;
    use std::io::Write;

    const SITE: &str = r#"
block_base = "BaseBlock"

[[types]]
name = "Page"
title = "Page"
fields = [
    { name = "Title", field_type = "Varchar(255)", description = "Page heading" },
    { name = "Status", field_type = "Enum", options = [{ label = "Draft", value = "draft" }, { label = "Live", value = "live" }] },
]
relations = [
    { name = "Author", cardinality = "single", target = "Person" },
    { name = "Blocks", cardinality = "block_area", target = "BlockArea", allowed_types = ["TextBlock"] },
]

[[types]]
name = "Person"
fields = [{ name = "Name", field_type = "Varchar" }]

[[types]]
name = "BlockArea"

[[types]]
name = "BaseBlock"
abstract = true
fields = [{ name = "Title", field_type = "Varchar" }]

[[types]]
name = "TextBlock"
parent = "BaseBlock"
fields = [{ name = "Body", field_type = "HTMLText" }]
"#;

    #[test]
    fn parses_model_definition() {
        let model = ModelRegistry::from_toml_str(SITE).unwrap();
        assert_eq!(model.len(), 5);
        assert_eq!(model.type_names()[0], "Page");

        let page = model.type_info("Page").unwrap();
        assert_eq!(page.fields[1].options.len(), 2);
        assert_eq!(page.relations[1].cardinality, RelationCardinality::BlockArea);

        assert!(model.is_block_type("TextBlock"));
        assert!(!model.is_instantiable("BaseBlock"));
        assert_eq!(model.concrete_block_types(), vec!["TextBlock".to_string()]);
        assert_eq!(
            model.configured_block_types("Page", "Blocks"),
            Some(vec!["TextBlock".to_string()])
        );
    }

    #[test]
    fn inherited_block_fields_resolve() {
        let model = ModelRegistry::from_toml_str(SITE).unwrap();
        let names: Vec<_> = model
            .fields_of("TextBlock")
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["Title", "Body"]);
    }

    #[test]
    fn duplicate_types_rejected() {
        let toml_str = r#"
[[types]]
name = "Page"
[[types]]
name = "Page"
"#;
        assert!(matches!(
            ModelRegistry::from_toml_str(toml_str),
            Err(ModelError::DuplicateType(name)) if name == "Page"
        ));
    }

    #[test]
    fn unknown_block_base_rejected() {
        let toml_str = "block_base = \"Missing\"\n";
        assert!(matches!(
            ModelRegistry::from_toml_str(toml_str),
            Err(ModelError::UnknownBlockBase(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SITE.as_bytes()).unwrap();
        let model = ModelRegistry::load(file.path()).unwrap();
        assert!(model.type_info("Person").is_some());
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = ModelRegistry::load(Path::new("/nonexistent/model.toml")).unwrap_err();
        assert!(matches!(err, ModelError::Read { .. }));
    }
}
