//! Configuration loading, validation, and management for ContentPilot.
//!
//! Loads configuration from `~/.contentpilot/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! The `[schema]` and `[populate]` sections are handed to the introspector
//! and populator constructors; nothing reads configuration globally.

use contentpilot_core::schema::ScalarType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.contentpilot/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model requested from the LLM provider
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Schema encoding used in the system prompt
    #[serde(default)]
    pub prompt_mode: PromptMode,

    /// Schema introspection rules
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Population rules
    #[serde(default)]
    pub populate: PopulateConfig,

    /// Schema cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_model() -> String {
    "anthropic/claude-sonnet-4".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_true() -> bool {
    true
}

/// How the schema is rendered into the system prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    /// One prose line per field.
    #[default]
    Verbose,
    /// Terse colon/pipe tokens, cheaper in tokens.
    Compact,
}

impl std::str::FromStr for PromptMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "verbose" => Ok(Self::Verbose),
            "compact" => Ok(Self::Compact),
            other => Err(ConfigError::ValidationError(format!(
                "unknown prompt mode '{other}' (expected 'verbose' or 'compact')"
            ))),
        }
    }
}

/// Which fields and relations become part of the schema tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Identity/audit/system field names, matched exactly.
    #[serde(default = "default_excluded_fields")]
    pub excluded_fields: Vec<String>,

    /// Relations whose target is-a one of these types are included.
    #[serde(default)]
    pub allowed_relation_types: Vec<String>,

    /// Explicit `Owner.relation` pairs that are included.
    #[serde(default)]
    pub allowed_relations: Vec<String>,

    #[serde(default = "default_max_relation_depth")]
    pub max_relation_depth: usize,

    #[serde(default = "default_max_block_depth")]
    pub max_block_depth: usize,

    /// Content field types and their semantic subtype. A field whose storage
    /// type is not listed here is not a content field.
    #[serde(default = "default_field_types")]
    pub field_types: BTreeMap<String, ScalarType>,

    /// Title overrides by field name.
    #[serde(default)]
    pub field_labels: HashMap<String, String>,
}

fn default_excluded_fields() -> Vec<String> {
    [
        "ID",
        "ClassName",
        "RecordClassName",
        "Created",
        "LastEdited",
        "Version",
        "Sort",
        "ParentID",
        "OwnerID",
        "URLSegment",
        "CanViewType",
        "CanEditType",
        "ShowInMenus",
        "ShowInSearch",
        "HasBrokenFile",
        "HasBrokenLink",
        "ReportClass",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_field_types() -> BTreeMap<String, ScalarType> {
    [
        ("Varchar", ScalarType::Text),
        ("Text", ScalarType::LongText),
        ("HTMLText", ScalarType::RichText),
        ("HTMLVarchar", ScalarType::RichText),
        ("Int", ScalarType::Number),
        ("Decimal", ScalarType::Number),
        ("Float", ScalarType::Number),
        ("Currency", ScalarType::Number),
        ("Percentage", ScalarType::Number),
        ("Boolean", ScalarType::Boolean),
        ("Date", ScalarType::Date),
        ("Datetime", ScalarType::Date),
        ("Enum", ScalarType::Choice),
    ]
    .into_iter()
    .map(|(name, scalar)| (name.to_string(), scalar))
    .collect()
}

fn default_max_relation_depth() -> usize {
    3
}
fn default_max_block_depth() -> usize {
    5
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            excluded_fields: default_excluded_fields(),
            field_types: default_field_types(),
            allowed_relation_types: vec![],
            allowed_relations: vec![],
            field_labels: HashMap::new(),
            max_relation_depth: default_max_relation_depth(),
            max_block_depth: default_max_block_depth(),
        }
    }
}

impl SchemaConfig {
    pub fn is_excluded(&self, field: &str) -> bool {
        self.excluded_fields.iter().any(|f| f == field)
    }

    /// Semantic subtype for a storage type, `None` if it is not a content type.
    pub fn scalar_type(&self, base_type: &str) -> Option<ScalarType> {
        self.field_types.get(base_type).copied()
    }

    /// Whether `Owner.relation` is explicitly allow-listed.
    pub fn allows_pair(&self, owner_type: &str, relation: &str) -> bool {
        self.allowed_relations.iter().any(|pair| {
            pair.split_once('.')
                .is_some_and(|(owner, name)| owner == owner_type && name == relation)
        })
    }

    pub fn label_for(&self, field: &str) -> Option<&str> {
        self.field_labels.get(field).map(String::as_str)
    }
}

/// How recovered values are written back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulateConfig {
    /// Type-tag keys checked after the built-in ones.
    #[serde(default)]
    pub extra_type_tag_keys: Vec<String>,

    /// Block field holding the 1-based position inside its area.
    #[serde(default = "default_sort_field")]
    pub sort_field: String,

    /// Block field referencing its area container.
    #[serde(default = "default_block_parent_field")]
    pub block_parent_field: String,
}

fn default_sort_field() -> String {
    "Sort".into()
}
fn default_block_parent_field() -> String {
    "ParentID".into()
}

impl Default for PopulateConfig {
    fn default() -> Self {
        Self {
            extra_type_tag_keys: vec![],
            sort_field: default_sort_field(),
            block_parent_field: default_block_parent_field(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Entry lifetime in seconds (0 = no expiry)
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,

    #[serde(default = "default_cache_prefix")]
    pub key_prefix: String,
}

fn default_cache_ttl() -> u64 {
    3600
}
fn default_cache_prefix() -> String {
    "contentpilot_schema".into()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_cache_ttl(),
            key_prefix: default_cache_prefix(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<std::time::Duration> {
        (self.ttl_secs > 0).then(|| std::time::Duration::from_secs(self.ttl_secs))
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.contentpilot/config.toml).
    ///
    /// Environment overrides:
    /// - `CONTENTPILOT_MODEL`
    /// - `CONTENTPILOT_PROMPT_MODE` (`verbose` | `compact`)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(model) = std::env::var("CONTENTPILOT_MODEL") {
            config.model = model;
        }

        if let Ok(mode) = std::env::var("CONTENTPILOT_PROMPT_MODE") {
            config.prompt_mode = mode.parse()?;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".contentpilot")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.schema.max_relation_depth == 0 || self.schema.max_block_depth == 0 {
            return Err(ConfigError::ValidationError(
                "schema depth limits must be at least 1".into(),
            ));
        }

        if let Some(pair) = self
            .schema
            .allowed_relations
            .iter()
            .find(|p| !matches!(p.split_once('.'), Some((o, r)) if !o.is_empty() && !r.is_empty()))
        {
            return Err(ConfigError::ValidationError(format!(
                "allowed_relations entry '{pair}' must look like 'Owner.relation'"
            )));
        }

        if self.populate.extra_type_tag_keys.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "extra_type_tag_keys must not contain empty keys".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            prompt_mode: PromptMode::default(),
            schema: SchemaConfig::default(),
            populate: PopulateConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
