//! `contentpilot populate`: Apply a recorded reply to a fresh object.
//!
//! The reply file stands in for the LLM: the full pipeline runs (schema,
//! prompt, recovery, population) against an in-memory store, and the
//! resulting object graph is printed as JSON.

use super::{CommandResult, load_config, load_model};
use async_trait::async_trait;
use contentpilot_config::AppConfig;
use contentpilot_core::content::ContentStore;
use contentpilot_core::error::ProviderError;
use contentpilot_core::message::Message;
use contentpilot_core::provider::{Provider, ProviderRequest, ProviderResponse};
use contentpilot_generator::{ContentGenerator, Generation};
use contentpilot_store::{InMemorySchemaCache, InMemoryStore, ModelRegistry};
use std::path::Path;
use std::sync::Arc;

/// A provider that answers every request with a recorded reply.
pub struct ReplayProvider {
    reply: String,
}

impl ReplayProvider {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl Provider for ReplayProvider {
    fn name(&self) -> &str {
        "replay"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tracing::debug!(model = %request.model, chars = self.reply.len(), "Replaying recorded reply");
        Ok(ProviderResponse {
            message: Message::assistant(self.reply.clone()),
            usage: None,
            model: request.model,
        })
    }
}

pub async fn run(
    config_path: Option<&Path>,
    model_path: &Path,
    type_name: &str,
    reply_path: &Path,
    request: &str,
) -> CommandResult {
    let config = load_config(config_path)?;
    let model = load_model(model_path, type_name)?;
    let reply = std::fs::read_to_string(reply_path)?;

    let (generation, store) = apply(&config, model, type_name, &reply, request).await?;

    eprintln!(
        "#{} populated via {}: {} created, {} written, {} skipped",
        generation.object,
        generation.strategy,
        generation.stats.created,
        generation.stats.written,
        generation.stats.skipped
    );
    println!("{}", serde_json::to_string_pretty(&store.dump())?);
    Ok(())
}

/// Create a `type_name` object and populate it from `reply`.
pub async fn apply(
    config: &AppConfig,
    model: ModelRegistry,
    type_name: &str,
    reply: &str,
    request: &str,
) -> CommandResult<(Generation, InMemoryStore)> {
    let model = Arc::new(model);
    let generator = ContentGenerator::from_config(
        Arc::new(ReplayProvider::new(reply)),
        model.clone(),
        Arc::new(InMemorySchemaCache::new()),
        config,
    );

    let mut store = InMemoryStore::new(model);
    let id = store.create(type_name)?;
    let generation = generator.generate_and_populate(&mut store, id, request).await?;
    Ok((generation, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;
    use serde_json::json;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.schema.allowed_relation_types = vec!["BlockArea".into()];
        config
    }

    #[tokio::test]
    async fn recorded_reply_builds_the_graph() {
        let model = ModelRegistry::from_toml_str(fixtures::SITE).unwrap();
        let reply = "Title: Night trains\nTone: Calm\nBlocks:\n  - BlockType: TextBlock\n    Body: Sleeper routes\n";

        let (generation, store) = apply(&config(), model, "Article", reply, "").await.unwrap();

        assert_eq!(generation.strategy, "direct");
        assert_eq!(store.read(generation.object, "Title").unwrap(), Some(json!("Night trains")));
        assert_eq!(store.read(generation.object, "Tone").unwrap(), Some(json!("Calm")));
        let blocks = store.objects_of_type("TextBlock");
        assert_eq!(blocks.len(), 1);
        assert_eq!(store.read(blocks[0], "Body").unwrap(), Some(json!("Sleeper routes")));
        assert!(store.dump().is_array());
    }

    #[tokio::test]
    async fn instantiating_an_abstract_type_fails() {
        let model = ModelRegistry::from_toml_str(fixtures::SITE).unwrap();
        let err = apply(&config(), model, "BaseBlock", "Title: x", "")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("BaseBlock"));
    }
}
