use contentpilot_config::{AppConfig, PromptMode};
use contentpilot_core::cache::{Schema, SchemaCache};
use contentpilot_core::content::{ContentModel, ContentStore, ObjectId};
use contentpilot_core::error::{ProviderError, Result};
use contentpilot_core::provider::{Provider, ProviderRequest, Usage};
use contentpilot_populate::{PopulateStats, Populator};
use contentpilot_prompt::PromptPayload;
use contentpilot_recovery::{PARSING_ERROR_KEY, Recovered};
use contentpilot_schema::{Introspector, SchemaService};
use std::sync::Arc;

/// Result of [`ContentGenerator::generate_and_populate`].
#[derive(Debug, Clone)]
pub struct Generation {
    pub object: ObjectId,
    /// Recovery strategy that produced the applied values.
    pub strategy: &'static str,
    pub stats: PopulateStats,
    pub usage: Option<Usage>,
}

/// Result of [`ContentGenerator::generate_preview`]: nothing is written.
#[derive(Debug, Clone)]
pub struct Preview {
    pub type_name: String,
    pub prompt: PromptPayload,
    pub reply: String,
    pub recovered: Recovered,
}

/// Composes schema introspection, prompting, recovery and population.
pub struct ContentGenerator {
    provider: Arc<dyn Provider>,
    schema: SchemaService,
    populator: Populator,
    model: String,
    temperature: f32,
    max_tokens: u32,
    prompt_mode: PromptMode,
}

impl ContentGenerator {
    pub fn new(
        provider: Arc<dyn Provider>,
        schema: SchemaService,
        populator: Populator,
        config: &AppConfig,
    ) -> Self {
        Self {
            provider,
            schema,
            populator,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            prompt_mode: config.prompt_mode,
        }
    }

    /// Wire a generator from configuration.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        model: Arc<dyn ContentModel>,
        cache: Arc<dyn SchemaCache>,
        config: &AppConfig,
    ) -> Self {
        let introspector = Introspector::new(model.clone(), config.schema.clone());
        let schema = SchemaService::new(introspector, cache, config.cache.clone());
        let populator = Populator::new(model, config.populate.clone())
            .excluding(config.schema.excluded_fields.iter().cloned());
        Self::new(provider, schema, populator, config)
    }

    pub fn schema(&self) -> &SchemaService {
        &self.schema
    }

    pub fn populator(&self) -> &Populator {
        &self.populator
    }

    /// The system/user prompt pair for a request against a live object.
    pub fn prompt_for(&self, store: &dyn ContentStore, id: ObjectId, request: &str) -> Result<PromptPayload> {
        let (type_name, schema) = self.describe(store, id)?;
        Ok(contentpilot_prompt::build_prompt(&type_name, &schema, self.prompt_mode, request))
    }

    /// Run the pipeline up to recovery without writing anything.
    pub async fn generate_preview(&self, store: &dyn ContentStore, id: ObjectId, request: &str) -> Result<Preview> {
        let (type_name, schema) = self.describe(store, id)?;
        let prompt = contentpilot_prompt::build_prompt(&type_name, &schema, self.prompt_mode, request);
        let (reply, _) = self.call(&prompt).await?;
        let recovered = contentpilot_recovery::recover_detailed(&reply);

        Ok(Preview {
            type_name,
            prompt,
            reply,
            recovered,
        })
    }

    /// Generate content for `request` and write it onto object `id`.
    pub async fn generate_and_populate(
        &self,
        store: &mut dyn ContentStore,
        id: ObjectId,
        request: &str,
    ) -> Result<Generation> {
        let (type_name, schema) = self.describe(&*store, id)?;
        let prompt = contentpilot_prompt::build_prompt(&type_name, &schema, self.prompt_mode, request);
        let (reply, usage) = self.call(&prompt).await?;

        let Recovered { strategy, mut values } = contentpilot_recovery::recover_detailed(&reply);
        if let Some(reason) = values.remove(PARSING_ERROR_KEY) {
            tracing::warn!(
                object = id,
                reason = %reason,
                "Reply could not be parsed, applying it as raw content"
            );
        }

        let stats = self.populator.populate_with_stats(store, id, &values, true)?;
        tracing::info!(object = id, type_name = %type_name, strategy, "Generation applied");

        Ok(Generation {
            object: id,
            strategy,
            stats,
            usage,
        })
    }

    fn describe(&self, store: &dyn ContentStore, id: ObjectId) -> Result<(String, Schema)> {
        let type_name = store.type_of(id)?;
        let schema = self.schema.describe(store, id)?;
        Ok((type_name, schema))
    }

    async fn call(&self, prompt: &PromptPayload) -> Result<(String, Option<Usage>)> {
        let mut request = ProviderRequest::from_prompts(&self.model, &prompt.system, &prompt.user);
        request.temperature = self.temperature;
        request.max_tokens = Some(self.max_tokens);

        tracing::debug!(
            provider = %self.provider.name(),
            model = %self.model,
            estimated_tokens = prompt.estimated_tokens,
            "Requesting content"
        );
        let response = self.provider.complete(request).await?;

        let reply = response.message.content;
        if reply.trim().is_empty() {
            return Err(ProviderError::InvalidResponse("empty reply".into()).into());
        }
        Ok((reply, response.usage))
    }
}
