//! End-to-end tests for the generation pipeline.
//!
//! These drive introspection, prompting, recovery and population against an
//! in-memory store with a scripted provider standing in for the LLM.

use std::sync::{Arc, Mutex};

use contentpilot_config::{AppConfig, PromptMode};
use contentpilot_core::content::ContentStore;
use contentpilot_core::error::{Error, ProviderError};
use contentpilot_core::message::Message;
use contentpilot_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use contentpilot_generator::ContentGenerator;
use contentpilot_store::{InMemorySchemaCache, InMemoryStore, ModelRegistry};
use serde_json::json;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted replies in sequence and records requests.
struct ScriptedProvider {
    replies: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn text(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string())])
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_request(&self) -> ProviderRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            panic!("ScriptedProvider exhausted after {} calls", requests.len());
        }
        requests.push(request);
        let reply = replies.remove(0)?;
        Ok(ProviderResponse {
            message: Message::assistant(reply),
            usage: Some(Usage {
                prompt_tokens: 120,
                completion_tokens: 40,
                total_tokens: 160,
            }),
            model: "mock".into(),
        })
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

const SITE: &str = r#"
block_base = "BaseBlock"

[[types]]
name = "Page"
fields = [
    { name = "ID", field_type = "Int" },
    { name = "Title", field_type = "Varchar(255)" },
    { name = "Summary", field_type = "Text" },
]
relations = [
    { name = "Author", cardinality = "single", target = "Person" },
    { name = "Blocks", cardinality = "block_area", target = "BlockArea", allowed_types = ["TextBlock"] },
    { name = "Comments", cardinality = "multi_owned", target = "Comment" },
]

[[types]]
name = "Person"
fields = [{ name = "Name", field_type = "Varchar" }]

[[types]]
name = "Comment"
fields = [{ name = "Body", field_type = "Text" }]

[[types]]
name = "BlockArea"

[[types]]
name = "BaseBlock"
abstract = true

[[types]]
name = "TextBlock"
parent = "BaseBlock"
fields = [{ name = "Heading", field_type = "Varchar" }, { name = "Body", field_type = "HTMLText" }]
"#;

struct Fixture {
    generator: ContentGenerator,
    provider: Arc<ScriptedProvider>,
    cache: Arc<InMemorySchemaCache>,
    store: InMemoryStore,
    page: u64,
}

fn fixture(provider: ScriptedProvider, mode: PromptMode) -> Fixture {
    let model = Arc::new(ModelRegistry::from_toml_str(SITE).unwrap());
    let mut config = AppConfig::default();
    config.prompt_mode = mode;
    config.schema.allowed_relation_types = vec!["Person".into(), "BlockArea".into()];

    let provider = Arc::new(provider);
    let cache = Arc::new(InMemorySchemaCache::new());
    let generator =
        ContentGenerator::from_config(provider.clone(), model.clone(), cache.clone(), &config);

    let mut store = InMemoryStore::new(model);
    let page = store.create("Page").unwrap();

    Fixture {
        generator,
        provider,
        cache,
        store,
        page,
    }
}

// ── E2E: Full pipeline ───────────────────────────────────────────────────

#[tokio::test]
async fn e2e_fenced_reply_populates_page_graph() {
    let reply = "Here is your page:\n```yaml\nTitle: Otters\nSummary: All about otters.\nAuthor:\n  Name: Ann\nBlocks:\n  - BlockType: TextBlock\n    Heading: Habitat\n    Body: <p>Rivers</p>\n  - BlockType: VideoBlock\n    Url: x\n  - BlockType: TextBlock\n    Heading: Diet\n```\nEnjoy!";
    let mut f = fixture(ScriptedProvider::text(reply), PromptMode::Verbose);

    let generation = f
        .generator
        .generate_and_populate(&mut f.store, f.page, "A page about otters")
        .await
        .unwrap();

    assert_eq!(generation.strategy, "fenced_block");
    assert_eq!(generation.object, f.page);
    assert_eq!(generation.stats.skipped, 1);
    assert_eq!(generation.usage.unwrap().total_tokens, 160);

    assert_eq!(f.store.read(f.page, "Title").unwrap(), Some(json!("Otters")));
    assert!(f.store.is_persisted(f.page).unwrap());

    let author = f.store.read(f.page, "Author").unwrap().and_then(|v| v.as_u64()).unwrap();
    assert_eq!(f.store.read(author, "Name").unwrap(), Some(json!("Ann")));

    let blocks = f.store.objects_of_type("TextBlock");
    assert_eq!(blocks.len(), 2);
    assert_eq!(f.store.read(blocks[1], "Heading").unwrap(), Some(json!("Diet")));
    assert_eq!(f.store.read(blocks[1], "Sort").unwrap(), Some(json!(2)));
}

#[tokio::test]
async fn e2e_prompt_describes_included_schema_only() {
    let mut f = fixture(ScriptedProvider::text("Title: Hi"), PromptMode::Verbose);
    f.generator
        .generate_and_populate(&mut f.store, f.page, "  Say hi  ")
        .await
        .unwrap();

    let request = f.provider.last_request();
    let system = request.system_prompt().unwrap();
    assert!(system.contains("spelled as shown: Title, Summary, Author, Blocks."));
    assert!(system.contains("- Author (Author): single Person"));
    assert!(system.contains("  - Text Block (TextBlock): block"));
    // Excluded by default: no allow rule for Comment.
    assert!(!system.contains("Comments"));
    // Identity fields are never part of the schema.
    assert!(!system.contains("(ID)"));

    assert_eq!(request.messages.last().unwrap().content, "Say hi");
    assert_eq!(request.max_tokens, Some(4096));
}

#[tokio::test]
async fn e2e_compact_mode_prompt() {
    let mut f = fixture(ScriptedProvider::text("Title: Hi"), PromptMode::Compact);
    f.generator
        .generate_and_populate(&mut f.store, f.page, "Say hi")
        .await
        .unwrap();

    let request = f.provider.last_request();
    let system = request.system_prompt().unwrap();
    assert!(system.contains("Author:one>Person{Name:text}"));
    assert!(system.contains("Blocks:area[TextBlock{Heading:text,Body:rich-text}]"));
}

#[tokio::test]
async fn e2e_unparseable_reply_is_kept_as_content() {
    let reply = "I'm sorry, I can't write that page.";
    let mut f = fixture(ScriptedProvider::text(reply), PromptMode::Verbose);

    let generation = f
        .generator
        .generate_and_populate(&mut f.store, f.page, "Write something")
        .await
        .unwrap();

    assert_eq!(generation.strategy, "fallback");
    assert_eq!(f.store.read(f.page, "content").unwrap(), Some(json!(reply)));
    assert_eq!(f.store.read(f.page, "parsing_error").unwrap(), None);
}

#[tokio::test]
async fn e2e_provider_failure_leaves_store_untouched() {
    let provider = ScriptedProvider::new(vec![Err(ProviderError::Timeout("30s".into()))]);
    let mut f = fixture(provider, PromptMode::Verbose);

    let err = f
        .generator
        .generate_and_populate(&mut f.store, f.page, "Anything")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Provider(ProviderError::Timeout(_))));
    assert_eq!(f.store.len(), 1);
    assert!(!f.store.is_persisted(f.page).unwrap());
}

#[tokio::test]
async fn e2e_empty_reply_is_invalid_response() {
    let mut f = fixture(ScriptedProvider::text("   \n"), PromptMode::Verbose);
    let err = f
        .generator
        .generate_and_populate(&mut f.store, f.page, "Anything")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Provider(ProviderError::InvalidResponse(_))));
}

#[tokio::test]
async fn e2e_preview_does_not_write() {
    let f = fixture(
        ScriptedProvider::text("Sure!\nTitle: Draft title\nSummary: Draft\nThanks!"),
        PromptMode::Verbose,
    );

    let preview = f
        .generator
        .generate_preview(&f.store, f.page, "Draft it")
        .await
        .unwrap();

    assert_eq!(preview.type_name, "Page");
    assert_eq!(preview.recovered.strategy, "line_scan");
    assert_eq!(preview.recovered.values["Title"], json!("Draft title"));
    assert_eq!(f.store.read(f.page, "Title").unwrap(), None);
    assert_eq!(f.provider.calls(), 1);
    assert!(!f.store.is_persisted(f.page).unwrap());
}

#[tokio::test]
async fn e2e_preview_runs_on_a_spawned_task() {
    let f = fixture(ScriptedProvider::text("Title: Spawned"), PromptMode::Compact);
    let handle = tokio::spawn(async move {
        let preview = f.generator.generate_preview(&f.store, f.page, "Go").await?;
        Ok::<_, Error>(preview.recovered.values["Title"].clone())
    });
    assert_eq!(handle.await.unwrap().unwrap(), json!("Spawned"));
}

#[tokio::test]
async fn e2e_excluded_fields_in_reply_are_not_written() {
    let mut f = fixture(ScriptedProvider::text("ID: 42\nTitle: Kept\nLastEdited: now"), PromptMode::Verbose);
    f.generator
        .generate_and_populate(&mut f.store, f.page, "Write it")
        .await
        .unwrap();

    assert_eq!(f.store.read(f.page, "Title").unwrap(), Some(json!("Kept")));
    assert_eq!(f.store.read(f.page, "ID").unwrap(), None);
    assert_eq!(f.store.read(f.page, "LastEdited").unwrap(), None);
}

#[tokio::test]
async fn e2e_schema_cache_follows_last_modified() {
    let provider = ScriptedProvider::new(vec![Ok("Title: One".into()), Ok("Title: Two".into())]);
    let mut f = fixture(provider, PromptMode::Verbose);

    f.generator
        .generate_and_populate(&mut f.store, f.page, "first")
        .await
        .unwrap();
    assert_eq!(f.cache.len(), 1);

    // The first run persisted the page, so its marker (and cache key) changed.
    f.generator
        .generate_and_populate(&mut f.store, f.page, "second")
        .await
        .unwrap();
    assert_eq!(f.cache.len(), 2);
    assert_eq!(f.store.read(f.page, "Title").unwrap(), Some(json!("Two")));

    f.generator.schema().clear();
    assert!(f.cache.is_empty());
}
