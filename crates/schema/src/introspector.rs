//! The schema introspector.

use contentpilot_config::SchemaConfig;
use contentpilot_core::content::{ChoiceOption, ContentModel, RelationCardinality, RelationMeta};
use contentpilot_core::schema::{BlockTypeDescriptor, FieldDescriptor, ScalarType};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// State shared by one introspection walk.
#[derive(Default)]
struct Walk {
    /// (block type, depth) → its fields.
    blocks: HashMap<(String, usize), Arc<Vec<FieldDescriptor>>>,
}

/// Builds [`FieldDescriptor`] trees from a [`ContentModel`].
pub struct Introspector {
    model: Arc<dyn ContentModel>,
    config: SchemaConfig,
}

impl Introspector {
    pub fn new(model: Arc<dyn ContentModel>, config: SchemaConfig) -> Self {
        Self { model, config }
    }

    pub fn model(&self) -> &Arc<dyn ContentModel> {
        &self.model
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// Describe a content type from the root.
    pub fn introspect(&self, type_name: &str) -> Vec<FieldDescriptor> {
        self.introspect_at(type_name, 0)
    }

    /// Describe a content type as if it sat `depth` levels below the root.
    pub fn introspect_at(&self, type_name: &str, depth: usize) -> Vec<FieldDescriptor> {
        let mut walk = Walk::default();
        let fields = self.describe_type(type_name, depth, &mut walk);
        tracing::debug!(
            type_name = %type_name,
            fields = fields.len(),
            block_types = walk.blocks.len(),
            "Schema introspected"
        );
        fields
    }

    fn describe_type(&self, type_name: &str, depth: usize, walk: &mut Walk) -> Vec<FieldDescriptor> {
        if self.model.type_info(type_name).is_none() {
            tracing::warn!(type_name = %type_name, "Unknown content type, nothing to describe");
            return Vec::new();
        }

        let mut fields = self.scalar_fields(type_name);
        let mut seen: HashSet<String> = fields.iter().map(|f| f.name.clone()).collect();
        let mut areas = Vec::new();

        for relation in self.model.relations_of(type_name) {
            if !seen.insert(relation.name.clone()) {
                continue;
            }
            if !self.includes(type_name, relation) {
                tracing::debug!(owner = %type_name, relation = %relation.name, "Relation not allow-listed, skipping");
                continue;
            }
            if self.model.type_info(&relation.target).is_none() {
                tracing::warn!(
                    owner = %type_name,
                    relation = %relation.name,
                    target = %relation.target,
                    "Relation target type cannot be resolved, skipping"
                );
                continue;
            }

            match relation.cardinality {
                RelationCardinality::BlockArea => {
                    areas.push(self.describe_block_area(type_name, relation, depth, walk));
                }
                RelationCardinality::Single
                | RelationCardinality::MultiOwned
                | RelationCardinality::MultiAssociated => {
                    fields.push(self.describe_relation(relation, depth, walk));
                }
            }
        }

        fields.extend(areas);
        fields
    }

    fn scalar_fields(&self, type_name: &str) -> Vec<FieldDescriptor> {
        let mut seen = HashSet::new();
        let mut fields = Vec::new();

        for field in self.model.fields_of(type_name) {
            // First declaration of a name wins, even when it is skipped.
            if !seen.insert(field.name.as_str()) || self.config.is_excluded(&field.name) {
                continue;
            }
            let Some(scalar) = self.config.scalar_type(field.base_type()) else {
                tracing::debug!(
                    type_name = %type_name,
                    field = %field.name,
                    field_type = %field.field_type,
                    "Not a content field type, skipping"
                );
                continue;
            };

            let title = self.title_for(&field.name, field.title.as_deref());
            let mut descriptor = FieldDescriptor::scalar(&field.name, title, scalar);
            descriptor.description = field.description.clone();
            if scalar == ScalarType::Choice {
                descriptor.options = if field.options.is_empty() {
                    inline_options(&field.field_type)
                } else {
                    field.options.clone()
                };
            }
            fields.push(descriptor);
        }

        fields
    }

    /// A relation is included when its target is-a allow-listed type, or when
    /// `Owner.relation` is allow-listed for the owner or one of its ancestors.
    fn includes(&self, owner_type: &str, relation: &RelationMeta) -> bool {
        let by_target = self
            .config
            .allowed_relation_types
            .iter()
            .any(|allowed| self.model.is_a(&relation.target, allowed));

        by_target
            || self
                .model
                .ancestry(owner_type)
                .iter()
                .any(|owner| self.config.allows_pair(&owner.name, &relation.name))
    }

    fn describe_relation(&self, relation: &RelationMeta, depth: usize, walk: &mut Walk) -> FieldDescriptor {
        let mut descriptor = self.relation_descriptor(relation);

        if depth + 1 < self.config.max_relation_depth {
            descriptor.children = self.describe_type(&relation.target, depth + 1, walk);
        } else {
            tracing::debug!(relation = %relation.name, depth, "Relation depth limit reached");
        }
        descriptor
    }

    fn describe_block_area(
        &self,
        owner_type: &str,
        relation: &RelationMeta,
        depth: usize,
        walk: &mut Walk,
    ) -> FieldDescriptor {
        let mut descriptor = self.relation_descriptor(relation);

        let configured = self
            .model
            .configured_block_types(owner_type, &relation.name)
            .is_some();
        let block_types = self.model.allowed_block_types(owner_type, &relation.name);
        tracing::debug!(
            owner = %owner_type,
            relation = %relation.name,
            configured,
            block_types = block_types.len(),
            "Block area resolved"
        );

        descriptor.allowed_types = block_types
            .iter()
            .filter_map(|block_type| self.describe_block_type(block_type, depth + 1, walk))
            .collect();
        descriptor
    }

    fn describe_block_type(
        &self,
        type_name: &str,
        depth: usize,
        walk: &mut Walk,
    ) -> Option<BlockTypeDescriptor> {
        let info = self.model.type_info(type_name)?;
        Some(BlockTypeDescriptor {
            type_name: type_name.to_string(),
            title: info.title.clone().unwrap_or_else(|| humanize(type_name)),
            description: info.description.clone(),
            children: self.block_fields(type_name, depth, walk),
        })
    }

    /// Fields of a block type placed at `depth`, described once per walk and depth.
    fn block_fields(&self, type_name: &str, depth: usize, walk: &mut Walk) -> Arc<Vec<FieldDescriptor>> {
        if depth >= self.config.max_block_depth {
            return Arc::default();
        }
        let key = (type_name.to_string(), depth);
        if let Some(fields) = walk.blocks.get(&key) {
            return Arc::clone(fields);
        }

        let fields = Arc::new(self.describe_type(type_name, depth, walk));
        walk.blocks.insert(key, Arc::clone(&fields));
        fields
    }

    fn relation_descriptor(&self, relation: &RelationMeta) -> FieldDescriptor {
        let title = self.title_for(&relation.name, relation.title.as_deref());
        let mut descriptor =
            FieldDescriptor::relation(&relation.name, title, relation.cardinality, &relation.target);
        descriptor.description = relation.description.clone();
        descriptor
    }

    /// Configured label, then declared title, then the humanised name.
    fn title_for(&self, name: &str, declared: Option<&str>) -> String {
        self.config
            .label_for(name)
            .or(declared)
            .map(str::to_string)
            .unwrap_or_else(|| humanize(name))
    }
}

/// Turn an identifier into a label: `MetaTitle` → `Meta Title`,
/// `hero_image` → `Hero Image`, `URLSegment` → `URL Segment`.
pub fn humanize(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Options spelled inside the storage type: `Enum('Draft,Published')`.
fn inline_options(field_type: &str) -> Vec<ChoiceOption> {
    let Some(start) = field_type.find('(') else {
        return Vec::new();
    };
    let rest = field_type[start + 1..].trim_start();
    let Some(quote) = rest.chars().next().filter(|c| *c == '\'' || *c == '"') else {
        return Vec::new();
    };
    let inner = &rest[1..];
    let Some(end) = inner.find(quote) else {
        return Vec::new();
    };

    inner[..end]
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| ChoiceOption {
            label: value.to_string(),
            value: value.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentpilot_core::content::{FieldMeta, TypeInfo};
    use contentpilot_core::schema::{FieldKind, ValueType, tree_depth};
    use contentpilot_store::ModelRegistry;

    fn site() -> ModelRegistry {
        ModelRegistry::new()
            .register(
                TypeInfo::new("Page")
                    .field(FieldMeta::new("ID", "Int"))
                    .field(FieldMeta::new("Title", "Varchar(255)"))
                    .field(FieldMeta::new("MetaDescription", "Text").described("Shown in search results"))
                    .field(FieldMeta::new("HeroImage", "Image"))
                    .field(FieldMeta::new("Status", "Enum('Draft,Published')"))
                    .relation(RelationMeta::new("Author", RelationCardinality::Single, "Person"))
                    .relation(RelationMeta::new("Blocks", RelationCardinality::BlockArea, "BlockArea"))
                    .relation(RelationMeta::new("Comments", RelationCardinality::MultiOwned, "Comment"))
                    .relation(RelationMeta::new("Parent", RelationCardinality::Single, "Page")),
            )
            .register(TypeInfo::new("NewsPage").extends("Page").field(FieldMeta::new("Title", "HTMLText")))
            .register(TypeInfo::new("Person").field(FieldMeta::new("Name", "Varchar")))
            .register(TypeInfo::new("Staff").extends("Person"))
            .register(TypeInfo::new("Comment").field(FieldMeta::new("Body", "Text")))
            .register(TypeInfo::new("BlockArea"))
            .register(TypeInfo::new("BaseBlock").abstract_type().field(FieldMeta::new("Title", "Varchar")))
            .register(
                TypeInfo::new("TextBlock")
                    .extends("BaseBlock")
                    .titled("Text")
                    .field(FieldMeta::new("Body", "HTMLText")),
            )
            .register(TypeInfo::new("QuoteBlock").extends("BaseBlock").field(FieldMeta::new("Quote", "Text")))
            .with_block_base("BaseBlock")
    }

    fn introspector(model: ModelRegistry, configure: impl FnOnce(&mut SchemaConfig)) -> Introspector {
        let mut config = SchemaConfig::default();
        configure(&mut config);
        Introspector::new(Arc::new(model), config)
    }

    fn names(fields: &[FieldDescriptor]) -> Vec<&str> {
        fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn scalars_pass_exclusion_and_type_allow_list() {
        let fields = introspector(site(), |_| {}).introspect("Page");
        assert_eq!(names(&fields), vec!["Title", "MetaDescription", "Status"]);
        assert_eq!(fields[1].value_type, ValueType::Scalar(ScalarType::LongText));
        assert_eq!(fields[1].title, "Meta Description");
        assert_eq!(fields[1].description.as_deref(), Some("Shown in search results"));
    }

    #[test]
    fn relations_are_excluded_by_default() {
        let fields = introspector(site(), |_| {}).introspect("Page");
        assert!(fields.iter().all(|f| f.is_scalar()));
    }

    #[test]
    fn relation_included_by_target_type_with_is_a() {
        let model = site().register(
            TypeInfo::new("Event")
                .relation(RelationMeta::new("Host", RelationCardinality::Single, "Staff")),
        );
        let introspector = introspector(model, |c| c.allowed_relation_types = vec!["Person".into()]);

        let page = introspector.introspect("Page");
        assert!(names(&page).contains(&"Author"));
        assert!(!names(&page).contains(&"Comments"));

        let event = introspector.introspect("Event");
        assert_eq!(names(&event), vec!["Host"]);
        assert_eq!(event[0].children[0].name, "Name");
    }

    #[test]
    fn relation_included_by_owner_pair_including_ancestors() {
        let introspector = introspector(site(), |c| c.allowed_relations = vec!["Page.Comments".into()]);
        let fields = introspector.introspect("NewsPage");
        let comments = fields.iter().find(|f| f.name == "Comments").unwrap();
        assert_eq!(comments.kind, FieldKind::RelationMany);
        assert_eq!(comments.cardinality, Some(RelationCardinality::MultiOwned));
        assert_eq!(names(&comments.children), vec!["Body"]);
    }

    #[test]
    fn first_declaration_wins_for_duplicate_names() {
        let fields = introspector(site(), |_| {}).introspect("NewsPage");
        let titles: Vec<_> = fields.iter().filter(|f| f.name == "Title").collect();
        assert_eq!(titles.len(), 1);
        assert_eq!(titles[0].value_type, ValueType::Scalar(ScalarType::Text));
    }

    #[test]
    fn ordering_is_scalars_then_relations_then_areas() {
        let introspector = introspector(site(), |c| {
            c.allowed_relation_types = vec!["BlockArea".into(), "Person".into()];
        });
        let fields = introspector.introspect("Page");
        assert_eq!(
            names(&fields),
            vec!["Title", "MetaDescription", "Status", "Author", "Blocks"]
        );
        assert!(fields[4].is_block_area());
    }

    #[test]
    fn relation_cycle_terminates_within_depth() {
        let introspector = introspector(site(), |c| c.allowed_relations = vec!["Page.Parent".into()]);
        let fields = introspector.introspect("Page");
        assert_eq!(tree_depth(&fields), 3);

        let shallow = super::Introspector::new(
            Arc::new(site()),
            SchemaConfig {
                allowed_relations: vec!["Page.Parent".into()],
                max_relation_depth: 2,
                ..SchemaConfig::default()
            },
        );
        assert_eq!(tree_depth(&shallow.introspect("Page")), 2);
    }

    #[test]
    fn starting_depth_counts_toward_the_limit() {
        let introspector = introspector(site(), |c| c.allowed_relations = vec!["Page.Parent".into()]);
        let fields = introspector.introspect_at("Page", 2);
        let parent = fields.iter().find(|f| f.name == "Parent").unwrap();
        assert!(parent.children.is_empty());
    }

    #[test]
    fn unresolvable_target_is_skipped() {
        let model = site().register(
            TypeInfo::new("Orphan")
                .field(FieldMeta::new("Title", "Varchar"))
                .relation(RelationMeta::new("Ghost", RelationCardinality::Single, "Missing")),
        );
        let introspector = introspector(model, |c| c.allowed_relations = vec!["Orphan.Ghost".into()]);
        assert_eq!(names(&introspector.introspect("Orphan")), vec!["Title"]);
        assert!(introspector.introspect("Missing").is_empty());
    }

    #[test]
    fn block_area_falls_back_to_every_concrete_block_type() {
        let introspector = introspector(site(), |c| c.allowed_relation_types = vec!["BlockArea".into()]);
        let fields = introspector.introspect("Page");
        let area = fields.iter().find(|f| f.is_block_area()).unwrap();

        let types: Vec<_> = area.allowed_types.iter().map(|t| t.type_name.as_str()).collect();
        assert_eq!(types, vec!["TextBlock", "QuoteBlock"]);
        assert_eq!(area.allowed_types[0].title, "Text");
        assert_eq!(area.allowed_types[1].title, "Quote Block");
        assert_eq!(names(&area.allowed_types[0].children), vec!["Title", "Body"]);
    }

    #[test]
    fn configured_block_types_win() {
        let model = site().register(
            TypeInfo::new("Landing").relation(
                RelationMeta::new("Sections", RelationCardinality::BlockArea, "BlockArea")
                    .allowing(["QuoteBlock", "BaseBlock"]),
            ),
        );
        let introspector = introspector(model, |c| c.allowed_relation_types = vec!["BlockArea".into()]);
        let fields = introspector.introspect("Landing");
        let types: Vec<_> = fields[0].allowed_types.iter().map(|t| t.type_name.as_str()).collect();
        assert_eq!(types, vec!["QuoteBlock"]);
    }

    #[test]
    fn shared_block_types_are_described_identically() {
        let model = site().register(
            TypeInfo::new("Landing")
                .relation(RelationMeta::new("Header", RelationCardinality::BlockArea, "BlockArea"))
                .relation(RelationMeta::new("Footer", RelationCardinality::BlockArea, "BlockArea")),
        );
        let introspector = introspector(model, |c| c.allowed_relation_types = vec!["BlockArea".into()]);
        let fields = introspector.introspect("Landing");
        assert_eq!(fields[0].allowed_types, fields[1].allowed_types);
    }

    #[test]
    fn self_nesting_blocks_stop_at_block_depth() {
        let model = site().register(
            TypeInfo::new("ColumnBlock")
                .extends("BaseBlock")
                .relation(RelationMeta::new("Columns", RelationCardinality::BlockArea, "BlockArea").allowing(["ColumnBlock"])),
        );
        let introspector = introspector(model, |c| c.allowed_relation_types = vec!["BlockArea".into()]);
        let fields = introspector.introspect("ColumnBlock");
        assert_eq!(tree_depth(&fields), 5);
    }

    #[test]
    fn repeated_block_types_share_one_subtree_per_depth() {
        let mut model = ModelRegistry::new()
            .register(TypeInfo::new("Page").relation(RelationMeta::new("Blocks", RelationCardinality::BlockArea, "BlockArea")))
            .register(TypeInfo::new("BlockArea"))
            .register(TypeInfo::new("BaseBlock").abstract_type());
        for i in 0..8 {
            model = model.register(
                TypeInfo::new(format!("Block{i}"))
                    .extends("BaseBlock")
                    .field(FieldMeta::new("Heading", "Varchar"))
                    .relation(RelationMeta::new("Inner", RelationCardinality::BlockArea, "BlockArea")),
            );
        }
        let introspector = introspector(model.with_block_base("BaseBlock"), |c| {
            c.allowed_relation_types = vec!["BlockArea".into()];
        });
        let fields = introspector.introspect("Page");
        assert_eq!(tree_depth(&fields), 5);

        fn inner(block: &BlockTypeDescriptor) -> &[BlockTypeDescriptor] {
            &block.children.iter().find(|f| f.name == "Inner").unwrap().allowed_types
        }
        let top = &fields[0].allowed_types;
        assert_eq!(top.len(), 8);
        let (first, last) = (inner(&top[0]), inner(&top[7]));
        assert!(Arc::ptr_eq(&first[3].children, &last[3].children));
        assert!(!Arc::ptr_eq(&top[3].children, &first[3].children));
    }

    #[test]
    fn inline_enum_options_become_choices() {
        let fields = introspector(site(), |_| {}).introspect("Page");
        let status = fields.iter().find(|f| f.name == "Status").unwrap();
        assert_eq!(status.value_type, ValueType::Scalar(ScalarType::Choice));
        let values: Vec<_> = status.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["Draft", "Published"]);
    }

    #[test]
    fn label_overrides_apply() {
        let introspector = introspector(site(), |c| {
            c.field_labels.insert("MetaDescription".into(), "SEO description".into());
        });
        let fields = introspector.introspect("Page");
        assert_eq!(fields[1].title, "SEO description");
    }

    #[test]
    fn humanize_identifiers() {
        assert_eq!(humanize("MetaTitle"), "Meta Title");
        assert_eq!(humanize("hero_image"), "Hero Image");
        assert_eq!(humanize("URLSegment"), "URL Segment");
        assert_eq!(humanize("ID"), "ID");
        assert_eq!(humanize("Title"), "Title");
    }
}
