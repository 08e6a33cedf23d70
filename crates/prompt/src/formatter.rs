//! Schema tree → prompt text.
//!
//! The top-level list is split into three buckets (content fields,
//! relations, block areas), each under its own heading. Nested fields are
//! rendered in tree order. A block type is expanded the first time it
//! appears in the document; later occurrences are back-references.
//!
//! Verbose:
//!
//! ```text
//! ## Content fields
//! - Title (Title): text - Page heading
//! - Status (Status): choice [Draft (draft), Live (live)]
//!
//! ## Block areas
//! - Blocks (Blocks): block list
//!   - Text (TextBlock): block
//!     - Body (Body): rich-text
//! ```
//!
//! Compact:
//!
//! ```text
//! [fields]
//! Title:text|Page heading
//! Status:choice(draft,live)
//!
//! [blocks]
//! Blocks:area[TextBlock{Body:rich-text}]
//! ```

use contentpilot_config::PromptMode;
use contentpilot_core::schema::{BlockTypeDescriptor, FieldDescriptor, FieldKind};
use std::collections::HashSet;

/// Render a schema tree in the given mode.
pub fn format(fields: &[FieldDescriptor], mode: PromptMode) -> String {
    let scalars: Vec<&FieldDescriptor> = fields.iter().filter(|f| f.is_scalar()).collect();
    let relations: Vec<&FieldDescriptor> = fields.iter().filter(|f| f.is_relation()).collect();
    let areas: Vec<&FieldDescriptor> = fields.iter().filter(|f| f.is_block_area()).collect();

    let mut renderer = Renderer {
        mode,
        described: HashSet::new(),
        out: String::new(),
    };
    renderer.bucket(Bucket::Fields, &scalars);
    renderer.bucket(Bucket::Relations, &relations);
    renderer.bucket(Bucket::BlockAreas, &areas);

    if renderer.out.is_empty() {
        return match mode {
            PromptMode::Verbose => "(no content fields)\n".to_string(),
            PromptMode::Compact => "[fields]\n".to_string(),
        };
    }
    renderer.out
}

#[derive(Clone, Copy)]
enum Bucket {
    Fields,
    Relations,
    BlockAreas,
}

impl Bucket {
    fn heading(self, mode: PromptMode) -> &'static str {
        match (mode, self) {
            (PromptMode::Verbose, Self::Fields) => "## Content fields",
            (PromptMode::Verbose, Self::Relations) => "## Relations",
            (PromptMode::Verbose, Self::BlockAreas) => "## Block areas",
            (PromptMode::Compact, Self::Fields) => "[fields]",
            (PromptMode::Compact, Self::Relations) => "[relations]",
            (PromptMode::Compact, Self::BlockAreas) => "[blocks]",
        }
    }
}

struct Renderer {
    mode: PromptMode,
    /// Block types already expanded in this document.
    described: HashSet<String>,
    out: String,
}

impl Renderer {
    fn bucket(&mut self, bucket: Bucket, fields: &[&FieldDescriptor]) {
        if fields.is_empty() {
            return;
        }
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out.push_str(bucket.heading(self.mode));
        self.out.push('\n');

        for field in fields {
            match self.mode {
                PromptMode::Verbose => self.verbose_field(field, 0),
                PromptMode::Compact => {
                    let token = self.compact_field(field);
                    self.out.push_str(&token);
                    self.out.push('\n');
                }
            }
        }
    }

    // ── Verbose ───────────────────────────────────────────────────────────

    fn verbose_field(&mut self, field: &FieldDescriptor, indent: usize) {
        let type_label = match field.kind {
            FieldKind::Scalar => field.value_type.to_string(),
            FieldKind::RelationSingle => format!("single {}", field.value_type),
            FieldKind::RelationMany => format!("list of {}", field.value_type),
            FieldKind::BlockArea => "block list".to_string(),
        };

        let mut line = format!("{}- {} ({}): {}", pad(indent), field.title, field.name, type_label);
        if let Some(description) = non_empty(field.description.as_deref()) {
            line.push_str(" - ");
            line.push_str(description);
        }
        if !field.options.is_empty() {
            let options: Vec<String> = field
                .options
                .iter()
                .map(|o| {
                    if o.label == o.value {
                        o.value.clone()
                    } else {
                        format!("{} ({})", o.label, o.value)
                    }
                })
                .collect();
            line.push_str(&format!(" [{}]", options.join(", ")));
        }
        self.out.push_str(&line);
        self.out.push('\n');

        for child in &field.children {
            self.verbose_field(child, indent + 1);
        }
        for block in &field.allowed_types {
            self.verbose_block(block, indent + 1);
        }
    }

    fn verbose_block(&mut self, block: &BlockTypeDescriptor, indent: usize) {
        let mut line = format!("{}- {} ({}): block", pad(indent), block.title, block.type_name);

        if !self.described.insert(block.type_name.clone()) {
            line.push_str(", fields as described above");
            self.out.push_str(&line);
            self.out.push('\n');
            return;
        }

        if let Some(description) = non_empty(block.description.as_deref()) {
            line.push_str(" - ");
            line.push_str(description);
        }
        if block.children.is_empty() {
            line.push_str(", no fields");
        }
        self.out.push_str(&line);
        self.out.push('\n');

        for child in block.children.iter() {
            self.verbose_field(child, indent + 1);
        }
    }

    // ── Compact ───────────────────────────────────────────────────────────

    fn compact_field(&mut self, field: &FieldDescriptor) -> String {
        let mut token = format!("{}:", field.name);
        match field.kind {
            FieldKind::Scalar => {
                token.push_str(&field.value_type.to_string());
                if !field.options.is_empty() {
                    let values: Vec<&str> = field.options.iter().map(|o| o.value.as_str()).collect();
                    token.push_str(&format!("({})", values.join(",")));
                }
            }
            FieldKind::RelationSingle | FieldKind::RelationMany => {
                let arrow = if field.kind == FieldKind::RelationSingle { "one>" } else { "many>" };
                token.push_str(arrow);
                token.push_str(&field.value_type.to_string());
                if !field.children.is_empty() {
                    let children: Vec<String> =
                        field.children.iter().map(|c| self.compact_field(c)).collect();
                    token.push_str(&format!("{{{}}}", children.join(",")));
                }
            }
            FieldKind::BlockArea => {
                let blocks: Vec<String> =
                    field.allowed_types.iter().map(|b| self.compact_block(b)).collect();
                token.push_str(&format!("area[{}]", blocks.join(";")));
            }
        }
        if let Some(description) = non_empty(field.description.as_deref()) {
            token.push('|');
            token.push_str(description);
        }
        token
    }

    fn compact_block(&mut self, block: &BlockTypeDescriptor) -> String {
        if !self.described.insert(block.type_name.clone()) {
            return format!("{}^", block.type_name);
        }
        let children: Vec<String> = block.children.iter().map(|c| self.compact_field(c)).collect();
        format!("{}{{{}}}", block.type_name, children.join(","))
    }
}

fn pad(indent: usize) -> String {
    "  ".repeat(indent)
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}
