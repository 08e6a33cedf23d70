//! Block type tags.

use contentpilot_core::content::ContentModel;
use contentpilot_core::schema::TYPE_TAG_KEYS;
use serde_json::{Map, Value};

/// Type-tag keys in lookup order: the built-in ones, then configured extras.
pub(crate) fn tag_keys(extra: &[String]) -> Vec<String> {
    let mut keys: Vec<String> = TYPE_TAG_KEYS.iter().map(|k| k.to_string()).collect();
    for key in extra {
        if !keys.contains(key) {
            keys.push(key.clone());
        }
    }
    keys
}

/// The tag of a block entry: the value of the first tag key present.
///
/// `None` when no tag key is present or the first one is not a non-empty string.
pub(crate) fn find_tag<'v>(keys: &[String], entry: &'v Map<String, Value>) -> Option<&'v str> {
    let value = keys
        .iter()
        .find_map(|key| entry.get(key).filter(|v| !v.is_null()))?;
    value.as_str().map(str::trim).filter(|tag| !tag.is_empty())
}

/// Map a tag onto one of the allowed block types.
///
/// Tries the exact name, then a case-insensitive match, then the unqualified
/// name (`App\Blocks\TextBlock`), then the type's title.
pub(crate) fn resolve<'a>(model: &dyn ContentModel, tag: &str, allowed: &'a [String]) -> Option<&'a str> {
    if let Some(exact) = allowed.iter().find(|t| t.as_str() == tag) {
        return Some(exact.as_str());
    }
    if let Some(folded) = allowed.iter().find(|t| t.eq_ignore_ascii_case(tag)) {
        return Some(folded.as_str());
    }
    let short = tag.rsplit(['\\', '/', '.', ':']).next().unwrap_or(tag);
    if let Some(unqualified) = allowed.iter().find(|t| t.eq_ignore_ascii_case(short)) {
        return Some(unqualified.as_str());
    }
    allowed
        .iter()
        .find(|t| {
            model
                .type_info(t)
                .and_then(|info| info.title.as_deref())
                .is_some_and(|title| title.eq_ignore_ascii_case(tag))
        })
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentpilot_core::content::TypeInfo;
    use contentpilot_store::ModelRegistry;
    use serde_json::json;

    fn entry(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn extra_keys_follow_builtins() {
        let keys = tag_keys(&["kind".to_string(), "type".to_string()]);
        assert_eq!(keys, vec!["BlockType", "ClassName", "_type", "type", "kind"]);
    }

    #[test]
    fn first_present_key_wins() {
        let keys = tag_keys(&[]);
        let e = entry(json!({"type": "QuoteBlock", "BlockType": "TextBlock"}));
        assert_eq!(find_tag(&keys, &e), Some("TextBlock"));
        assert_eq!(find_tag(&keys, &entry(json!({"Heading": "x"}))), None);
        assert_eq!(find_tag(&keys, &entry(json!({"BlockType": 5}))), None);
    }

    #[test]
    fn resolves_loose_spellings() {
        let model = ModelRegistry::new()
            .register(TypeInfo::new("TextBlock").titled("Text"))
            .register(TypeInfo::new("QuoteBlock"));
        let allowed = vec!["TextBlock".to_string(), "QuoteBlock".to_string()];

        assert_eq!(resolve(&model, "TextBlock", &allowed), Some("TextBlock"));
        assert_eq!(resolve(&model, "textblock", &allowed), Some("TextBlock"));
        assert_eq!(resolve(&model, "App\\Blocks\\QuoteBlock", &allowed), Some("QuoteBlock"));
        assert_eq!(resolve(&model, "text", &allowed), Some("TextBlock"));
        assert_eq!(resolve(&model, "VideoBlock", &allowed), None);
    }
}
