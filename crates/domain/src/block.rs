// crates/domain/src/block.rs

use serde::Deserialize;
use serde_json::Value as Json;
use thiserror::Error;
use tracing::warn;

/// Block types that only group authoring-time content.
///
/// The set is closed: a category block never renders anything itself.
pub const CATEGORY_TAGS: [&str; 4] = ["basic_content", "media", "monetization", "layout"];

pub fn is_category_tag(tag: &str) -> bool {
    CATEGORY_TAGS.contains(&tag)
}

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("document body is not an array (found {0})")]
    NotAnArray(&'static str),

    #[error("malformed block: {0}")]
    Malformed(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Block tree
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum BlockBody {
    /// Children of a category block, in authoring order.
    Children(Vec<ContentBlock>),
    /// Type-specific payload of a leaf block.
    Payload(Json),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentBlock {
    pub block_type: String,
    pub body: BlockBody,
    pub id: Option<String>,
}

impl ContentBlock {
    pub fn leaf(block_type: impl Into<String>, value: Json) -> Self {
        Self {
            block_type: block_type.into(),
            body: BlockBody::Payload(value),
            id: None,
        }
    }

    pub fn category(block_type: impl Into<String>, children: Vec<ContentBlock>) -> Self {
        Self {
            block_type: block_type.into(),
            body: BlockBody::Children(children),
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// True for a category tag carrying a list of children.
    pub fn is_category(&self) -> bool {
        matches!(self.body, BlockBody::Children(_)) && is_category_tag(&self.block_type)
    }

    /// A category tag whose value was not list-shaped. It has no content.
    pub fn is_hollow_category(&self) -> bool {
        matches!(self.body, BlockBody::Payload(_)) && is_category_tag(&self.block_type)
    }

    pub fn children(&self) -> Option<&[ContentBlock]> {
        match &self.body {
            BlockBody::Children(c) => Some(c),
            BlockBody::Payload(_) => None,
        }
    }

    pub fn payload(&self) -> Option<&Json> {
        match &self.body {
            BlockBody::Payload(v) => Some(v),
            BlockBody::Children(_) => None,
        }
    }

    /// Decode one block (and, for categories, its subtree) from JSON.
    pub fn from_json(raw: &Json) -> Result<Self, BlockError> {
        let raw = RawBlock::deserialize(raw).map_err(|e| BlockError::Malformed(e.to_string()))?;

        let id = match raw.id {
            Some(Json::String(s)) if !s.trim().is_empty() => Some(s),
            Some(Json::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let body = match raw.value {
            Json::Array(items) if is_category_tag(&raw.block_type) => {
                BlockBody::Children(decode_items(&items))
            }
            other => BlockBody::Payload(other),
        };

        Ok(Self {
            block_type: raw.block_type,
            body,
            id,
        })
    }
}

#[derive(Deserialize)]
struct RawBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    value: Json,
    #[serde(default)]
    id: Option<Json>,
}

fn decode_items(items: &[Json]) -> Vec<ContentBlock> {
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| match ContentBlock::from_json(item) {
            Ok(block) => Some(block),
            Err(e) => {
                warn!(index = i, "skipping block: {}", e);
                None
            }
        })
        .collect()
}

fn json_kind(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

/// Decode a whole document body. Malformed elements are dropped.
pub fn decode_document(doc: &Json) -> Result<Vec<ContentBlock>, BlockError> {
    match doc {
        Json::Array(items) => Ok(decode_items(items)),
        other => Err(BlockError::NotAnArray(json_kind(other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leaf_keeps_payload_and_id() {
        let b = ContentBlock::from_json(&json!({
            "type": "paragraph",
            "value": { "text": "hi" },
            "id": "abc"
        }))
        .unwrap();

        assert_eq!(b.block_type, "paragraph");
        assert_eq!(b.id.as_deref(), Some("abc"));
        assert_eq!(b.payload(), Some(&json!({ "text": "hi" })));
        assert!(!b.is_category());
    }

    #[test]
    fn numeric_id_is_stringified() {
        let b = ContentBlock::from_json(&json!({ "type": "spacer", "value": {}, "id": 42 })).unwrap();
        assert_eq!(b.id.as_deref(), Some("42"));
    }

    #[test]
    fn blank_id_counts_as_missing() {
        for id in [json!(""), json!("  "), json!(null), json!(true)] {
            let b = ContentBlock::from_json(&json!({ "type": "paragraph", "value": {}, "id": id })).unwrap();
            assert_eq!(b.id, None, "id {id}");
        }
    }

    #[test]
    fn category_with_list_decodes_children_recursively() {
        let b = ContentBlock::from_json(&json!({
            "type": "media",
            "value": [
                { "type": "paragraph", "value": { "text": "a" } },
                { "type": "layout", "value": [ { "type": "spacer", "value": {} } ] }
            ]
        }))
        .unwrap();

        assert!(b.is_category());
        let children = b.children().unwrap();
        assert_eq!(children.len(), 2);
        assert!(children[1].is_category());
        assert_eq!(children[1].children().unwrap()[0].block_type, "spacer");
    }

    #[test]
    fn category_without_list_is_hollow() {
        let b = ContentBlock::from_json(&json!({ "type": "monetization", "value": { "x": 1 } }))
            .unwrap();
        assert!(!b.is_category());
        assert!(b.is_hollow_category());
    }

    #[test]
    fn non_category_with_list_payload_stays_leaf() {
        let b = ContentBlock::from_json(&json!({ "type": "related_tools", "value": [1, 2] }))
            .unwrap();
        assert!(!b.is_category());
        assert_eq!(b.payload(), Some(&json!([1, 2])));
    }

    #[test]
    fn missing_value_is_null_payload() {
        let b = ContentBlock::from_json(&json!({ "type": "spacer" })).unwrap();
        assert_eq!(b.payload(), Some(&Json::Null));
    }

    #[test]
    fn document_drops_malformed_elements() {
        let doc = json!([
            { "type": "paragraph", "value": { "text": "ok" } },
            "not a block",
            { "value": { "text": "no type" } },
            { "type": "heading", "value": { "text": "h" } }
        ]);
        let blocks = decode_document(&doc).unwrap();
        let types: Vec<_> = blocks.iter().map(|b| b.block_type.as_str()).collect();
        assert_eq!(types, ["paragraph", "heading"]);
    }

    #[test]
    fn document_must_be_array() {
        match decode_document(&json!({ "type": "paragraph" })) {
            Err(BlockError::NotAnArray(kind)) => assert_eq!(kind, "object"),
            other => panic!("expected NotAnArray, got {other:?}"),
        }
    }
}
