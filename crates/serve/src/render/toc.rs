// crates/serve/src/render/toc.rs

use domain::block::ContentBlock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::{collections::HashMap, sync::OnceLock};

/// Slug used when a heading's text leaves nothing to slugify.
const FALLBACK_SLUG: &str = "section";

/// A document heading with its anchor id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocItem {
    pub id: String,
    pub text: String,
    pub level: u8,
    /// Flattened index of the heading block.
    #[serde(skip)]
    pub index: usize,
}

fn strip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // ASCII word chars, kana, CJK ideographs, whitespace and '-' survive.
        Regex::new(r"[^a-zA-Z0-9_\x{3040}-\x{309f}\x{30a0}-\x{30ff}\x{4e00}-\x{9faf}\s-]")
            .expect("static slug regex")
    })
}

fn sep_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s-]+").expect("static separator regex"))
}

/// URL-safe slug that keeps Japanese text readable.
pub fn slugify(text: &str) -> String {
    let lower = text.trim().to_lowercase();
    let kept = strip_re().replace_all(&lower, "");
    let joined = sep_re().replace_all(&kept, "_");
    joined.trim_matches('_').to_string()
}

/// Anchor id shared by heading elements and toc links, before
/// de-duplication.
pub fn heading_id(text: &str) -> String {
    let slug = slugify(text);
    if slug.is_empty() {
        format!("heading-{FALLBACK_SLUG}")
    } else {
        format!("heading-{slug}")
    }
}

/// Heading level from either `"h3"` or `3`. Anything outside 2..=6 is `None`.
pub fn parse_level(v: &Json) -> Option<u8> {
    let n = match v {
        Json::Number(n) => n.as_u64()?,
        Json::String(s) => s.trim().trim_start_matches(['h', 'H']).parse::<u64>().ok()?,
        _ => return None,
    };
    (2..=6).contains(&n).then_some(n as u8)
}

#[derive(Deserialize)]
struct HeadingFields {
    #[serde(default)]
    text: String,
    #[serde(default)]
    level: Json,
}

/// Every heading of a flattened document, in order, with ids unique within
/// the document. Repeats get `-2`, `-3`, ... appended.
///
/// Headings whose payload can't be read are left out; the heading block
/// itself still goes through the normal failure path.
pub fn collect_headings(flat: &[&ContentBlock]) -> Vec<TocItem> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    flat.iter()
        .enumerate()
        .filter(|(_, b)| b.block_type == "heading")
        .filter_map(|(index, b)| {
            let h = HeadingFields::deserialize(b.payload()?).ok()?;
            Some((index, h))
        })
        .map(|(index, h)| {
            let base = heading_id(&h.text);
            let n = seen.entry(base.clone()).or_insert(0);
            *n += 1;
            let id = if *n == 1 { base } else { format!("{base}-{n}") };
            TocItem {
                id,
                level: parse_level(&h.level).unwrap_or(2),
                text: h.text,
                index,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn slugify_ascii() {
        assert_eq!(slugify("  Hello, World! "), "hello_world");
        assert_eq!(slugify("a - b -- c"), "a_b_c");
        assert_eq!(slugify("--edge--"), "edge");
    }

    #[test]
    fn slugify_keeps_japanese() {
        assert_eq!(slugify("FX自動売買 ツールとは？"), "fx自動売買_ツールとは");
    }

    #[test]
    fn heading_id_prefix() {
        assert_eq!(heading_id("Why EAs?"), "heading-why_eas");
    }

    #[test]
    fn levels_from_string_or_number() {
        assert_eq!(parse_level(&json!("h3")), Some(3));
        assert_eq!(parse_level(&json!(4)), Some(4));
        assert_eq!(parse_level(&json!("h1")), None);
        assert_eq!(parse_level(&json!(7)), None);
        assert_eq!(parse_level(&Json::Null), None);
    }

    #[test]
    fn heading_id_never_ends_in_bare_prefix() {
        assert_eq!(heading_id("？！"), "heading-section");
        assert_eq!(heading_id(""), "heading-section");
    }

    #[test]
    fn collects_every_heading_with_level_and_index() {
        let blocks = vec![
            ContentBlock::leaf("heading", json!({ "text": "Intro", "level": "h2" })),
            ContentBlock::leaf("paragraph", json!({ "text": "x" })),
            ContentBlock::leaf("heading", json!({ "text": "Detail", "level": 3 })),
            ContentBlock::leaf("heading", json!({ "text": "Minor", "level": "h4" })),
            ContentBlock::leaf("heading", json!({ "text": "Default" })),
            ContentBlock::leaf("heading", json!("not an object")),
        ];
        let flat: Vec<_> = blocks.iter().collect();
        let items = collect_headings(&flat);
        let got: Vec<_> = items.iter().map(|i| (i.text.as_str(), i.level, i.index)).collect();
        assert_eq!(
            got,
            [("Intro", 2, 0), ("Detail", 3, 2), ("Minor", 4, 3), ("Default", 2, 4)]
        );
        assert_eq!(items[0].id, "heading-intro");
    }

    #[test]
    fn repeated_headings_get_distinct_ids() {
        let blocks = vec![
            ContentBlock::leaf("heading", json!({ "text": "FAQ" })),
            ContentBlock::leaf("heading", json!({ "text": "faq!" })),
            ContentBlock::leaf("heading", json!({ "text": "？" })),
            ContentBlock::leaf("heading", json!({ "text": "FAQ", "level": "h3" })),
            ContentBlock::leaf("heading", json!({ "text": "Section" })),
        ];
        let flat: Vec<_> = blocks.iter().collect();
        let ids: Vec<_> = collect_headings(&flat).into_iter().map(|i| i.id).collect();
        assert_eq!(
            ids,
            [
                "heading-faq",
                "heading-faq-2",
                "heading-section",
                "heading-faq-3",
                "heading-section-2"
            ]
        );
    }
}
