// crates/serve/src/render/kind.rs

use serde::Serialize;

/// Leaf block kinds the renderer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Heading,
    Text,
    Table,
    Code,
    Cta,
    Banner,
    TableOfContents,
    Spacer,
    Alert,
    Accordion,
    Image,
    Embed,
    RelatedTools,
    /// Anything the table does not list. Goes to the fallback renderer.
    Unknown,
}

/// Tag → kind dispatch table. `quote` shares the paragraph view.
pub const KIND_TABLE: &[(&str, BlockKind)] = &[
    ("paragraph", BlockKind::Paragraph),
    ("quote", BlockKind::Paragraph),
    ("heading", BlockKind::Heading),
    ("text", BlockKind::Text),
    ("table", BlockKind::Table),
    ("code", BlockKind::Code),
    ("cta", BlockKind::Cta),
    ("banner", BlockKind::Banner),
    ("table_of_contents", BlockKind::TableOfContents),
    ("spacer", BlockKind::Spacer),
    ("alert", BlockKind::Alert),
    ("accordion", BlockKind::Accordion),
    ("image", BlockKind::Image),
    ("embed", BlockKind::Embed),
    ("related_tools", BlockKind::RelatedTools),
];

impl BlockKind {
    pub fn from_tag(tag: &str) -> Self {
        KIND_TABLE
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, k)| *k)
            .unwrap_or(BlockKind::Unknown)
    }
}
