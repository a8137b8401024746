// crates/serve/src/render/fragment.rs

use super::kind::BlockKind;
use serde::Serialize;
use std::fmt;

/// Where an in-content ad sits. The tag is what the ad slot component sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AdPlacement {
    AfterToc,
    Middle,
}

impl AdPlacement {
    pub fn tag(self) -> &'static str {
        match self {
            AdPlacement::AfterToc => "blog-toc",
            AdPlacement::Middle => "blog-middle",
        }
    }
}

impl fmt::Display for AdPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FragmentKind {
    Block(BlockKind),
    Ad { slot: String, placement: AdPlacement },
    /// Visible only when diagnostics are on.
    Diagnostic { block_type: String },
}

/// One renderable piece of output, mounted in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    /// Stable key: block id, or a positional key.
    pub key: String,
    pub kind: FragmentKind,
    pub html: String,
}

impl Fragment {
    pub fn is_ad(&self) -> bool {
        matches!(self.kind, FragmentKind::Ad { .. })
    }
}

pub fn fragments_to_html(fragments: &[Fragment]) -> String {
    let mut out = String::with_capacity(fragments.iter().map(|f| f.html.len() + 1).sum());
    for f in fragments {
        out.push_str(&f.html);
        out.push('\n');
    }
    out
}
