// crates/serve/src/render/engine.rs

use super::error::RenderError;
use super::flatten::flatten;
use super::fragment::{AdPlacement, Fragment, FragmentKind};
use super::kind::BlockKind;
use super::plan::{plan, AdPlan};
use super::toc::{collect_headings, TocItem};
use super::view::{FragmentViews, HbsViews};
use domain::{
    block::{decode_document, BlockBody, ContentBlock},
    setting::RenderSettings,
};
use serde_json::Value as Json;
use tracing::{debug, error, warn};

/// Turns a block tree into fragments and splices in-content ads.
///
/// Holds only configuration and views; every call starts from scratch.
pub struct BlockRenderer<V = HbsViews> {
    views: V,
    settings: RenderSettings,
}

impl BlockRenderer<HbsViews> {
    pub fn with_settings(settings: RenderSettings) -> Result<Self, RenderError> {
        Ok(Self::new(HbsViews::new()?, settings))
    }
}

impl<V: FragmentViews> BlockRenderer<V> {
    pub fn new(views: V, settings: RenderSettings) -> Self {
        Self { views, settings }
    }

    /// Render a decoded-JSON document body. Anything but an array renders
    /// as an empty document.
    pub fn render_document(&self, doc: &Json) -> Vec<Fragment> {
        match decode_document(doc) {
            Ok(blocks) => self.render(&blocks),
            Err(e) => {
                warn!("rendering empty document: {}", e);
                Vec::new()
            }
        }
    }

    #[tracing::instrument(skip_all, fields(blocks = blocks.len()))]
    pub fn render(&self, blocks: &[ContentBlock]) -> Vec<Fragment> {
        let flat = flatten(blocks);
        let ad_plan = plan(&flat, &self.settings.ads);
        let headings = collect_headings(&flat);
        debug!(leaves = flat.len(), ?ad_plan, "render plan ready");

        let mut pass = RenderPass {
            renderer: self,
            ad_plan,
            headings: &headings,
            next_leaf: 0,
            out: Vec::with_capacity(flat.len() + 2),
        };
        pass.walk(blocks);
        pass.out
    }

    fn ad_fragment(&self, placement: AdPlacement, leaf: usize) -> Option<Fragment> {
        let slot = match placement {
            AdPlacement::AfterToc => self.settings.ads.toc_slot(),
            AdPlacement::Middle => self.settings.ads.middle_slot(),
        }?;

        match self.views.render_ad(slot, placement) {
            Ok(html) if html.is_empty() => None,
            Ok(html) => Some(Fragment {
                key: format!("ad-{}-{}", placement.tag(), leaf),
                kind: FragmentKind::Ad {
                    slot: slot.to_string(),
                    placement,
                },
                html,
            }),
            Err(e) => {
                error!(slot, placement = placement.tag(), "ad slot failed: {}", e);
                None
            }
        }
    }

    fn leaf_fragment(&self, block: &ContentBlock, leaf: usize, headings: &[TocItem]) -> Option<Fragment> {
        let key = block
            .id
            .clone()
            .unwrap_or_else(|| format!("block-{leaf}"));
        let value = block.payload().unwrap_or(&Json::Null);

        let kind = BlockKind::from_tag(&block.block_type);
        if kind == BlockKind::Unknown {
            warn!(block_type = %block.block_type, "unknown block type");
            return self.diagnostic(key, block, Diagnosis::Unknown(value));
        }

        let headings = match kind {
            BlockKind::Heading => own_anchor(headings, leaf),
            _ => headings,
        };

        match self.views.render_block(kind, value, headings) {
            Ok(html) if html.is_empty() => None,
            Ok(html) => Some(Fragment {
                key,
                kind: FragmentKind::Block(kind),
                html,
            }),
            Err(e) => {
                error!(block_type = %block.block_type, "block render failed: {}", e);
                self.diagnostic(key, block, Diagnosis::Failed(&e))
            }
        }
    }

    fn diagnostic(&self, key: String, block: &ContentBlock, why: Diagnosis<'_>) -> Option<Fragment> {
        if !self.settings.diagnostics {
            return None;
        }
        let block_type = html_escape::encode_text(&block.block_type);
        let html = match why {
            Diagnosis::Unknown(value) => {
                let raw = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                format!(
                    "<div class=\"block-diagnostic block-diagnostic--unknown\">\
                     <p>未実装のブロック型: {}</p><pre>{}</pre></div>",
                    block_type,
                    html_escape::encode_text(&raw)
                )
            }
            Diagnosis::Failed(err) => format!(
                "<div class=\"block-diagnostic block-diagnostic--error\">\
                 <p>ブロックレンダリングエラー: {}</p><pre>{}</pre></div>",
                block_type,
                html_escape::encode_text(&err.to_string())
            ),
        };
        Some(Fragment {
            key,
            kind: FragmentKind::Diagnostic {
                block_type: block.block_type.clone(),
            },
            html,
        })
    }
}

/// The collected entry for the heading at flattened index `leaf`, if any.
fn own_anchor(headings: &[TocItem], leaf: usize) -> &[TocItem] {
    match headings.binary_search_by_key(&leaf, |h| h.index) {
        Ok(i) => std::slice::from_ref(&headings[i]),
        Err(_) => &[],
    }
}

enum Diagnosis<'a> {
    Unknown(&'a Json),
    Failed(&'a RenderError),
}

/// State of a single render call.
struct RenderPass<'r, V> {
    renderer: &'r BlockRenderer<V>,
    ad_plan: AdPlan,
    headings: &'r [TocItem],
    /// Flattened index of the next leaf; advances in `flatten` order.
    next_leaf: usize,
    out: Vec<Fragment>,
}

impl<V: FragmentViews> RenderPass<'_, V> {
    fn walk(&mut self, blocks: &[ContentBlock]) {
        for block in blocks {
            match &block.body {
                BlockBody::Children(children) if block.is_category() => self.walk(children),
                _ if block.is_hollow_category() => {
                    debug!(block_type = %block.block_type, "skipping category without children");
                }
                _ => self.leaf(block),
            }
        }
    }

    fn leaf(&mut self, block: &ContentBlock) {
        let idx = self.next_leaf;
        self.next_leaf += 1;

        if self.ad_plan.mid_document == Some(idx) {
            self.push_ad(AdPlacement::Middle, idx);
        }

        if let Some(fragment) = self.renderer.leaf_fragment(block, idx, self.headings) {
            self.out.push(fragment);
        }

        if self.ad_plan.after_toc == Some(idx) {
            self.push_ad(AdPlacement::AfterToc, idx);
        }
    }

    fn push_ad(&mut self, placement: AdPlacement, idx: usize) {
        if let Some(fragment) = self.renderer.ad_fragment(placement, idx) {
            self.out.push(fragment);
        }
    }
}
