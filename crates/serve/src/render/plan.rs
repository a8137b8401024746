// crates/serve/src/render/plan.rs

use domain::{block::ContentBlock, setting::AdSettings};

/// The middle ad is only considered for documents at least this long.
pub const MIN_BLOCKS_FOR_MIDDLE_AD: usize = 6;

/// Candidates checked for the middle ad: `len / 2` and the next two.
pub const MIDDLE_SCAN_WINDOW: usize = 3;

/// A middle ad never goes directly under one of these.
pub const DISALLOWED_PREDECESSORS: [&str; 4] = ["cta", "banner", "asp_comparison", "table_of_contents"];

/// Positions, in flattened coordinates, where ad fragments are spliced in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdPlan {
    /// Index of the first table of contents. The ad goes after it.
    pub after_toc: Option<usize>,
    /// Index of a heading near the middle. The ad goes before it.
    pub mid_document: Option<usize>,
}

pub fn plan(flat: &[&ContentBlock], ads: &AdSettings) -> AdPlan {
    if !ads.enabled {
        return AdPlan::default();
    }

    let after_toc = ads
        .toc_slot()
        .and_then(|_| flat.iter().position(|b| b.block_type == "table_of_contents"));

    let mid_document = ads.middle_slot().and_then(|_| middle_heading(flat));

    AdPlan {
        after_toc,
        mid_document,
    }
}

fn middle_heading(flat: &[&ContentBlock]) -> Option<usize> {
    if flat.len() < MIN_BLOCKS_FOR_MIDDLE_AD {
        return None;
    }
    let target = flat.len() / 2;
    let end = (target + MIDDLE_SCAN_WINDOW).min(flat.len());

    (target..end).find(|&i| flat[i].block_type == "heading" && predecessor_allows_ad(flat, i))
}

// Index 0 has no predecessor and counts as allowed. The length guard keeps
// the scan window at index 3 or later, so this is a boundary rule only.
fn predecessor_allows_ad(flat: &[&ContentBlock], i: usize) -> bool {
    match i.checked_sub(1) {
        Some(prev) => !DISALLOWED_PREDECESSORS.contains(&flat[prev].block_type.as_str()),
        None => true,
    }
}
