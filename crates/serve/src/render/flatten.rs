// crates/serve/src/render/flatten.rs

use domain::block::{BlockBody, ContentBlock};

/// Expand category blocks in place, depth first, keeping only leaves.
///
/// Hollow categories (category tag, non-list value) contribute nothing.
/// The result borrows from `blocks`; it is the coordinate space for ad
/// placement.
pub fn flatten(blocks: &[ContentBlock]) -> Vec<&ContentBlock> {
    let mut out = Vec::with_capacity(blocks.len());
    flatten_into(blocks, &mut out);
    out
}

fn flatten_into<'a>(blocks: &'a [ContentBlock], out: &mut Vec<&'a ContentBlock>) {
    for block in blocks {
        if block.is_category() {
            if let BlockBody::Children(children) = &block.body {
                flatten_into(children, out);
            }
        } else if !block.is_hollow_category() {
            out.push(block);
        }
    }
}
