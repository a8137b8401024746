pub mod block;
pub mod setting;

pub use block::{decode_document, BlockBody, BlockError, ContentBlock, CATEGORY_TAGS};
pub use setting::{AdSettings, RenderSettings};
