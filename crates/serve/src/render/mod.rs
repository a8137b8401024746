pub mod engine;
pub mod error;
pub mod flatten;
pub mod fragment;
pub mod kind;
pub mod plan;
pub mod toc;
pub mod view;

pub use engine::BlockRenderer;
pub use error::RenderError;
pub use flatten::flatten;
pub use fragment::{fragments_to_html, AdPlacement, Fragment, FragmentKind};
pub use kind::BlockKind;
pub use plan::{plan, AdPlan};
pub use toc::{collect_headings, heading_id, slugify, TocItem};
pub use view::{FragmentViews, HbsViews};
