pub mod render;

use render::RenderError;
use serde_json::Value as Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

/// Locate the block array in CMS input: the page object's `body` when there
/// is one, otherwise the input itself.
///
/// The result is not checked; `BlockRenderer::render_document` logs and
/// renders nothing for anything but an array.
pub fn document_body(input: &Json) -> &Json {
    match input {
        Json::Object(page) => page.get("body").unwrap_or(input),
        _ => input,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_from_array_or_page() {
        let arr = json!([{ "type": "paragraph", "value": { "text": "a" } }]);
        assert_eq!(document_body(&arr), &arr);

        let page = json!({ "title": "t", "body": [] });
        assert_eq!(document_body(&page), &json!([]));
    }

    #[test]
    fn malformed_body_is_passed_through() {
        assert_eq!(document_body(&json!({ "body": "x" })), &json!("x"));
        assert_eq!(document_body(&json!(3)), &json!(3));

        let page = json!({ "title": "t" });
        assert_eq!(document_body(&page), &page);
    }
}
