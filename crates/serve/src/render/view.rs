// crates/serve/src/render/view.rs

use super::error::RenderError;
use super::fragment::AdPlacement;
use super::kind::BlockKind;
use super::toc::{heading_id, parse_level, TocItem};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// Per-block view components and the ad slot component.
///
/// The render engine treats these as opaque: one block payload in, one HTML
/// fragment out. An empty string means "renders nothing".
///
/// `headings` is the document outline for a table of contents, and the
/// block's own entry (its anchor) for a heading. Other views ignore it.
#[cfg_attr(test, mockall::automock)]
pub trait FragmentViews: Send + Sync {
    fn render_block(
        &self,
        kind: BlockKind,
        value: &Json,
        headings: &[TocItem],
    ) -> Result<String, RenderError>;

    fn render_ad(&self, slot: &str, placement: AdPlacement) -> Result<String, RenderError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Templates
// ─────────────────────────────────────────────────────────────────────────────

const TEMPLATES: &[(&str, &str)] = &[
    ("paragraph", r#"<p class="block-paragraph">{{text}}</p>"#),
    (
        "heading",
        r#"<{{tag}} id="{{id}}" class="block-heading">{{text}}</{{tag}}>"#,
    ),
    ("text", r#"<div class="block-text prose">{{{html}}}</div>"#),
    (
        "table",
        concat!(
            r#"<div class="block-table"><table>"#,
            r#"{{#if header}}<thead><tr>{{#each header}}<th scope="col">{{this}}</th>{{/each}}</tr></thead>{{/if}}"#,
            r#"<tbody>{{#each rows}}<tr>{{#each this}}"#,
            r#"{{#if is_header}}<th scope="row">{{text}}</th>{{else}}<td>{{text}}</td>{{/if}}"#,
            r#"{{/each}}</tr>{{/each}}</tbody></table></div>"#,
        ),
    ),
    (
        "code",
        concat!(
            r#"<figure class="block-code">{{#if caption}}<figcaption>{{caption}}</figcaption>{{/if}}"#,
            r#"<pre data-language="{{language}}"><code class="language-{{language}}">{{code}}</code></pre></figure>"#,
        ),
    ),
    (
        "cta",
        concat!(
            r#"<div class="block-cta">{{#if heading}}<h3 class="block-cta__heading">{{heading}}</h3>{{/if}}"#,
            r#"<p class="block-cta__text">{{text}}</p>"#,
            r#"<a class="block-cta__button cta--{{style}} cta--{{size}}" href="{{url}}" target="_blank" rel="nofollow noopener noreferrer""#,
            r#"{{#if ab_variant}} data-ab-variant="{{ab_variant}}"{{/if}}>{{button_text}}</a></div>"#,
        ),
    ),
    ("banner", r#"<div class="block-banner">{{{html}}}</div>"#),
    (
        "table_of_contents",
        concat!(
            r#"<nav class="block-toc" aria-label="{{title}}"><p class="block-toc__title">{{title}}</p><ol>"#,
            r##"{{#each items}}<li class="toc-h{{level}}"><a href="#{{id}}">{{text}}</a></li>{{/each}}"##,
            r#"</ol></nav>"#,
        ),
    ),
    (
        "spacer",
        r#"<div class="block-spacer spacer--{{size}}" aria-hidden="true" role="presentation"></div>"#,
    ),
    (
        "alert",
        concat!(
            r#"<div class="block-alert alert--{{alert_type}}" role="alert">"#,
            r#"{{#if title}}<h4 class="block-alert__title">{{title}}</h4>{{/if}}"#,
            r#"<div class="block-alert__body">{{{content}}}</div></div>"#,
        ),
    ),
    (
        "accordion",
        concat!(
            r#"<details class="block-accordion"{{#if open}} open{{/if}}><summary>{{title}}</summary>"#,
            r#"<div class="block-accordion__body">{{{content}}}</div></details>"#,
        ),
    ),
    (
        "image",
        r#"<figure class="block-image block-placeholder" data-image-id="{{id}}"></figure>"#,
    ),
    (
        "embed",
        r#"<div class="block-embed block-placeholder"><a href="{{url}}" rel="noopener noreferrer">{{url}}</a></div>"#,
    ),
    (
        "related_tools",
        concat!(
            r#"<section class="block-related-tools block-placeholder" data-display="{{display_style}}">"#,
            r#"<h3>{{title}}</h3><ul>{{#each tool_slugs}}<li data-tool-slug="{{this}}"></li>{{/each}}</ul></section>"#,
        ),
    ),
    (
        "ad",
        concat!(
            r#"<aside class="ad-slot" data-ad-slot="{{slot}}" data-ad-placement="{{placement}}">"#,
            r#"<p class="ad-slot__disclosure">※広告・アフィリエイトリンクを含みます。</p></aside>"#,
        ),
    ),
];

// ─────────────────────────────────────────────────────────────────────────────
// Payload shapes
// ─────────────────────────────────────────────────────────────────────────────

/// Either a bare string or `{ "text": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextValue {
    Bare(String),
    Fields { text: String },
}

impl TextValue {
    fn into_text(self) -> String {
        match self {
            TextValue::Bare(s) | TextValue::Fields { text: s } => s,
        }
    }
}

#[derive(Deserialize)]
struct HeadingValue {
    text: String,
    #[serde(default)]
    level: Json,
}

#[derive(Deserialize)]
struct TableValue {
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
    #[serde(default)]
    first_row_is_table_header: bool,
    #[serde(default)]
    first_col_is_header: bool,
}

#[derive(Serialize)]
struct TableCell {
    text: String,
    is_header: bool,
}

fn default_language() -> String {
    "python".into()
}

#[derive(Deserialize, Serialize)]
struct CodeValue {
    #[serde(default = "default_language")]
    language: String,
    code: String,
    #[serde(default)]
    caption: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum CtaStyle {
    #[default]
    Primary,
    Success,
    Warning,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum CtaSize {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Deserialize, Serialize)]
struct CtaValue {
    #[serde(default)]
    heading: Option<String>,
    text: String,
    button_text: String,
    url: String,
    #[serde(default)]
    style: CtaStyle,
    #[serde(default)]
    size: CtaSize,
    #[serde(default)]
    ab_variant: Option<String>,
}

#[derive(Deserialize)]
struct BannerValue {
    #[serde(default)]
    html_code: Json,
}

fn default_toc_title() -> String {
    "目次".into()
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
struct TocValue {
    #[serde(default = "default_toc_title")]
    title: String,
    #[serde(default = "default_true")]
    show_h2: bool,
    #[serde(default = "default_true")]
    show_h3: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
enum SpacerSize {
    Small,
    #[default]
    Medium,
    Large,
    Xlarge,
}

#[derive(Deserialize, Serialize)]
struct SpacerValue {
    #[serde(default)]
    size: SpacerSize,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
enum AlertType {
    #[default]
    Info,
    Success,
    Warning,
    Danger,
}

#[derive(Deserialize, Serialize)]
struct AlertValue {
    #[serde(default)]
    alert_type: AlertType,
    #[serde(default)]
    title: Option<String>,
    content: String,
}

#[derive(Deserialize)]
struct AccordionValue {
    title: String,
    content: String,
    #[serde(default)]
    is_open_by_default: bool,
}

fn default_related_title() -> String {
    "関連ツール".into()
}

fn default_display_style() -> String {
    "cards".into()
}

#[derive(Deserialize, Serialize)]
struct RelatedToolsValue {
    #[serde(default = "default_related_title")]
    title: String,
    #[serde(default)]
    tool_slugs: Vec<String>,
    #[serde(default = "default_display_style")]
    display_style: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlebars-backed views
// ─────────────────────────────────────────────────────────────────────────────

/// Built-in views, one compiled-in Handlebars template per block kind.
pub struct HbsViews {
    handlebars: Handlebars<'static>,
}

impl HbsViews {
    pub fn new() -> Result<Self, RenderError> {
        let mut handlebars = Handlebars::new();
        for (name, template) in TEMPLATES {
            handlebars.register_template_string(name, *template)?;
        }
        Ok(Self { handlebars })
    }

    fn draw<M: Serialize>(&self, template: &str, model: &M) -> Result<String, RenderError> {
        self.handlebars
            .render(template, model)
            .map_err(RenderError::from)
    }

    fn paragraph(&self, value: &Json) -> Result<String, RenderError> {
        let text = TextValue::deserialize(value)?.into_text();
        self.draw("paragraph", &serde_json::json!({ "text": text }))
    }

    fn heading(&self, value: &Json, anchor: Option<&TocItem>) -> Result<String, RenderError> {
        let h = HeadingValue::deserialize(value)?;
        let level = parse_level(&h.level).unwrap_or(2);
        let id = anchor.map_or_else(|| heading_id(&h.text), |a| a.id.clone());
        self.draw(
            "heading",
            &serde_json::json!({
                "tag": format!("h{level}"),
                "id": id,
                "text": h.text,
            }),
        )
    }

    fn text(&self, value: &Json) -> Result<String, RenderError> {
        let html = TextValue::deserialize(value)?.into_text();
        self.draw("text", &serde_json::json!({ "html": html }))
    }

    fn table(&self, value: &Json) -> Result<String, RenderError> {
        let t = TableValue::deserialize(value)?;
        if t.data.is_empty() {
            return Ok(String::new());
        }

        let mut rows = t
            .data
            .into_iter()
            .map(|row| row.into_iter().map(Option::unwrap_or_default).collect::<Vec<_>>());

        let header = if t.first_row_is_table_header {
            rows.next()
        } else {
            None
        };

        let body: Vec<Vec<TableCell>> = rows
            .map(|row| {
                row.into_iter()
                    .enumerate()
                    .map(|(col, text)| TableCell {
                        text,
                        is_header: t.first_col_is_header && col == 0,
                    })
                    .collect()
            })
            .collect();

        self.draw("table", &serde_json::json!({ "header": header, "rows": body }))
    }

    fn code(&self, value: &Json) -> Result<String, RenderError> {
        let c = CodeValue::deserialize(value)?;
        self.draw("code", &c)
    }

    fn cta(&self, value: &Json) -> Result<String, RenderError> {
        let c = CtaValue::deserialize(value)?;
        if !is_safe_href(&c.url) {
            return Err(RenderError::InvalidPayload(format!(
                "cta url not allowed: {}",
                c.url
            )));
        }
        self.draw("cta", &c)
    }

    fn banner(&self, value: &Json) -> Result<String, RenderError> {
        let b = BannerValue::deserialize(value)?;
        let html = match b.html_code {
            Json::String(s) => s,
            Json::Null => String::new(),
            other => other.to_string(),
        };
        self.draw("banner", &serde_json::json!({ "html": html }))
    }

    fn table_of_contents(&self, value: &Json, headings: &[TocItem]) -> Result<String, RenderError> {
        let t = TocValue::deserialize(value)?;
        let items: Vec<&TocItem> = headings
            .iter()
            .filter(|h| (h.level == 2 && t.show_h2) || (h.level == 3 && t.show_h3))
            .filter(|h| !h.text.trim().is_empty())
            .collect();
        if items.is_empty() {
            return Ok(String::new());
        }
        self.draw(
            "table_of_contents",
            &serde_json::json!({ "title": t.title, "items": items }),
        )
    }

    fn spacer(&self, value: &Json) -> Result<String, RenderError> {
        // Wagtail sends `{}` for an untouched spacer; null gets the same default.
        let s = if value.is_null() {
            SpacerValue {
                size: SpacerSize::default(),
            }
        } else {
            SpacerValue::deserialize(value)?
        };
        self.draw("spacer", &s)
    }

    fn alert(&self, value: &Json) -> Result<String, RenderError> {
        let a = AlertValue::deserialize(value)?;
        self.draw("alert", &a)
    }

    fn accordion(&self, value: &Json) -> Result<String, RenderError> {
        let a = AccordionValue::deserialize(value)?;
        self.draw(
            "accordion",
            &serde_json::json!({
                "title": a.title,
                "content": a.content,
                "open": a.is_open_by_default,
            }),
        )
    }

    fn image(&self, value: &Json) -> Result<String, RenderError> {
        let id = match value {
            Json::Number(n) => n.to_string(),
            Json::String(s) if !s.is_empty() => s.clone(),
            Json::Object(map) => match map.get("id") {
                Some(Json::Number(n)) => n.to_string(),
                Some(Json::String(s)) if !s.is_empty() => s.clone(),
                _ => return Err(RenderError::InvalidPayload("image without id".into())),
            },
            _ => return Err(RenderError::InvalidPayload("image without id".into())),
        };
        self.draw("image", &serde_json::json!({ "id": id }))
    }

    fn embed(&self, value: &Json) -> Result<String, RenderError> {
        let url = match value {
            Json::String(s) => s.clone(),
            Json::Object(map) => match map.get("url") {
                Some(Json::String(s)) => s.clone(),
                _ => return Err(RenderError::InvalidPayload("embed without url".into())),
            },
            _ => return Err(RenderError::InvalidPayload("embed without url".into())),
        };
        if !is_safe_href(&url) {
            return Err(RenderError::InvalidPayload(format!(
                "embed url not allowed: {url}"
            )));
        }
        self.draw("embed", &serde_json::json!({ "url": url }))
    }

    fn related_tools(&self, value: &Json) -> Result<String, RenderError> {
        let r = RelatedToolsValue::deserialize(value)?;
        self.draw("related_tools", &r)
    }
}

/// Only http(s), site-relative and fragment links go into `href`.
fn is_safe_href(url: &str) -> bool {
    let u = url.trim();
    let lower = u.to_ascii_lowercase();
    lower.starts_with("https://")
        || lower.starts_with("http://")
        || (u.starts_with('/') && !u.starts_with("//"))
        || u.starts_with('#')
}

impl FragmentViews for HbsViews {
    fn render_block(
        &self,
        kind: BlockKind,
        value: &Json,
        headings: &[TocItem],
    ) -> Result<String, RenderError> {
        match kind {
            BlockKind::Paragraph => self.paragraph(value),
            BlockKind::Heading => self.heading(value, headings.first()),
            BlockKind::Text => self.text(value),
            BlockKind::Table => self.table(value),
            BlockKind::Code => self.code(value),
            BlockKind::Cta => self.cta(value),
            BlockKind::Banner => self.banner(value),
            BlockKind::TableOfContents => self.table_of_contents(value, headings),
            BlockKind::Spacer => self.spacer(value),
            BlockKind::Alert => self.alert(value),
            BlockKind::Accordion => self.accordion(value),
            BlockKind::Image => self.image(value),
            BlockKind::Embed => self.embed(value),
            BlockKind::RelatedTools => self.related_tools(value),
            BlockKind::Unknown => Err(RenderError::InvalidPayload(
                "no view for unknown block".into(),
            )),
        }
    }

    fn render_ad(&self, slot: &str, placement: AdPlacement) -> Result<String, RenderError> {
        self.draw(
            "ad",
            &serde_json::json!({ "slot": slot, "placement": placement.tag() }),
        )
    }
}
