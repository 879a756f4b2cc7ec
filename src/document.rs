//! Document composition: header → options → rendered body.
//!
//! The header parser keeps every scalar a string. This module is where the
//! few keys the renderer cares about get interpreted:
//!
//! | Header key | Field | Fallback |
//! |------------|-------|----------|
//! | `title` | [`DocumentOptions::title`] | caller-supplied (usually the slug) |
//! | `toc` | [`DocumentOptions::toc`] | `false` |
//! | `toc-title` | [`DocumentOptions::toc_title`] | `[toc] title` |
//! | `toc-location` | [`DocumentOptions::toc_location`] | `[toc] location` |
//!
//! `toc` accepts `true`, `yes`, `on` and `1` in any case; anything else,
//! including `"false"`, disables the TOC.
//!
//! Listing metadata (`date`, `description`, `image`, `categories`) and profile
//! links (`about.links` or `links`) are read here as well so the page
//! assembler gets typed values instead of raw header trees.

use crate::config::{RenderConfig, TocConfig};
use crate::header::{self, HeaderValue, Mapping, ParsedDocument};
use crate::render;
use crate::toc;
use crate::types::RenderedDocument;
use serde::Serialize;

/// Per-document rendering options drawn from the header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentOptions {
    pub title: String,
    pub toc: bool,
    pub toc_title: String,
    pub toc_location: String,
}

impl DocumentOptions {
    pub fn from_header(header: &Mapping, fallback_title: &str, toc_config: &TocConfig) -> Self {
        let title = non_empty(header, "title").unwrap_or(fallback_title);
        Self {
            title: title.to_string(),
            toc: header.get_str("toc").is_some_and(parse_flag),
            toc_title: non_empty(header, "toc-title")
                .unwrap_or(&toc_config.title)
                .to_string(),
            toc_location: non_empty(header, "toc-location")
                .unwrap_or(&toc_config.location)
                .to_string(),
        }
    }
}

/// Listing metadata read from the header.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

impl DocumentMeta {
    pub fn from_header(header: &Mapping) -> Self {
        let categories = match header.get("categories") {
            Some(HeaderValue::Sequence(items)) => items
                .iter()
                .filter_map(HeaderValue::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Some(HeaderValue::Scalar(single)) if !single.is_empty() => vec![single.clone()],
            _ => Vec::new(),
        };
        Self {
            date: non_empty(header, "date").map(str::to_string),
            description: non_empty(header, "description").map(str::to_string),
            image: non_empty(header, "image").map(str::to_string),
            categories,
        }
    }
}

/// A profile link (`icon`/`text`/`href` item).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub href: String,
}

/// Profile links from `about.links`, falling back to top-level `links`.
///
/// Items that are not mappings are skipped; a missing `href` becomes `#`.
pub fn links(header: &Mapping) -> Vec<Link> {
    let Some(items) = header
        .lookup("about.links")
        .or_else(|| header.get("links"))
        .and_then(HeaderValue::as_sequence)
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(HeaderValue::as_mapping)
        .map(|item| Link {
            icon: item.get_str("icon").map(str::to_string),
            text: item.get_str("text").map(str::to_string),
            href: item.get_str("href").unwrap_or("#").to_string(),
        })
        .collect()
}

/// Render a body and, when the TOC is on, anchor and collect its headings.
///
/// With the TOC off the html comes back exactly as rendered: no `id`
/// attributes and no headings.
pub fn render_document(
    body: &str,
    options: &DocumentOptions,
    config: &RenderConfig,
) -> RenderedDocument {
    let html = render::render_with(body, config);
    if !options.toc {
        return RenderedDocument {
            html,
            headings: Vec::new(),
        };
    }
    let (html, headings) = toc::index_with(&html, &options.title, config.toc.max_level);
    RenderedDocument { html, headings }
}

/// Everything the page assembler needs for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    #[serde(flatten)]
    pub parsed: ParsedDocument,
    pub options: DocumentOptions,
    pub meta: DocumentMeta,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    pub rendered: RenderedDocument,
    /// Ready-made TOC block; `None` when the TOC is off or nothing qualified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toc: Option<String>,
}

/// Parse, interpret, and render one raw document.
pub fn build(raw: &str, fallback_title: &str, config: &RenderConfig) -> Document {
    let parsed = header::parse(raw);
    let options = DocumentOptions::from_header(&parsed.header, fallback_title, &config.toc);
    let meta = DocumentMeta::from_header(&parsed.header);
    let links = links(&parsed.header);
    let rendered = render_document(&parsed.body, &options, config);
    let toc = toc::render_toc(
        &rendered.headings,
        &options.toc_title,
        &options.toc_location,
        config.toc.indent_step,
    )
    .map(|markup| markup.into_string());

    tracing::debug!(
        title = %options.title,
        toc = options.toc,
        headings = rendered.headings.len(),
        "Rendered document"
    );

    Document {
        parsed,
        options,
        meta,
        links,
        rendered,
        toc,
    }
}

fn non_empty<'a>(header: &'a Mapping, key: &str) -> Option<&'a str> {
    header.get_str(key).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "on" | "1"
    )
}
