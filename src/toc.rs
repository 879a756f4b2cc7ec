//! Heading anchors and table of contents.
//!
//! Runs on rendered HTML, not on markdown: headings are found by exact
//! `<hN>text</hN>` matching, so a heading containing nested tags (inline code,
//! emphasis) is skipped. Each distinct heading gets an `id` derived from its
//! text and an entry in the heading list the TOC is built from.
//!
//! ## Anchor policy
//!
//! - the heading repeating the document title is skipped (case-insensitive)
//! - slugs: lowercase, spaces → `-`, anything outside `[a-z0-9-]` dropped
//! - first occurrence wins: a later heading with the same level and text is
//!   neither tagged nor listed again (no `-1` suffixing)

use crate::config::TocConfig;
use crate::types::Heading;
use maud::{Markup, html};
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;

static HEADING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<h([1-6])>([^<]+)</h([1-6])>").expect("heading tag pattern"));

/// Derive an anchor slug from heading text.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

/// Tag headings (levels 1-4) with ids and list them.
pub fn index(html: &str, document_title: &str) -> (String, Vec<Heading>) {
    index_with(html, document_title, TocConfig::default().max_level)
}

/// Tag headings up to `max_level` with ids and list them in document order.
///
/// Returns the html unchanged and an empty list when no heading qualifies.
pub fn index_with(html: &str, document_title: &str, max_level: u8) -> (String, Vec<Heading>) {
    let title = document_title.trim().to_lowercase();
    let mut seen: HashSet<(u8, String)> = HashSet::new();
    let mut headings = Vec::new();

    let tagged = HEADING_TAG.replace_all(html, |caps: &Captures| {
        let whole = caps[0].to_string();
        let Ok(level) = caps[1].parse::<u8>() else {
            return whole;
        };
        if caps[1] != caps[3] || level > max_level {
            return whole;
        }

        let raw = &caps[2];
        let text = raw.trim();
        if text.to_lowercase() == title {
            return whole;
        }
        let anchor = slugify(text);
        if anchor.is_empty() || !seen.insert((level, raw.to_string())) {
            return whole;
        }

        headings.push(Heading {
            level,
            text: text.to_string(),
            anchor: anchor.clone(),
        });
        format!(r#"<h{level} id="{anchor}">{raw}</h{level}>"#)
    });

    let tagged = tagged.into_owned();
    (tagged, headings)
}

/// Indentation steps for a TOC entry: h1 and h2 sit flush, h3 one step in.
pub fn indent_steps(level: u8) -> u8 {
    level.saturating_sub(2)
}

/// The TOC entry list.
pub fn render_toc_list(headings: &[Heading], indent_step: f64) -> Markup {
    html! {
        ul {
            @for heading in headings {
                @let margin = f64::from(indent_steps(heading.level)) * indent_step;
                li class={ "toc-level-" (heading.level) } style=(format!("margin-left: {margin}rem")) {
                    a href={ "#" (heading.anchor) } { (heading.text) }
                }
            }
        }
    }
}

/// The TOC placement block, or `None` when there is nothing to list.
pub fn render_toc(
    headings: &[Heading],
    title: &str,
    location: &str,
    indent_step: f64,
) -> Option<Markup> {
    if headings.is_empty() {
        return None;
    }
    Some(html! {
        aside.toc-container data-location=(location) {
            div.toc {
                h2.toc-title { (title) }
                (render_toc_list(headings, indent_step))
            }
        }
    })
}
