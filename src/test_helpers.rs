//! Shared test utilities for the simple-press test suite.
//!
//! Loads documents from `fixtures/documents/` and provides lookup and
//! assertion helpers over parsed headers and rendered headings.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let parsed = header::parse(&fixture("about.qmd"));
//! assert_eq!(scalar(&parsed.header, "about.template"), "jolla");
//!
//! let doc = document::build(&fixture("toc-post.qmd"), "toc-post", &RenderConfig::default());
//! assert_anchored(&doc.rendered.html, 2, "setup");
//! ```

use std::path::Path;

use crate::header::{HeaderValue, Mapping};
use crate::types::Heading;

// =========================================================================
// Fixtures
// =========================================================================

/// Read `fixtures/documents/<name>`. Panics if missing.
pub fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures/documents")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("fixture '{}' unreadable: {e}", path.display()))
}

// =========================================================================
// Header lookups — panics with a clear message on miss
// =========================================================================

/// Scalar at a dotted path. Panics if absent or not a scalar.
pub fn scalar<'a>(header: &'a Mapping, path: &str) -> &'a str {
    header
        .lookup(path)
        .and_then(HeaderValue::as_str)
        .unwrap_or_else(|| {
            let keys: Vec<&str> = header.keys().collect();
            panic!("no scalar at '{path}'. Top-level keys: {keys:?}")
        })
}

/// Sequence at a dotted path. Panics if absent or not a sequence.
pub fn sequence<'a>(header: &'a Mapping, path: &str) -> &'a [HeaderValue] {
    header
        .lookup(path)
        .and_then(HeaderValue::as_sequence)
        .unwrap_or_else(|| panic!("no sequence at '{path}'"))
}

// =========================================================================
// Heading helpers
// =========================================================================

/// Anchors in document order.
pub fn anchors(headings: &[Heading]) -> Vec<&str> {
    headings.iter().map(|h| h.anchor.as_str()).collect()
}

/// Assert `html` carries exactly one `<hN id="anchor">`.
pub fn assert_anchored(html: &str, level: u8, anchor: &str) {
    let tag = format!("<h{level} id=\"{anchor}\">");
    let count = html.matches(&tag).count();
    assert_eq!(count, 1, "expected one {tag} in:\n{html}");
}
