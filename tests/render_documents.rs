//! End-to-end rendering of the documents under `fixtures/documents/`.
//!
//! Run with: cargo test --test render_documents

use pretty_assertions::assert_eq;
use simple_press::batch::{SourceDocument, manifest_json, render_all};
use simple_press::config::{RenderConfig, load_config};
use simple_press::document::{self, Link};
use simple_press::header::{self, HeaderValue};
use simple_press::types::Heading;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures/documents")
        .join(name);
    fs::read_to_string(&path).unwrap()
}

fn heading(level: u8, text: &str, anchor: &str) -> Heading {
    Heading {
        level,
        text: text.to_string(),
        anchor: anchor.to_string(),
    }
}

#[test]
fn toc_post_end_to_end() {
    let doc = document::build(&fixture("toc-post.qmd"), "toc-post", &RenderConfig::default());
    let html = &doc.rendered.html;

    assert_eq!(
        doc.rendered.headings,
        vec![
            heading(2, "Setup", "setup"),
            heading(3, "Reading Input", "reading-input"),
            heading(2, "Images", "images"),
        ]
    );

    // Title heading and the repeated Setup stay untagged.
    assert!(html.starts_with("<h1>Building a Parser</h1>\n"));
    assert!(html.contains("<h2 id=\"setup\">Setup</h2>\n<p>Install the toolchain.</p>\n<h2>Setup</h2>"));
    assert!(html.contains("<p>Call <code>read_to_string</code> and keep the result.</p>"));
    assert!(html.contains(
        "<pre><code class=\"language-rust\">fn main() {\n    println!(&quot;**not bold**&quot;);\n}\n</code></pre>"
    ));
    assert!(!html.contains("<strong>not bold</strong>"));
    assert!(html.contains(
        "<p><img src=\"images/chart.png\" alt=\"Chart\" class=\"img-fluid\" style=\"width: 50%;\" loading=\"lazy\"></p>"
    ));
    assert!(html.ends_with(
        "<p><img src=\"images/diagram.png\" alt=\"Diagram\" class=\"img-fluid\" loading=\"lazy\"></p>"
    ));

    assert_eq!(doc.meta.date.as_deref(), Some("2024-05-12"));
    assert_eq!(doc.meta.categories, vec!["rust", "parsing"]);

    let toc = doc.toc.unwrap();
    assert!(toc.contains("<h2 class=\"toc-title\">Table of Contents</h2>"));
    assert!(toc.contains("data-location=\"left\""));
    assert_eq!(toc.matches("<li ").count(), 3);
    assert!(toc.contains("style=\"margin-left: 1.25rem\"><a href=\"#reading-input\">Reading Input</a>"));
}

#[test]
fn about_page_links() {
    let doc = document::build(&fixture("about.qmd"), "about", &RenderConfig::default());
    assert_eq!(doc.options.title, "About Me");
    assert_eq!(
        doc.links,
        vec![
            Link {
                icon: Some("github".to_string()),
                text: Some("Github".to_string()),
                href: "https://github.com/example".to_string(),
            },
            Link {
                icon: Some("envelope".to_string()),
                text: Some("Email".to_string()),
                href: "mailto:me@example.com".to_string(),
            },
        ]
    );
    assert_eq!(
        doc.rendered.html,
        "<p>I study how brains learn. Previously at the <strong>Institute</strong> of <em>Things</em>.</p>\n\
         <p>See <a href=\"cv.pdf\">my CV</a> for details.</p>"
    );
    assert!(doc.toc.is_none());
}

#[test]
fn header_tree_shape() {
    let parsed = header::parse(&fixture("about.qmd"));
    let keys: Vec<&str> = parsed.header.keys().collect();
    assert_eq!(keys, vec!["title", "image", "about"]);

    let links = parsed
        .header
        .lookup("about.links")
        .and_then(HeaderValue::as_sequence)
        .unwrap();
    for link in links {
        let keys: Vec<&str> = link.as_mapping().unwrap().keys().collect();
        assert_eq!(keys, vec!["icon", "text", "href"]);
    }
}

#[test]
fn document_without_header() {
    let raw = fixture("plain.md");
    let doc = document::build(&raw, "plain", &RenderConfig::default());
    assert!(doc.parsed.header.is_empty());
    assert_eq!(doc.parsed.body, raw);
    assert_eq!(
        doc.rendered.html,
        "<p>Just a note without a header.</p>\n<p>It has <em>two</em> paragraphs.</p>"
    );
}

#[test]
fn unclosed_header_is_body_text() {
    let raw = fixture("unclosed.qmd");
    let doc = document::build(&raw, "unclosed", &RenderConfig::default());
    assert!(doc.parsed.header.is_empty());
    assert_eq!(doc.parsed.body, raw);
    assert!(!doc.options.toc);
    assert!(doc.rendered.html.contains("<h2>Body heading</h2>"));
}

#[test]
fn container_fences_disappear() {
    let doc = document::build(&fixture("columns.qmd"), "columns", &RenderConfig::default());
    assert_eq!(
        doc.rendered.html,
        "<p>Left column text.<br>Right column text.</p>\n\
         <p>A note with a <a href=\"https://example.com\">link</a>.</p>"
    );
}

#[test]
fn site_config_changes_output() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[toc]\nmax_level = 2\ntitle = \"Contents\"\n\n[images]\nlazy = false\n",
    )
    .unwrap();
    let config = load_config(tmp.path()).unwrap();

    let doc = document::build(&fixture("toc-post.qmd"), "toc-post", &config);
    let anchors: Vec<&str> = doc
        .rendered
        .headings
        .iter()
        .map(|h| h.anchor.as_str())
        .collect();
    assert_eq!(anchors, vec!["setup", "images"]);
    assert!(doc.rendered.html.contains("<h3>Reading Input</h3>"));
    assert!(!doc.rendered.html.contains("loading="));
    assert!(doc.toc.unwrap().contains(">Contents</h2>"));
}

#[test]
fn batch_manifest() {
    let sources: Vec<SourceDocument> = ["about.qmd", "toc-post.qmd", "plain.md"]
        .iter()
        .map(|name| SourceDocument {
            section: "pages".to_string(),
            slug: name.split('.').next().unwrap().to_string(),
            raw: fixture(name),
        })
        .collect();

    let pages = render_all(&sources, &RenderConfig::default());
    let slugs: Vec<&str> = pages.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, vec!["about", "toc-post", "plain"]);

    let json: serde_json::Value = serde_json::from_str(&manifest_json(&pages).unwrap()).unwrap();
    assert_eq!(json[0]["document"]["header"]["about"]["template"], "jolla");
    assert_eq!(json[1]["document"]["meta"]["categories"][1], "parsing");
    assert_eq!(json[2]["document"]["options"]["title"], "plain");
    assert!(json[2]["document"]["header"].as_object().unwrap().is_empty());
}
