//! # Simple Press
//!
//! Document rendering core for a small static publishing site. Each document
//! is a header block followed by a markdown-like body; this crate turns it
//! into a header tree, HTML, and the heading list a table of contents is
//! built from. Walking directories, copying assets, and assembling final
//! pages belong to the caller.
//!
//! # Pipeline
//!
//! ```text
//! raw text ─→ header::parse ─→ (header tree, body)
//!                                   │
//!              document::DocumentOptions (title, toc, toc-title, toc-location)
//!                                   │
//!          render::render_with(body) ─→ html ─→ toc::index ─→ (html with ids, headings)
//! ```
//!
//! Every stage is infallible. Malformed headers degrade to a partial tree and
//! unmatched markup passes through as literal text; a broken document never
//! blocks a build.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`header`] | Indentation-aware header parser producing an ordered [`header::HeaderValue`] tree |
//! | [`render`] | Body renderer: code protection, headings, emphasis, media, paragraphs |
//! | [`toc`] | Heading anchors, slugs, and TOC markup via Maud |
//! | [`document`] | Interprets header options and metadata, runs the full per-document flow |
//! | [`batch`] | Parallel rendering of many documents and the JSON manifest |
//! | [`config`] | `config.toml` loading, validation, and merging onto stock defaults |
//! | [`types`] | Shared output types (`Heading`, `RenderedDocument`) |
//!
//! # Design Decisions
//!
//! ## Strings All the Way Down
//!
//! The header parser never coerces scalars: `toc: true` is the string
//! `"true"`. Only [`document`] interprets the handful of keys rendering needs,
//! so a header value that looks like a number or date is never silently
//! reformatted.
//!
//! ## Placeholder Protection
//!
//! Code is lifted out of the body into side-tables before any markup
//! transform runs, and spliced back last. Tokens carry an occurrence index,
//! so identical snippets in one document stay distinct and code content is
//! never touched by emphasis, heading, or link rules.
//!
//! ## Maud for Markup
//!
//! Elements with attributes (`<img>`, `<a>`, `<pre><code>`, the TOC) are built
//! with [Maud](https://maud.lambda.xyz/), so attribute values and code content
//! are escaped by construction.

pub mod batch;
pub mod config;
pub mod document;
pub mod header;
pub mod render;
pub mod toc;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
