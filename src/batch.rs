//! Render many documents in parallel.
//!
//! Documents share nothing while rendering, so the batch is a plain
//! [rayon](https://docs.rs/rayon) parallel map. The pool is sized from
//! `[processing] max_processes`, capped at the core count (see
//! [`effective_threads`]). Output order matches input order regardless of
//! which worker finished first.
//!
//! The result serializes to a JSON manifest for the page assembler:
//!
//! ```text
//! [
//!   { "section": "posts", "slug": "intro", "document": { "header": ..., "rendered": ... } },
//!   ...
//! ]
//! ```

use crate::config::{RenderConfig, effective_threads};
use crate::document::{self, Document};
use rayon::prelude::*;
use serde::Serialize;

/// One raw document as enumerated by the content walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Grouping the document belongs to (`posts`, `about`, ...).
    pub section: String,
    /// URL slug; doubles as the title when the header has none.
    pub slug: String,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedPage {
    pub section: String,
    pub slug: String,
    pub document: Document,
}

/// Render every source, preserving input order.
pub fn render_all(sources: &[SourceDocument], config: &RenderConfig) -> Vec<RenderedPage> {
    let threads = effective_threads(&config.processing);
    tracing::debug!(documents = sources.len(), threads, "Rendering batch");

    let render = || {
        sources
            .par_iter()
            .map(|source| render_one(source, config))
            .collect::<Vec<_>>()
    };

    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(render),
        Err(e) => {
            tracing::warn!(error = %e, "Could not build render pool, using the global pool");
            render()
        }
    }
}

fn render_one(source: &SourceDocument, config: &RenderConfig) -> RenderedPage {
    RenderedPage {
        section: source.section.clone(),
        slug: source.slug.clone(),
        document: document::build(&source.raw, &source.slug, config),
    }
}

/// Pretty JSON manifest of rendered pages.
pub fn manifest_json(pages: &[RenderedPage]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(pages)
}
