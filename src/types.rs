//! Shared types produced by the render stages.
//!
//! These types are serialized into the JSON manifest handed to the page
//! assembler (see [`crate::batch::manifest_json`]).

use serde::{Deserialize, Serialize};

/// A heading discovered in rendered HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level, 1-6
    pub level: u8,
    /// Plain heading text as it appears between the tags
    pub text: String,
    /// `id` injected on the heading; TOC links point at `#anchor`
    pub anchor: String,
}

/// Rendered body plus the headings indexed for the TOC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub html: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headings: Vec<Heading>,
}
