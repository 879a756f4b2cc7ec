//! Body rendering: markdown subset → HTML.
//!
//! The body is rendered by a fixed sequence of text transforms. Order matters:
//! each stage assumes the earlier ones have already removed ambiguity.
//!
//! ```text
//! 1. strip block fences     ::: {.column}  /  :::        (dropped lines)
//! 2. protect fenced code    ```lang ... ```              → placeholder
//! 3. protect inline code    `code`                       → placeholder
//! 4. headings               ## Text {#custom-id}         → <h2>Text</h2>
//! 5. inline code markup     <code>code</code>            (unescaped)
//! 6. fenced code markup     <pre><code class="language-lang">  (escaped)
//! 7. emphasis               **bold** then *italic*
//! 8. images, then links     ![alt](src){width=50%}  /  [text](href)
//! 9. paragraphs             blank-line separated blocks → <p>, \n → <br>
//! ```
//!
//! ## Code protection
//!
//! Code is swapped out for placeholder tokens before any markup transform
//! runs, so `#`, `*` and brackets inside code are never interpreted. The
//! original spans live in side-tables indexed by occurrence; tokens carry the
//! index, so restoration never searches by content and repeated identical
//! snippets cannot be confused.
//!
//! Stages 5 and 6 build the final code markup from the side-tables. The
//! markup is spliced back only after paragraph segmentation, so the emphasis
//! and link stages never see code content: a fenced `**not bold**` stays
//! literal.
//!
//! ## Failure semantics
//!
//! Nothing here can fail. An unterminated fence or an unmatched bracket simply
//! does not match and is emitted as literal text.

use crate::config::{ImagesConfig, RenderConfig};
use maud::{PreEscaped, html};
use regex::{Captures, Regex};
use std::sync::LazyLock;

const TOKEN_OPEN: char = '\u{E000}';
const TOKEN_CLOSE: char = '\u{E001}';
const FENCE: &str = "fence";
const SPAN: &str = "code";

static FENCE_OPEN_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^::+\+?[ \t]*\{[^}]*\}\s*$").expect("fence open pattern"));
static FENCE_CLOSE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:+\s*$").expect("fence close pattern"));
static FENCED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(\w*)(.*?)```").expect("fenced code pattern"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("inline code pattern"));
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x{E000}(fence|code)(\d+)\x{E001}").expect("token pattern"));

/// Heading patterns, longest marker first.
static HEADINGS: LazyLock<Vec<(usize, Regex)>> = LazyLock::new(|| {
    (1..=6)
        .rev()
        .map(|level| {
            let pattern = format!(r"(?m)^#{{{level}}}[ \t]+(.+)$");
            (level, Regex::new(&pattern).expect("heading pattern"))
        })
        .collect()
});
static HEADING_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\{#[^}]+\}\s*$").expect("heading anchor pattern"));

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern"));
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("italic pattern"));

static IMAGE_WIDTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[([^\]]*)\]\(([^)\s]+)\)\{[^}]*width=(\d+)%[^}]*\}").expect("image width pattern")
});
static IMAGE_ATTRS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[([^\]]*)\]\(([^)\s]+)\)\{[^}]*\}").expect("image attrs pattern")
});
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)\s]+)\)").expect("image pattern"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").expect("link pattern"));

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph break pattern"));

/// Render a document body with the default configuration.
pub fn render(body: &str) -> String {
    render_with(body, &RenderConfig::default())
}

/// Render a document body to HTML.
pub fn render_with(body: &str, config: &RenderConfig) -> String {
    let text = body.replace("\r\n", "\n");
    let text = strip_block_fences(&text);

    let mut code = CodeTable::default();
    let text = code.protect_fences(&text);
    if text.contains("```") {
        tracing::debug!("unterminated code fence left as literal text");
    }
    let text = code.protect_spans(&text);

    let text = convert_headings(&text);

    let spans = code.render_spans();
    let fences = code.render_fences();

    let text = convert_emphasis(&text);
    let text = convert_media(&text, &config.images);
    let text = segment_paragraphs(&text);

    let text = splice(&text, SPAN, &spans);
    splice(&text, FENCE, &fences)
}

/// Drop container-fence lines (`::: {.column-margin}`, `:::`).
fn strip_block_fences(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| {
            let line = line.trim_end_matches('\n');
            !FENCE_OPEN_LINE.is_match(line) && !FENCE_CLOSE_LINE.is_match(line)
        })
        .collect()
}

fn token(kind: &str, index: usize) -> String {
    format!("{TOKEN_OPEN}{kind}{index}{TOKEN_CLOSE}")
}

#[derive(Debug)]
struct FencedBlock {
    lang: String,
    content: String,
}

/// Side-tables of protected code, indexed by occurrence.
#[derive(Debug, Default)]
struct CodeTable {
    fences: Vec<FencedBlock>,
    spans: Vec<String>,
}

impl CodeTable {
    fn protect_fences(&mut self, text: &str) -> String {
        FENCED_CODE
            .replace_all(text, |caps: &Captures| {
                let content = &caps[2];
                // The rest of the opening fence line is not content.
                let content = content.strip_prefix('\n').unwrap_or(content);
                self.fences.push(FencedBlock {
                    lang: caps[1].to_string(),
                    content: content.to_string(),
                });
                token(FENCE, self.fences.len() - 1)
            })
            .into_owned()
    }

    fn protect_spans(&mut self, text: &str) -> String {
        INLINE_CODE
            .replace_all(text, |caps: &Captures| {
                self.spans.push(caps[1].to_string());
                token(SPAN, self.spans.len() - 1)
            })
            .into_owned()
    }

    /// Inline code is emitted as written; callers pre-escape angle brackets.
    fn render_spans(&self) -> Vec<String> {
        self.spans
            .iter()
            .map(|span| html! { code { (PreEscaped(span)) } }.into_string())
            .collect()
    }

    fn render_fences(&self) -> Vec<String> {
        self.fences
            .iter()
            .map(|block| {
                let class = (!block.lang.is_empty()).then(|| format!("language-{}", block.lang));
                html! { pre { code class=[class] { (block.content) } } }.into_string()
            })
            .collect()
    }
}

/// Replace `kind` tokens with their rendered markup. Unknown indices are left
/// in place.
fn splice(text: &str, kind: &str, rendered: &[String]) -> String {
    TOKEN
        .replace_all(text, |caps: &Captures| {
            let markup = (&caps[1] == kind)
                .then(|| caps[2].parse::<usize>().ok())
                .flatten()
                .and_then(|index| rendered.get(index));
            match markup {
                Some(markup) => markup.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Convert `#`-prefixed lines to heading tags. Custom `{#id}` annotations are
/// discarded; anchors are derived from the text later.
fn convert_headings(text: &str) -> String {
    HEADINGS
        .iter()
        .fold(text.to_string(), |text, (level, pattern)| {
            pattern
                .replace_all(&text, |caps: &Captures| {
                    let heading = HEADING_ANCHOR.replace(&caps[1], "");
                    format!("<h{level}>{}</h{level}>", heading.trim())
                })
                .into_owned()
        })
}

fn convert_emphasis(text: &str) -> String {
    let text = BOLD.replace_all(text, "<strong>$1</strong>");
    ITALIC.replace_all(&text, "<em>$1</em>").into_owned()
}

/// Images in most-specific-first order, then links.
fn convert_media(text: &str, images: &ImagesConfig) -> String {
    let text = IMAGE_WIDTH.replace_all(text, |caps: &Captures| {
        image_tag(&caps[2], &caps[1], Some(&caps[3]), images)
    });
    let text = IMAGE_ATTRS.replace_all(&text, |caps: &Captures| {
        image_tag(&caps[2], &caps[1], None, images)
    });
    let text = IMAGE.replace_all(&text, |caps: &Captures| {
        image_tag(&caps[2], &caps[1], None, images)
    });
    LINK.replace_all(&text, |caps: &Captures| {
        html! { a href=(&caps[2]) { (PreEscaped(&caps[1])) } }.into_string()
    })
    .into_owned()
}

fn image_tag(src: &str, alt: &str, width_percent: Option<&str>, images: &ImagesConfig) -> String {
    let style = width_percent.map(|w| format!("width: {w}%;"));
    let loading = images.lazy.then_some("lazy");
    html! {
        img src=(src) alt=(alt) class=(images.class) style=[style] loading=[loading];
    }
    .into_string()
}

/// Wrap non-block segments in `<p>`, turning single newlines into `<br>`.
fn segment_paragraphs(text: &str) -> String {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if is_block(segment) {
                segment.to_string()
            } else {
                format!("<p>{}</p>", segment.replace('\n', "<br>"))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_block(segment: &str) -> bool {
    segment.starts_with("<h")
        || segment.starts_with("<pre")
        || segment.starts_with(&format!("{TOKEN_OPEN}{FENCE}"))
}
