//! Header block parsing.
//!
//! Documents open with a delimiter-bounded header written in a small,
//! indentation-sensitive subset of YAML:
//!
//! ```text
//! ---
//! title: "About Me"
//! categories: [neuroscience, ml]
//! toc: true
//! about:
//!   template: jolla
//!   links:
//!     - icon: github
//!       text: Github
//!       href: https://github.com/example
//! ---
//! Body text starts here.
//! ```
//!
//! ## Supported shapes
//!
//! - mapping of scalars (`key: value`)
//! - mapping of mappings (`key:` followed by deeper `sub: value` lines)
//! - mapping of sequences (`key:` followed by `- item` lines, or `key: [a, b]`)
//! - sequence of flat mappings (`- key: value` followed by property lines
//!   indented two columns past the dash)
//!
//! ## Frames
//!
//! Nesting is tracked with an explicit stack of frames, each holding the
//! indentation column of the line that opened it, the container being filled
//! and the key it belongs to in its parent. A line pops every frame whose
//! column is at or beyond its own indentation; popped containers are folded
//! back into their parent under the owning key.
//!
//! ## Failure policy
//!
//! Parsing never fails. A missing or unclosed header yields an empty mapping
//! and the whole input as body. Lines that fit no rule are dropped (and
//! reported at `debug` level) so a broken header never blocks a build.
//!
//! Scalars stay strings: `toc: true` is `Scalar("true")`. Interpreting values
//! is left to the consumer (see [`crate::document`]).

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

const DELIMITER: &str = "---";

/// A value in the header tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Scalar(String),
    Sequence(Vec<HeaderValue>),
    Mapping(Mapping),
}

impl HeaderValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        HeaderValue::Scalar(value.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::Scalar(s) => Some(s),
            HeaderValue::Sequence(_) | HeaderValue::Mapping(_) => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[HeaderValue]> {
        match self {
            HeaderValue::Sequence(items) => Some(items),
            HeaderValue::Scalar(_) | HeaderValue::Mapping(_) => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            HeaderValue::Mapping(map) => Some(map),
            HeaderValue::Scalar(_) | HeaderValue::Sequence(_) => None,
        }
    }

    /// Look up `key` when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.as_mapping().and_then(|map| map.get(key))
    }
}

/// Insertion-ordered map with unique keys.
///
/// Re-assigning a key replaces its value but keeps the key's original
/// position, so the last assignment wins without reordering the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    entries: Vec<(String, HeaderValue)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` to `key`, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: HeaderValue) -> Option<HeaderValue> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// Scalar value for `key`, if present and a scalar.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(HeaderValue::as_str)
    }

    /// Follow a dotted path through nested mappings: `lookup("about.links")`.
    pub fn lookup(&self, path: &str) -> Option<&HeaderValue> {
        let mut parts = path.split('.');
        let first = self.get(parts.next()?)?;
        parts.try_fold(first, |value, key| value.get(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, HeaderValue)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (String, HeaderValue)>>(iter: I) -> Self {
        let mut map = Mapping::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A document split into its parsed header and the untouched body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedDocument {
    pub header: Mapping,
    pub body: String,
}

/// Split `raw` into header tree and body.
///
/// Without a well-formed header block the header is empty and the body is
/// `raw` unchanged.
pub fn parse(raw: &str) -> ParsedDocument {
    match split_header(raw) {
        Some((block, body)) => ParsedDocument {
            header: parse_header(block),
            body: body.to_string(),
        },
        None => ParsedDocument {
            header: Mapping::new(),
            body: raw.to_string(),
        },
    }
}

/// Locate the header block. Returns `(block, body)` slices of `raw`.
fn split_header(raw: &str) -> Option<(&str, &str)> {
    let mut lines = raw.split_inclusive('\n');
    let opening = lines.next()?;
    if !opening.ends_with('\n') || !is_delimiter(opening) {
        return None;
    }

    let block_start = opening.len();
    let mut offset = block_start;
    for line in lines {
        if is_delimiter(line) {
            return Some((&raw[block_start..offset], &raw[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

/// An open container during parsing.
#[derive(Debug)]
struct Frame {
    /// Column of the line that opened the container; `-1` for the root.
    indent: isize,
    container: HeaderValue,
    /// Key under which the container is stored in the parent frame.
    key: Option<String>,
}

/// Parse the lines between the delimiters into a mapping.
pub fn parse_header(block: &str) -> Mapping {
    let lines: Vec<&str> = block.lines().collect();
    let mut stack = vec![Frame {
        indent: -1,
        container: HeaderValue::Mapping(Mapping::new()),
        key: None,
    }];

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let line_no = i + 1;
        i += 1;

        if !is_significant(line) {
            continue;
        }
        let indent = indentation(line);
        let trimmed = line.trim();
        close_frames(&mut stack, indent);

        if let Some(content) = trimmed.strip_prefix("- ") {
            let (item, consumed) = parse_item(content.trim(), indent, &lines[i..]);
            i += consumed;
            match stack.last_mut().map(|frame| &mut frame.container) {
                Some(HeaderValue::Sequence(items)) => items.push(item),
                _ => tracing::debug!(line = line_no, "dropping sequence item outside a sequence"),
            }
            continue;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            tracing::debug!(line = line_no, "dropping header line without a key");
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() {
            tracing::debug!(line = line_no, "dropping header line with an empty key");
            continue;
        }

        let Some(Frame {
            container: HeaderValue::Mapping(map),
            ..
        }) = stack.last_mut()
        else {
            tracing::debug!(line = line_no, key, "dropping key inside a sequence");
            continue;
        };

        if !value.is_empty() {
            map.insert(key, inline_value(value));
            continue;
        }

        let opened = match lines[i..].iter().copied().find(|l| is_significant(l)) {
            Some(next) if next.trim().starts_with("- ") => {
                Some(HeaderValue::Sequence(Vec::new()))
            }
            Some(next) if indentation(next) > indent => Some(HeaderValue::Mapping(Mapping::new())),
            _ => None,
        };
        match opened {
            Some(container) => {
                // Reserve the key's position now; the filled container replaces it on close.
                map.insert(key, container.clone());
                stack.push(Frame {
                    indent,
                    container,
                    key: Some(key.to_string()),
                });
            }
            None => {
                map.insert(key, HeaderValue::scalar(""));
            }
        }
    }

    close_frames(&mut stack, -1);
    match stack.pop().map(|frame| frame.container) {
        Some(HeaderValue::Mapping(root)) => root,
        _ => Mapping::new(),
    }
}

/// Pop frames opened at or beyond `indent`, folding each into its parent.
/// The root frame is never popped.
fn close_frames(stack: &mut Vec<Frame>, indent: isize) {
    while stack.len() > 1 && stack.last().is_some_and(|frame| frame.indent >= indent) {
        let Some(frame) = stack.pop() else { break };
        if let (Some(parent), Some(key)) = (stack.last_mut(), frame.key)
            && let HeaderValue::Mapping(map) = &mut parent.container
        {
            map.insert(key, frame.container);
        }
    }
}

/// Parse a sequence item. `rest` holds the lines after the item line; the
/// returned count says how many of them were absorbed as object properties.
fn parse_item(content: &str, item_indent: isize, rest: &[&str]) -> (HeaderValue, usize) {
    let Some((key, value)) = item_pair(content) else {
        return (HeaderValue::scalar(strip_quotes(content)), 0);
    };

    let mut object = Mapping::new();
    object.insert(key, inline_value(value));

    let property_indent = item_indent + 2;
    let mut consumed = 0;
    for line in rest {
        if !is_significant(line) || indentation(line) != property_indent {
            break;
        }
        let Some((k, v)) = line.trim().split_once(':') else {
            break;
        };
        object.insert(k.trim(), inline_value(v.trim()));
        consumed += 1;
    }

    (HeaderValue::Mapping(object), consumed)
}

/// Split `key: value` item content. The colon must end the content or be
/// followed by whitespace, and the key must not be quoted, so URLs and quoted
/// strings stay scalars.
fn item_pair(content: &str) -> Option<(&str, &str)> {
    let (key, value) = content.split_once(':')?;
    let key = key.trim();
    let separated = value.is_empty() || value.starts_with([' ', '\t']);
    (separated && !key.is_empty() && !key.starts_with(['"', '\'']))
        .then(|| (key, value.trim()))
}

/// Interpret a value written on the same line as its key.
fn inline_value(value: &str) -> HeaderValue {
    match value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        Some(inner) => HeaderValue::Sequence(
            inner
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| HeaderValue::scalar(strip_quotes(item)))
                .collect(),
        ),
        None => HeaderValue::scalar(strip_quotes(value)),
    }
}

/// Remove one matching pair of surrounding single or double quotes.
///
/// Interior characters are never unescaped: `"a \"b\""` becomes `a \"b\"`.
pub fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2
            && let Some(inner) = value.strip_prefix(quote).and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Leading whitespace width. Tabs count as one column.
fn indentation(line: &str) -> isize {
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    width as isize
}

/// Non-blank, non-comment line.
fn is_significant(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}
