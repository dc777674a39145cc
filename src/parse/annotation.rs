//! Tag and mention recognition in free-form task text.
//!
//! A tag is `#` followed by one or more word characters, anywhere in the text.
//! A mention is `@` followed by one or more word characters, where the `@` is
//! at the start of the text or preceded by whitespace, so `a@b.com` is not a
//! mention.

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;
use serde::Serialize;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#(\w+)").unwrap());

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:^|\s)@(\w+)").unwrap());

static HIGHLIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\w+|(?P<lead>^|\s)(?P<mention>@\w+)").unwrap());

/// Kind of a display segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Plain,
    Tag,
    Mention,
}

/// A run of text with a single display style. Tag and mention segments keep
/// their `#`/`@` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub text: String,
}

impl Segment {
    fn new(kind: SegmentKind, text: &str) -> Self {
        Segment {
            kind,
            text: text.to_string(),
        }
    }
}

/// Distinct tag bodies (without `#`) in order of first appearance.
pub fn extract_tags(text: &str) -> IndexSet<String> {
    TAG_RE
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

/// Distinct mention bodies (without `@`) in order of first appearance.
pub fn extract_mentions(text: &str) -> IndexSet<String> {
    MENTION_RE
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

/// Split text into plain, tag and mention segments for display.
///
/// Whitespace in front of a mention stays in a plain segment. Adjacent plain
/// runs are merged, and the segment texts concatenate back to `text`.
pub fn render_highlighted_text(text: &str) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut last = 0;

    for caps in HIGHLIGHT_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_plain(&mut segments, &text[last..whole.start()]);
        match caps.name("mention") {
            Some(mention) => {
                if let Some(lead) = caps.name("lead") {
                    push_plain(&mut segments, lead.as_str());
                }
                segments.push(Segment::new(SegmentKind::Mention, mention.as_str()));
            }
            None => segments.push(Segment::new(SegmentKind::Tag, whole.as_str())),
        }
        last = whole.end();
    }
    push_plain(&mut segments, &text[last..]);

    segments
}

fn push_plain(segments: &mut Vec<Segment>, s: &str) {
    if s.is_empty() {
        return;
    }
    if let Some(prev) = segments.last_mut()
        && prev.kind == SegmentKind::Plain
    {
        prev.text.push_str(s);
        return;
    }
    segments.push(Segment::new(SegmentKind::Plain, s));
}
