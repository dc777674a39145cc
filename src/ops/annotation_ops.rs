use indexmap::IndexSet;

/// Which kind of annotation an edit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Tag,
    Mention,
}

impl Marker {
    pub fn prefix(self) -> char {
        match self {
            Marker::Tag => '#',
            Marker::Mention => '@',
        }
    }
}

/// Add a tag typed by the user. Leading `#`s and surrounding whitespace are
/// dropped; empty or already-present values leave the set unchanged.
/// The task text is not touched.
pub fn add_tag(tags: &IndexSet<String>, raw: &str) -> IndexSet<String> {
    add_annotation(tags, raw, Marker::Tag)
}

/// Remove a tag and de-prefix every `#tag` occurrence in the text.
pub fn remove_tag(tags: &IndexSet<String>, tag: &str, text: &str) -> (IndexSet<String>, String) {
    remove_annotation(tags, tag, text, Marker::Tag)
}

/// Add a mention typed by the user. Leading `@`s are dropped.
pub fn add_mention(mentions: &IndexSet<String>, raw: &str) -> IndexSet<String> {
    add_annotation(mentions, raw, Marker::Mention)
}

/// Remove a mention and de-prefix every `@mention` occurrence in the text.
pub fn remove_mention(
    mentions: &IndexSet<String>,
    mention: &str,
    text: &str,
) -> (IndexSet<String>, String) {
    remove_annotation(mentions, mention, text, Marker::Mention)
}

pub fn add_annotation(set: &IndexSet<String>, raw: &str, marker: Marker) -> IndexSet<String> {
    let mut updated = set.clone();
    let cleaned = clean_input(raw, marker);
    if !cleaned.is_empty() {
        updated.insert(cleaned);
    }
    updated
}

pub fn remove_annotation(
    set: &IndexSet<String>,
    value: &str,
    text: &str,
    marker: Marker,
) -> (IndexSet<String>, String) {
    let mut updated = set.clone();
    updated.shift_remove(value);
    (updated, strip_marker(text, marker, value))
}

/// Normalize user input for a tag or mention: trim, then drop leading markers.
pub fn clean_input(raw: &str, marker: Marker) -> String {
    raw.trim()
        .trim_start_matches(marker.prefix())
        .trim()
        .to_string()
}

/// Replace every `<prefix><word>` in `text` with the bare `<word>`.
///
/// An occurrence followed directly by another word character belongs to a
/// longer token and is left alone. A mention also has to start the text or
/// follow whitespace, so the `@` inside an email address is never touched.
fn strip_marker(text: &str, marker: Marker, word: &str) -> String {
    if word.is_empty() {
        return text.to_string();
    }
    let needle = format!("{}{}", marker.prefix(), word);
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(&needle) {
        let after = &rest[pos + needle.len()..];
        out.push_str(&rest[..pos]);
        let extends_token = after.chars().next().is_some_and(is_word_char);
        let embedded = marker == Marker::Mention
            && out.chars().next_back().is_some_and(|c| !c.is_whitespace());
        if extends_token || embedded {
            out.push_str(&needle);
        } else {
            out.push_str(word);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
