//! Splicing generated levels into a decoded save document.
//!
//! The local levels document holds the level list as a dictionary whose keys
//! are `k_0`, `k_1`, ... in display order. A new level is inserted at the top
//! of the list, so every existing level key is shifted up by one first.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

use super::fragments::Fragments;

/// Marker that opens the level list.
pub const ANCHOR_MARKER: &str = "<k>_isArr</k><t />";

/// Marker that follows a level key and identifies the entry as a level.
pub const LEVEL_MARKER: &str = "<d><k>kCEK</k>";

/// Placeholder for the level name in the fragments.
pub const NAME_PLACEHOLDER: &str = "[[NAME]]";

/// Placeholder for the level description in the fragments.
pub const DESC_PLACEHOLDER: &str = "[[DESC]]";

/// Longest level name the editor accepts.
pub const MAX_NAME_LEN: usize = 30;

/// Error type for splicing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpliceError {
    /// The document has no level list to insert into
    #[error("save file has no level list (missing '<k>_isArr</k><t />')")]
    AnchorNotFound,
}

fn level_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<k>k_(\d+)</k><d><k>kCEK</k>").expect("level key pattern is valid")
    })
}

/// One level key and everything up to the next level key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedEntry {
    pub index: u64,
    /// Text after the key token, starting with [`LEVEL_MARKER`]
    pub payload: String,
}

/// The text after the anchor, split at every level key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexedRegion {
    /// Text before the first level key
    pub head: String,
    pub entries: Vec<IndexedEntry>,
}

impl IndexedRegion {
    pub fn parse(text: &str) -> Self {
        let re = level_key_regex();
        let mut head = String::new();
        let mut entries: Vec<IndexedEntry> = Vec::new();
        let mut last_end = 0;

        for caps in re.captures_iter(text) {
            let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            // Indices too large for u64 are left as plain text
            let Ok(index) = digits.as_str().parse::<u64>() else {
                continue;
            };

            let between = &text[last_end..whole.start()];
            match entries.last_mut() {
                Some(prev) => prev.payload.push_str(between),
                None => head.push_str(between),
            }

            // The payload keeps the level marker, the key token is rebuilt on render
            let key_end = digits.end() + "</k>".len();
            entries.push(IndexedEntry { index, payload: text[key_end..whole.end()].to_string() });
            last_end = whole.end();
        }

        let tail = &text[last_end..];
        match entries.last_mut() {
            Some(prev) => prev.payload.push_str(tail),
            None => head.push_str(tail),
        }

        Self { head, entries }
    }

    /// Add `by` to every index.
    pub fn shift(&mut self, by: u64) {
        for entry in &mut self.entries {
            entry.index += by;
        }
    }

    pub fn indices(&self) -> Vec<u64> {
        self.entries.iter().map(|e| e.index).collect()
    }
}

impl fmt::Display for IndexedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.head)?;
        for entry in &self.entries {
            write!(f, "<k>k_{}</k>{}", entry.index, entry.payload)?;
        }
        Ok(())
    }
}

/// Level name from the image file stem: ASCII alphanumerics, at most 30 chars.
pub fn sanitize_level_name(stem: &str) -> String {
    stem.chars().filter(char::is_ascii_alphanumeric).take(MAX_NAME_LEN).collect()
}

/// Metadata substituted into the fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelMeta {
    pub name: String,
    pub description: String,
}

impl LevelMeta {
    /// Name and description for an image file and its object count.
    pub fn for_image(file_name: &str, object_count: usize) -> Self {
        let stem = file_name.split('.').next().unwrap_or_default();
        Self {
            name: sanitize_level_name(stem),
            description: format!("{} | {} objects", file_name, object_count),
        }
    }
}

/// Escape text for use inside an element of the save document.
pub fn escape_xml_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Insert a new level holding `objects` at the top of the level list.
///
/// Name and description are escaped on substitution.
pub fn splice_level(
    document: &str,
    fragments: &Fragments,
    objects: &str,
    meta: &LevelMeta,
) -> Result<String, SpliceError> {
    let (prefix, suffix) = document.split_once(ANCHOR_MARKER).ok_or(SpliceError::AnchorNotFound)?;

    let mut region = IndexedRegion::parse(suffix);
    region.shift(1);
    tracing::debug!(levels = region.entries.len(), "shifted existing level keys");

    let mut out = String::with_capacity(
        document.len()
            + fragments.ham.len()
            + fragments.bur.len()
            + fragments.ger.len()
            + objects.len(),
    );
    out.push_str(prefix);
    out.push_str(ANCHOR_MARKER);
    out.push_str(&fragments.ham);
    out.push_str(&fragments.bur);
    out.push_str(objects);
    out.push_str(&fragments.ger);
    out.push_str(&region.to_string());

    Ok(out
        .replace(NAME_PLACEHOLDER, &escape_xml_text(&meta.name))
        .replace(DESC_PLACEHOLDER, &escape_xml_text(&meta.description)))
}
