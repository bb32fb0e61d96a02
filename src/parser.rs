use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One `"<number>. <title>"` line, split apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HymnEntry {
    pub number: String,
    pub title: String,
}

/// Hymn number → title, in the order hymns were first seen on the site.
/// Serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HymnMapping(IndexMap<String, String>);

impl HymnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last insert for a number wins; the number keeps its first position.
    pub fn insert(&mut self, entry: HymnEntry) {
        self.0.insert(entry.number, entry.title);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>, T: Into<String>> FromIterator<(N, T)> for HymnMapping {
    fn from_iter<I: IntoIterator<Item = (N, T)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(n, t)| (n.into(), t.into())).collect())
    }
}

/// Split `"302. I Know My Father Lives (Hymn)"` into number and title.
///
/// The number is whatever precedes the first `". "`, kept as text. The title
/// stops at the first `(`, so trailing annotations are dropped.
pub fn parse_line(line: &str) -> Option<HymnEntry> {
    let (number, rest) = line.split_once(". ")?;
    let title = rest.split_once('(').map_or(rest, |(head, _)| head).trim();

    Some(HymnEntry {
        number: number.to_string(),
        title: title.to_string(),
    })
}

pub fn build_mapping(lines: &[String]) -> HymnMapping {
    info!("Converting {} hymn lines to a mapping...", lines.len());
    let mut mapping = HymnMapping::new();

    for line in lines {
        match parse_line(line) {
            Some(entry) => mapping.insert(entry),
            None => warn!("Unexpected hymn format: {}", line),
        }
    }

    info!("Conversion complete. Total hymns: {}", mapping.len());
    mapping
}

// ── Tests ──
