//! Sync map types, anchor projection, and final assembly.
//!
//! A sync map is the ordered list of `[start, end, fragment]` triples over
//! the real audio timeline. The intermediate representation used between
//! projection and assembly is the *interval map*: the same triples with HEAD
//! and TAIL entries carrying no fragment.

mod builder;
mod project;

pub use builder::{build_sync_map, HeadTailFormat};
pub use project::{project_anchors, retranslate_with_head};

use serde::{Deserialize, Serialize};

use crate::text::TextFragment;

/// One entry of the intermediate interval map.
///
/// `fragment` is `None` for the HEAD and TAIL entries.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedInterval {
    pub start: f64,
    pub end: f64,
    pub fragment: Option<TextFragment>,
}

impl TimedInterval {
    /// Create an interval carrying a text fragment.
    pub fn text(start: f64, end: f64, fragment: TextFragment) -> Self {
        Self {
            start,
            end,
            fragment: Some(fragment),
        }
    }

    /// Create a HEAD/TAIL interval carrying no fragment.
    pub fn untexted(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            fragment: None,
        }
    }

    /// Interval length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Check whether this interval carries a text fragment.
    pub fn is_text(&self) -> bool {
        self.fragment.is_some()
    }
}

/// One fragment of the final sync map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMapFragment {
    /// The text located in this interval. HEAD/TAIL fragments (format `ADD`)
    /// carry the reserved ids `HEAD`/`TAIL` and empty text.
    pub fragment: TextFragment,
    /// Start on the real timeline, seconds.
    pub start_s: f64,
    /// End on the real timeline, seconds.
    pub end_s: f64,
}

impl SyncMapFragment {
    /// Create a sync map fragment.
    pub fn new(fragment: TextFragment, start_s: f64, end_s: f64) -> Self {
        Self {
            fragment,
            start_s,
            end_s,
        }
    }

    /// Fragment duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end_s - self.start_s
    }
}

/// The computed alignment between audio and text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncMap {
    fragments: Vec<SyncMapFragment>,
}

impl SyncMap {
    /// Create an empty sync map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment; order of insertion is preserved.
    pub fn append(&mut self, fragment: SyncMapFragment) {
        self.fragments.push(fragment);
    }

    /// All fragments in order.
    pub fn fragments(&self) -> &[SyncMapFragment] {
        &self.fragments
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Check if the map has no fragments.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_map_preserves_insertion_order() {
        let mut map = SyncMap::new();
        for k in 0..3 {
            map.append(SyncMapFragment::new(
                TextFragment::new(format!("f{k}"), "en", vec![]),
                k as f64,
                k as f64 + 1.0,
            ));
        }
        let ids: Vec<&str> = map
            .fragments()
            .iter()
            .map(|f| f.fragment.id.as_str())
            .collect();
        assert_eq!(ids, vec!["f0", "f1", "f2"]);
    }

    #[test]
    fn sync_map_serializes_to_json() {
        let mut map = SyncMap::new();
        map.append(SyncMapFragment::new(
            TextFragment::new("f1", "en", vec!["hi".into()]),
            0.0,
            1.5,
        ));
        let json = serde_json::to_string(&map).unwrap();
        assert!(json.contains("\"id\":\"f1\""));
        assert!(json.contains("\"end_s\":1.5"));
    }
}
