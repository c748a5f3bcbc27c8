//! Text fragments to be located in the recording.

use serde::{Deserialize, Serialize};

/// One fragment of the text being read aloud.
///
/// Fragments are immutable through the pipeline and keep their input order
/// end-to-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFragment {
    /// Caller-assigned identifier (unique within a task).
    pub id: String,
    /// Language code (e.g. "en"), forwarded to the synthesizer.
    pub language: String,
    /// Text lines of the fragment.
    pub lines: Vec<String>,
}

impl TextFragment {
    /// Create a fragment from its parts.
    pub fn new(
        id: impl Into<String>,
        language: impl Into<String>,
        lines: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            language: language.into(),
            lines,
        }
    }

    /// Full text with lines joined by a space.
    pub fn text(&self) -> String {
        self.lines.join(" ")
    }

    /// Character count used by the rate-based boundary policies.
    pub fn char_count(&self) -> usize {
        self.lines.iter().map(|l| l.chars().count()).sum()
    }
}
