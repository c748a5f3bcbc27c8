//! Task and execution report types.

use std::path::PathBuf;

use serde::Serialize;

use crate::syncmap::SyncMap;
use crate::text::TextFragment;

/// One alignment task: an audio file and the text read aloud in it.
///
/// On success the executor stores the computed sync map on the task; on
/// failure `sync_map` is left untouched.
#[derive(Debug, Clone)]
pub struct Task {
    /// Path to the audio recording.
    pub audio_path: PathBuf,
    /// Ordered text fragments.
    pub fragments: Vec<TextFragment>,
    /// Computed sync map, set by a successful execution.
    pub sync_map: Option<SyncMap>,
}

impl Task {
    /// Create a task from an audio path and its fragments.
    pub fn new(audio_path: impl Into<PathBuf>, fragments: Vec<TextFragment>) -> Self {
        Self {
            audio_path: audio_path.into(),
            fragments,
            sync_map: None,
        }
    }
}

/// Summary of a successful execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    /// When the execution started (local time, RFC 3339).
    pub started_at: String,
    /// Duration of the full recording, seconds.
    pub audio_length_s: f64,
    /// Head length cut before alignment, seconds.
    pub head_length_s: f64,
    /// Length of audio actually aligned, seconds.
    pub process_length_s: f64,
    /// Stage names in execution order.
    pub stages_completed: Vec<String>,
}
