//! Seams to the external collaborators: audio decoding and text-to-speech.
//!
//! The pipeline never shells out or synthesizes on its own; callers provide
//! implementations of these traits. A WAV-file decoder ships with the crate.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::audio::{self, AudioBuffer};
use crate::errors::AlignResult;
use crate::text::TextFragment;

/// Start time of a fragment inside the synthesized audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthAnchor {
    /// Time of the fragment's first sample on the synthetic timeline.
    pub time_s: f64,
    /// Id of the fragment this anchor belongs to.
    pub fragment_id: String,
}

impl SynthAnchor {
    /// Create an anchor.
    pub fn new(time_s: f64, fragment_id: impl Into<String>) -> Self {
        Self {
            time_s,
            fragment_id: fragment_id.into(),
        }
    }
}

/// Decodes an audio file into mono PCM normalized to `[-1, 1]`.
///
/// Resampling to the pipeline rate (16 kHz) is the decoder's responsibility.
pub trait AudioDecoder: Send + Sync {
    /// Decode the file at `path`.
    fn decode(&self, path: &Path) -> AlignResult<AudioBuffer>;
}

/// Synthesizes text fragments into PCM plus per-fragment start anchors.
///
/// `anchors[k]` must carry the start time of fragment `k`; the anchor list
/// has exactly one entry per fragment, in fragment order.
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize the fragment list.
    fn synthesize(
        &self,
        fragments: &[TextFragment],
    ) -> AlignResult<(AudioBuffer, Vec<SynthAnchor>)>;
}

/// Decoder for already-decoded mono WAV files.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavDecoder;

impl AudioDecoder for WavDecoder {
    fn decode(&self, path: &Path) -> AlignResult<AudioBuffer> {
        audio::read_wav(path)
    }
}
