//! Forced alignment between a spoken-audio recording and its text.
//!
//! Given an audio file and the ordered list of text fragments read aloud in
//! it, the pipeline computes a *sync map*: `[start, end, fragment]` intervals
//! locating each fragment on the recording's timeline.
//!
//! This crate contains the alignment engine only, with no UI dependencies.
//! Audio decoding and text-to-speech are pluggable via the traits in
//! [`synthesis`]; sync-map persistence is left to callers.
//!
//! # Pipeline
//!
//! PCM → MFCC → (VAD → head/tail trim → MFCC') → DTW against synthesized
//! MFCCs → anchor projection → boundary adjustment → sync map.
//!
//! ```no_run
//! use align_core::{Task, TaskConfig, TaskExecutor, TextFragment};
//! use align_core::synthesis::WavDecoder;
//! # use align_core::synthesis::{SpeechSynthesizer, SynthAnchor};
//! # use align_core::audio::AudioBuffer;
//! # struct MySynth;
//! # impl SpeechSynthesizer for MySynth {
//! #     fn synthesize(&self, _: &[TextFragment])
//! #         -> align_core::AlignResult<(AudioBuffer, Vec<SynthAnchor>)> { unimplemented!() }
//! # }
//!
//! let fragments = vec![TextFragment::new("f1", "en", vec!["Hello world".into()])];
//! let mut task = Task::new("recording.wav", fragments);
//!
//! let executor = TaskExecutor::new(
//!     TaskConfig::default(),
//!     Box::new(WavDecoder),
//!     Box::new(MySynth),
//! )?;
//! executor.execute(&mut task, None)?;
//!
//! let sync_map = task.sync_map.unwrap();
//! # Ok::<(), align_core::AlignError>(())
//! ```

pub mod audio;
pub mod boundary;
pub mod config;
pub mod dtw;
pub mod errors;
pub mod features;
pub mod logging;
pub mod pipeline;
pub mod syncmap;
pub mod synthesis;
pub mod text;
pub mod vad;

pub use boundary::BoundaryPolicy;
pub use config::TaskConfig;
pub use errors::{AlignError, AlignResult};
pub use pipeline::{CancelHandle, ExecutionReport, Task, TaskExecutor};
pub use syncmap::{HeadTailFormat, SyncMap, SyncMapFragment};
pub use text::TextFragment;

/// Crate version string.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
