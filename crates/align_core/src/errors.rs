//! Error types for the alignment pipeline.
//!
//! Every stage reports failure as a typed error; the pipeline aborts on the
//! first error, runs temp cleanup, and surfaces it unchanged.

use std::io;

use thiserror::Error;

/// Errors produced by the alignment pipeline and its stages.
#[derive(Error, Debug)]
pub enum AlignError {
    /// Audio data violates an invariant (empty, too short, bad rate).
    #[error("Invalid audio: {0}")]
    InvalidAudio(String),

    /// Text fragment list violates an invariant (empty, anchor mismatch).
    #[error("Invalid text: {0}")]
    InvalidText(String),

    /// The audio decoder failed to produce PCM.
    #[error("Audio decoding failed: {0}")]
    DecodeFailed(String),

    /// The speech synthesizer failed.
    #[error("Synthesis failed: {0}")]
    SynthesizeFailed(String),

    /// The two MFCC sequences have different coefficient counts.
    #[error("MFCC dimension mismatch: {real} vs {synth}")]
    DimensionMismatch { real: usize, synth: usize },

    /// The banded DTW working set would exceed the memory ceiling.
    #[error("DTW working set of {estimated_mb} MB exceeds the memory ceiling")]
    DtwOutOfMemory { estimated_mb: usize },

    /// Execution was cancelled via the cancel handle.
    #[error("Execution cancelled")]
    Cancelled,

    /// File I/O error with operation context.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
}

impl AlignError {
    /// Create an invalid audio error.
    pub fn invalid_audio(message: impl Into<String>) -> Self {
        Self::InvalidAudio(message.into())
    }

    /// Create an invalid text error.
    pub fn invalid_text(message: impl Into<String>) -> Self {
        Self::InvalidText(message.into())
    }

    /// Create a decode failure error.
    pub fn decode_failed(message: impl Into<String>) -> Self {
        Self::DecodeFailed(message.into())
    }

    /// Create a synthesis failure error.
    pub fn synthesize_failed(message: impl Into<String>) -> Self {
        Self::SynthesizeFailed(message.into())
    }

    /// Create an I/O error with operation context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid(message.into())
    }
}

/// Result type for alignment operations.
pub type AlignResult<T> = Result<T, AlignError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_display_context() {
        let err = AlignError::DimensionMismatch { real: 13, synth: 12 };
        assert!(err.to_string().contains("13 vs 12"));

        let err = AlignError::io_error("writing temp WAV", io::Error::other("disk full"));
        let msg = err.to_string();
        assert!(msg.contains("writing temp WAV"));
    }

    #[test]
    fn helper_constructors_build_variants() {
        assert!(matches!(
            AlignError::invalid_audio("x"),
            AlignError::InvalidAudio(_)
        ));
        assert!(matches!(
            AlignError::config_invalid("x"),
            AlignError::ConfigInvalid(_)
        ));
    }
}
