//! Mono PCM buffers and WAV I/O.
//!
//! The pipeline works on decoded mono audio normalized to `[-1, 1]`.
//! Resampling and channel mixdown are the decoder's responsibility.

mod wav;

pub use wav::{read_wav, write_wav};

/// Decoded mono PCM audio.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Samples as f32, normalized to `[-1, 1]`.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a buffer from samples and rate.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Trim the buffer in place to `[head_s, head_s + length_s)`.
    ///
    /// A `None` head keeps the start; a `None` length keeps everything after
    /// the head. Out-of-range values are clamped to the buffer bounds.
    pub fn trim(&mut self, head_s: Option<f64>, length_s: Option<f64>) {
        let rate = self.sample_rate as f64;
        let start = head_s
            .map(|h| (h.max(0.0) * rate).round() as usize)
            .unwrap_or(0)
            .min(self.samples.len());
        let end = length_s
            .map(|l| start + (l.max(0.0) * rate).round() as usize)
            .unwrap_or(self.samples.len())
            .min(self.samples.len());

        self.samples.drain(..start);
        self.samples.truncate(end - start);
    }
}
