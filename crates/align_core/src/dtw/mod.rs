//! Dynamic Time Warping between the real and synthesized MFCC sequences.
//!
//! The aligner computes a minimum-cost monotonic warp path restricted to a
//! Sakoe-Chiba band and exposes it as a per-synthetic-frame mapping of
//! `[real_time, synth_time]` pairs. Cost is cosine distance between frame
//! vectors; the accumulated-cost matrix is processed with rolling rows and a
//! 2-bit back-pointer stream so memory stays `O(band · T)`.

mod kernel;

use serde::{Deserialize, Serialize};

use crate::errors::{AlignError, AlignResult};
use crate::features::FeatureMatrix;
use crate::pipeline::CancelHandle;

/// DTW parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DtwConfig {
    /// Half-width of the Sakoe-Chiba band, in seconds of drift between the
    /// real and synthetic timelines.
    #[serde(default = "default_margin_s")]
    pub margin_s: f64,
}

fn default_margin_s() -> f64 {
    60.0
}

impl Default for DtwConfig {
    fn default() -> Self {
        Self {
            margin_s: default_margin_s(),
        }
    }
}

/// One row of the real↔synthetic time mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MappedFrame {
    /// Time on the real audio timeline, in seconds.
    pub real_s: f64,
    /// Time on the synthetic audio timeline, in seconds.
    pub synth_s: f64,
}

/// Mapping from every synthetic frame to its real-timeline counterpart.
///
/// Contains exactly `T_s` rows; `real_s` is non-decreasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveMapping {
    frames: Vec<MappedFrame>,
}

impl WaveMapping {
    /// All mapping rows, one per synthetic frame.
    pub fn frames(&self) -> &[MappedFrame] {
        &self.frames
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if the mapping has no rows.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Real time of the first row.
    pub fn first_real_s(&self) -> f64 {
        self.frames.first().map(|m| m.real_s).unwrap_or(0.0)
    }

    /// Real time of the last row.
    pub fn last_real_s(&self) -> f64 {
        self.frames.last().map(|m| m.real_s).unwrap_or(0.0)
    }
}

/// Banded DTW aligner.
pub struct DtwAligner {
    radius_frames: usize,
    hop_s: f64,
}

impl DtwAligner {
    /// Create an aligner; the band radius is derived from the configured
    /// margin and the frame hop.
    pub fn new(config: &DtwConfig, hop_s: f64) -> Self {
        let radius_frames = (config.margin_s / hop_s).ceil() as usize;
        Self {
            radius_frames: radius_frames.max(1),
            hop_s,
        }
    }

    /// Band radius in frames.
    pub fn radius_frames(&self) -> usize {
        self.radius_frames
    }

    /// Align a real MFCC sequence against a synthetic one.
    ///
    /// Returns one mapping row per synthetic frame; for a synthetic frame
    /// paired with several real frames on the warp path, the largest real
    /// index wins.
    pub fn align(
        &self,
        real: &FeatureMatrix,
        synth: &FeatureMatrix,
        cancel: Option<&CancelHandle>,
    ) -> AlignResult<WaveMapping> {
        if real.n_coeffs() != synth.n_coeffs() {
            return Err(AlignError::DimensionMismatch {
                real: real.n_coeffs(),
                synth: synth.n_coeffs(),
            });
        }
        if real.is_empty() || synth.is_empty() {
            return Err(AlignError::invalid_audio("empty MFCC sequence"));
        }

        let path = kernel::shortest_warp_path(real, synth, self.radius_frames, cancel)?;
        tracing::debug!(
            cost = path.cost,
            path_len = path.pairs.len(),
            "warp path recovered"
        );

        // The path visits every synth index in order; a later pair for the
        // same j carries a larger real index, so plain assignment keeps the
        // largest one.
        let mut best_real = vec![0usize; synth.n_frames()];
        for &(i, j) in &path.pairs {
            best_real[j] = i;
        }

        let frames = best_real
            .iter()
            .enumerate()
            .map(|(j, &i)| MappedFrame {
                real_s: i as f64 * self.hop_s,
                synth_s: j as f64 * self.hop_s,
            })
            .collect();

        Ok(WaveMapping { frames })
    }
}
