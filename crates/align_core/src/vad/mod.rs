//! Voice activity detection over the MFCC log-energy proxy.
//!
//! Frames are classified as speech or non-speech by thresholding the 0-th
//! MFCC coefficient, short runs are absorbed into their neighbors, and the
//! resulting maximal runs are emitted as two interval sets that partition
//! the analyzed duration.

mod headtail;

pub use headtail::{
    detect_head, detect_tail, DEFAULT_MAX_HEAD_S, DEFAULT_MAX_TAIL_S, DEFAULT_MIN_HEAD_S,
    DEFAULT_MIN_TAIL_S,
};

use serde::{Deserialize, Serialize};

use crate::features::FeatureMatrix;

/// A half-open time interval `[start, end)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    /// Create an interval.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Interval length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Check whether `t` falls inside `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }
}

/// Find the interval containing `t`, if any.
pub fn find_containing(intervals: &[Interval], t: f64) -> Option<&Interval> {
    intervals.iter().find(|iv| iv.contains(t))
}

/// VAD parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VadConfig {
    /// Speech threshold as a fraction of the maximum shifted log energy.
    #[serde(default = "default_energy_threshold")]
    pub energy_threshold: f64,

    /// Minimum speech run length in frames; shorter bursts are dropped.
    #[serde(default = "default_min_speech_frames")]
    pub min_speech_frames: usize,

    /// Minimum non-speech run length in frames; shorter gaps are filled.
    #[serde(default = "default_min_nonspeech_frames")]
    pub min_nonspeech_frames: usize,
}

fn default_energy_threshold() -> f64 {
    0.699
}

fn default_min_speech_frames() -> usize {
    5
}

fn default_min_nonspeech_frames() -> usize {
    2
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            energy_threshold: default_energy_threshold(),
            min_speech_frames: default_min_speech_frames(),
            min_nonspeech_frames: default_min_nonspeech_frames(),
        }
    }
}

/// Speech and non-speech interval sets partitioning `[0, T·hop]`.
#[derive(Debug, Clone, Default)]
pub struct VadSegments {
    pub speech: Vec<Interval>,
    pub nonspeech: Vec<Interval>,
}

/// Energy-based voice activity detector.
pub struct VoiceActivityDetector {
    config: VadConfig,
}

impl VoiceActivityDetector {
    /// Create a detector with the given parameters.
    pub fn new(config: VadConfig) -> Self {
        Self { config }
    }

    /// Segment an MFCC matrix into speech and non-speech intervals.
    ///
    /// `hop_s` is the frame stride the matrix was extracted with; interval
    /// boundaries land on frame-hop multiples.
    pub fn detect(&self, mfcc: &FeatureMatrix, hop_s: f64) -> VadSegments {
        let n = mfcc.n_frames();
        if n == 0 {
            return VadSegments::default();
        }

        let energies: Vec<f64> = (0..n).map(|t| mfcc.energy(t)).collect();

        // Log energies are typically negative; shift to a zero floor so the
        // threshold ratio is over the dynamic range.
        let min_e = energies.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_shifted = energies
            .iter()
            .map(|&e| e - min_e)
            .fold(f64::NEG_INFINITY, f64::max);
        let threshold = self.config.energy_threshold * max_shifted;

        let mut classes: Vec<bool> = energies
            .iter()
            .map(|&e| e - min_e >= threshold)
            .collect();

        // Fill short non-speech gaps first, then drop short speech bursts.
        absorb_short_runs(&mut classes, false, self.config.min_nonspeech_frames);
        absorb_short_runs(&mut classes, true, self.config.min_speech_frames);

        let mut segments = VadSegments::default();
        let mut run_start = 0usize;
        for t in 1..=n {
            if t == n || classes[t] != classes[run_start] {
                let interval = Interval::new(run_start as f64 * hop_s, t as f64 * hop_s);
                if classes[run_start] {
                    segments.speech.push(interval);
                } else {
                    segments.nonspeech.push(interval);
                }
                run_start = t;
            }
        }

        segments
    }
}

/// Flip runs of `target_class` shorter than `min_len` into the opposite class.
fn absorb_short_runs(classes: &mut [bool], target_class: bool, min_len: usize) {
    let n = classes.len();
    let mut run_start = 0usize;
    for t in 1..=n {
        if t == n || classes[t] != classes[run_start] {
            let run_len = t - run_start;
            // A run spanning the whole signal has nothing to absorb into.
            if classes[run_start] == target_class && run_len < min_len && run_len < n {
                for c in classes.iter_mut().take(t).skip(run_start) {
                    *c = !target_class;
                }
            }
            run_start = t;
        }
    }
}
