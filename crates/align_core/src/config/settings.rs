//! Settings struct with TOML-based sections.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryPolicy;
use crate::dtw::DtwConfig;
use crate::errors::{AlignError, AlignResult};
use crate::features::MfccConfig;
use crate::syncmap::HeadTailFormat;
use crate::vad::VadConfig;

/// Root configuration for one alignment task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Head/tail trimming and detection bounds.
    #[serde(default)]
    pub audio: AudioSettings,

    /// MFCC extraction parameters.
    #[serde(default)]
    pub mfcc: MfccConfig,

    /// Voice activity detection parameters.
    #[serde(default)]
    pub vad: VadConfig,

    /// DTW band parameters.
    #[serde(default)]
    pub dtw: DtwConfig,

    /// Boundary adjustment policy.
    #[serde(default)]
    pub boundary: BoundarySettings,

    /// Output shaping.
    #[serde(default)]
    pub output: OutputSettings,

    /// Temp directory and other paths.
    #[serde(default)]
    pub paths: PathSettings,
}

impl TaskConfig {
    /// Parse and validate a TOML configuration string.
    pub fn from_toml_str(s: &str) -> AlignResult<Self> {
        let config: Self = toml::from_str(s)
            .map_err(|e| AlignError::config_invalid(format!("cannot parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section for consistency.
    pub fn validate(&self) -> AlignResult<()> {
        if self.mfcc.size == 0 {
            return Err(AlignError::config_invalid("mfcc size must be at least 1"));
        }
        if self.mfcc.size > self.mfcc.mel_bands {
            return Err(AlignError::config_invalid(format!(
                "mfcc size {} exceeds mel band count {}",
                self.mfcc.size, self.mfcc.mel_bands
            )));
        }
        if self.mfcc.window_s <= 0.0 || self.mfcc.hop_s <= 0.0 {
            return Err(AlignError::config_invalid(
                "mfcc window and hop must be positive",
            ));
        }
        if !(0.0..1.0).contains(&self.mfcc.pre_emphasis) {
            return Err(AlignError::config_invalid(
                "pre-emphasis must be in [0, 1)",
            ));
        }
        if self.mfcc.lower_hz < 0.0 || self.mfcc.upper_hz <= self.mfcc.lower_hz {
            return Err(AlignError::config_invalid(
                "filterbank bounds must satisfy 0 <= lower < upper",
            ));
        }

        if !(0.0..=1.0).contains(&self.vad.energy_threshold) || self.vad.energy_threshold == 0.0 {
            return Err(AlignError::config_invalid(
                "vad energy threshold must be in (0, 1]",
            ));
        }
        if self.vad.min_speech_frames == 0 || self.vad.min_nonspeech_frames == 0 {
            return Err(AlignError::config_invalid(
                "vad minimum run lengths must be at least 1 frame",
            ));
        }

        if self.dtw.margin_s <= 0.0 {
            return Err(AlignError::config_invalid("dtw margin must be positive"));
        }

        self.audio.validate()?;
        self.boundary.policy()?;

        Ok(())
    }
}

/// Head/tail trimming options.
///
/// Explicit `head_length`/`process_length` override detection entirely;
/// otherwise any set `detect_*` bound enables VAD-based detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Explicit head length to cut, in seconds.
    #[serde(default)]
    pub head_length: Option<f64>,

    /// Explicit length to process after the head, in seconds.
    #[serde(default)]
    pub process_length: Option<f64>,

    /// Lower bound for head detection, in seconds.
    #[serde(default)]
    pub detect_head_min: Option<f64>,

    /// Upper bound for head detection, in seconds.
    #[serde(default)]
    pub detect_head_max: Option<f64>,

    /// Lower bound for tail detection, in seconds.
    #[serde(default)]
    pub detect_tail_min: Option<f64>,

    /// Upper bound for tail detection, in seconds.
    #[serde(default)]
    pub detect_tail_max: Option<f64>,
}

impl AudioSettings {
    /// Check whether explicit head/process lengths are configured.
    pub fn is_explicit(&self) -> bool {
        self.head_length.is_some() || self.process_length.is_some()
    }

    /// Check whether any detection bound is configured.
    pub fn wants_head_detection(&self) -> bool {
        self.detect_head_min.is_some() || self.detect_head_max.is_some()
    }

    /// Check whether any tail detection bound is configured.
    pub fn wants_tail_detection(&self) -> bool {
        self.detect_tail_min.is_some() || self.detect_tail_max.is_some()
    }

    fn validate(&self) -> AlignResult<()> {
        for (name, value) in [
            ("head_length", self.head_length),
            ("process_length", self.process_length),
            ("detect_head_min", self.detect_head_min),
            ("detect_head_max", self.detect_head_max),
            ("detect_tail_min", self.detect_tail_min),
            ("detect_tail_max", self.detect_tail_max),
        ] {
            if let Some(v) = value {
                if v < 0.0 {
                    return Err(AlignError::config_invalid(format!(
                        "{name} must be non-negative, got {v}"
                    )));
                }
            }
        }

        if let (Some(min), Some(max)) = (self.detect_head_min, self.detect_head_max) {
            if min > max {
                return Err(AlignError::config_invalid(format!(
                    "detect_head_min {min} exceeds detect_head_max {max}"
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.detect_tail_min, self.detect_tail_max) {
            if min > max {
                return Err(AlignError::config_invalid(format!(
                    "detect_tail_min {min} exceeds detect_tail_max {max}"
                )));
            }
        }

        Ok(())
    }
}

/// Boundary adjustment algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoundaryAlgorithm {
    /// No adjustment.
    #[default]
    None,
    /// Documented no-op.
    Auto,
    /// Place boundaries a fixed delay after the current fragment.
    AfterCurrent,
    /// Place boundaries a fixed delay before the next fragment.
    BeforeNext,
    /// Shift boundaries by a fixed offset.
    Offset,
    /// Place boundaries at a percentage of the silence gap.
    Percent,
    /// Extend fragments spoken faster than a character rate.
    Rate,
    /// Rate adjustment that may also borrow from successors.
    RateAggressive,
}

/// Boundary adjustment configuration: algorithm plus its value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BoundarySettings {
    /// Selected algorithm.
    #[serde(default)]
    pub algorithm: BoundaryAlgorithm,

    /// Algorithm parameter: seconds, percent, or chars/second.
    #[serde(default)]
    pub value: Option<f64>,
}

impl BoundarySettings {
    /// Resolve into a [`BoundaryPolicy`], validating the value.
    pub fn policy(&self) -> AlignResult<BoundaryPolicy> {
        let value = || {
            self.value.ok_or_else(|| {
                AlignError::config_invalid(format!(
                    "boundary algorithm {:?} requires a value",
                    self.algorithm
                ))
            })
        };

        Ok(match self.algorithm {
            BoundaryAlgorithm::None => BoundaryPolicy::None,
            BoundaryAlgorithm::Auto => BoundaryPolicy::Auto,
            BoundaryAlgorithm::AfterCurrent => BoundaryPolicy::AfterCurrent(value()?),
            BoundaryAlgorithm::BeforeNext => BoundaryPolicy::BeforeNext(value()?),
            BoundaryAlgorithm::Offset => BoundaryPolicy::Offset(value()?),
            BoundaryAlgorithm::Percent => {
                let percent = value()?;
                if !(0.0..=100.0).contains(&percent) {
                    return Err(AlignError::config_invalid(format!(
                        "percent value must be in [0, 100], got {percent}"
                    )));
                }
                BoundaryPolicy::Percent(percent)
            }
            BoundaryAlgorithm::Rate => BoundaryPolicy::Rate(positive_rate(value()?)?),
            BoundaryAlgorithm::RateAggressive => {
                BoundaryPolicy::RateAggressive(positive_rate(value()?)?)
            }
        })
    }
}

fn positive_rate(rate: f64) -> AlignResult<f64> {
    if rate <= 0.0 {
        return Err(AlignError::config_invalid(format!(
            "rate must be positive, got {rate}"
        )));
    }
    Ok(rate)
}

/// Output shaping options.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    /// How HEAD/TAIL audio shows up in the sync map.
    #[serde(default)]
    pub head_tail_format: HeadTailFormat,
}

/// Filesystem paths used by the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathSettings {
    /// Directory for temporary WAV files; the system temp dir if unset.
    #[serde(default)]
    pub tmp_dir: Option<PathBuf>,
}

impl PathSettings {
    /// Effective temp directory.
    pub fn tmp_dir(&self) -> PathBuf {
        self.tmp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
