//! MFCC extraction: pre-emphasis, Hamming frames, FFT power spectrum,
//! mel filterbank, log, DCT-II.

use std::f64::consts::PI;

use parking_lot::Mutex;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::audio::AudioBuffer;
use crate::errors::{AlignError, AlignResult};

use super::FeatureMatrix;

/// MFCC extraction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MfccConfig {
    /// Number of cepstral coefficients to keep.
    #[serde(default = "default_size")]
    pub size: usize,

    /// Analysis window length in seconds.
    #[serde(default = "default_window_s")]
    pub window_s: f64,

    /// Hop between consecutive frames in seconds.
    #[serde(default = "default_hop_s")]
    pub hop_s: f64,

    /// Number of mel filterbank bands.
    #[serde(default = "default_mel_bands")]
    pub mel_bands: usize,

    /// Pre-emphasis coefficient.
    #[serde(default = "default_pre_emphasis")]
    pub pre_emphasis: f64,

    /// Lower edge of the filterbank in Hz.
    #[serde(default = "default_lower_hz")]
    pub lower_hz: f64,

    /// Upper edge of the filterbank in Hz (capped at Nyquist).
    #[serde(default = "default_upper_hz")]
    pub upper_hz: f64,
}

fn default_size() -> usize {
    13
}

fn default_window_s() -> f64 {
    0.100
}

fn default_hop_s() -> f64 {
    0.040
}

fn default_mel_bands() -> usize {
    40
}

fn default_pre_emphasis() -> f64 {
    0.97
}

fn default_lower_hz() -> f64 {
    133.33
}

fn default_upper_hz() -> f64 {
    6855.5
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            window_s: default_window_s(),
            hop_s: default_hop_s(),
            mel_bands: default_mel_bands(),
            pre_emphasis: default_pre_emphasis(),
            lower_hz: default_lower_hz(),
            upper_hz: default_upper_hz(),
        }
    }
}

/// MFCC extractor with a cached FFT planner.
pub struct MfccExtractor {
    config: MfccConfig,
    planner: Mutex<FftPlanner<f64>>,
}

impl MfccExtractor {
    /// Create an extractor for the given parameters.
    pub fn new(config: MfccConfig) -> Self {
        Self {
            config,
            planner: Mutex::new(FftPlanner::new()),
        }
    }

    /// Extraction parameters.
    pub fn config(&self) -> &MfccConfig {
        &self.config
    }

    /// Compute the MFCC matrix of a PCM buffer.
    ///
    /// Frame `t` covers samples `[t·hop, t·hop + window)`; the frame count is
    /// `⌊(N/rate − window)/hop⌋ + 1`.
    pub fn extract(&self, audio: &AudioBuffer) -> AlignResult<FeatureMatrix> {
        if audio.sample_rate == 0 {
            return Err(AlignError::invalid_audio("sample rate is zero"));
        }

        let rate = audio.sample_rate as f64;
        let window_samples = (self.config.window_s * rate).round() as usize;
        let hop_samples = ((self.config.hop_s * rate).round() as usize).max(1);

        if window_samples < 2 {
            return Err(AlignError::invalid_audio(format!(
                "window of {} s is shorter than two samples at {} Hz",
                self.config.window_s, audio.sample_rate
            )));
        }
        if audio.samples.len() < window_samples {
            return Err(AlignError::invalid_audio(format!(
                "{} samples is shorter than one window of {}",
                audio.samples.len(),
                window_samples
            )));
        }

        let n_frames = (audio.samples.len() - window_samples) / hop_samples + 1;
        let fft_size = window_samples.next_power_of_two();
        let n_bins = fft_size / 2 + 1;

        // Pre-emphasis over the whole signal, in double precision.
        let alpha = self.config.pre_emphasis;
        let mut emphasized = Vec::with_capacity(audio.samples.len());
        emphasized.push(audio.samples[0] as f64);
        for n in 1..audio.samples.len() {
            emphasized.push(audio.samples[n] as f64 - alpha * audio.samples[n - 1] as f64);
        }

        let window = hamming_window(window_samples);
        let filterbank = self.mel_filterbank(rate, fft_size, n_bins);

        let fft = {
            let mut planner = self.planner.lock();
            planner.plan_fft_forward(fft_size)
        };

        let mut frames = Vec::with_capacity(n_frames);
        let mut buffer = vec![Complex::new(0.0, 0.0); fft_size];
        let mut power = vec![0.0f64; n_bins];
        let mut mel = vec![0.0f64; self.config.mel_bands];

        for t in 0..n_frames {
            let start = t * hop_samples;

            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = if i < window_samples {
                    Complex::new(emphasized[start + i] * window[i], 0.0)
                } else {
                    Complex::new(0.0, 0.0)
                };
            }
            fft.process(&mut buffer);

            for (bin, p) in power.iter_mut().enumerate() {
                *p = buffer[bin].norm_sqr();
            }

            for (band, filter) in filterbank.iter().enumerate() {
                mel[band] = filter
                    .iter()
                    .zip(power.iter())
                    .map(|(&f, &p)| f * p)
                    .sum::<f64>()
                    .max(1e-10)
                    .ln();
            }

            frames.push(self.apply_dct(&mel));
        }

        Ok(FeatureMatrix::from_frames(frames))
    }

    /// Triangular mel filterbank, `mel_bands × n_bins`.
    fn mel_filterbank(&self, sample_rate: f64, fft_size: usize, n_bins: usize) -> Vec<Vec<f64>> {
        let n_mels = self.config.mel_bands;
        let lower = self.config.lower_hz;
        let upper = self.config.upper_hz.min(sample_rate / 2.0);

        let mel_min = hz_to_mel(lower);
        let mel_max = hz_to_mel(upper);

        let hz_points: Vec<f64> = (0..=n_mels + 1)
            .map(|i| mel_min + (mel_max - mel_min) * i as f64 / (n_mels + 1) as f64)
            .map(mel_to_hz)
            .collect();
        let bin_points: Vec<f64> = hz_points
            .iter()
            .map(|&hz| hz * fft_size as f64 / sample_rate)
            .collect();

        let mut filterbank = vec![vec![0.0; n_bins]; n_mels];
        for i in 0..n_mels {
            let start = bin_points[i];
            let center = bin_points[i + 1];
            let end = bin_points[i + 2];

            for (j, slot) in filterbank[i].iter_mut().enumerate() {
                let bin = j as f64;
                if bin >= start && bin < center {
                    *slot = (bin - start) / (center - start);
                } else if bin >= center && bin <= end {
                    *slot = (end - bin) / (end - center);
                }
            }

            // Normalize each triangle by its bandwidth in Hz.
            let bandwidth = hz_points[i + 2] - hz_points[i];
            if bandwidth > 0.0 {
                let norm = 2.0 / bandwidth;
                for slot in filterbank[i].iter_mut() {
                    *slot *= norm;
                }
            }
        }

        filterbank
    }

    /// DCT-II with orthonormal scaling, keeping the first `size` coefficients.
    fn apply_dct(&self, log_mel: &[f64]) -> Vec<f64> {
        let n = log_mel.len();
        let mut coeffs = vec![0.0; self.config.size];

        for (k, coeff) in coeffs.iter_mut().enumerate() {
            let mut sum = 0.0;
            for (i, &val) in log_mel.iter().enumerate() {
                sum += val * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n as f64)).cos();
            }
            *coeff = sum;
        }

        if !coeffs.is_empty() {
            coeffs[0] *= (1.0 / n as f64).sqrt();
            for coeff in coeffs.iter_mut().skip(1) {
                *coeff *= (2.0 / n as f64).sqrt();
            }
        }

        coeffs
    }
}

/// Mel scale conversion, 2595·log10(1 + f/700).
fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10f64.powf(mel / 2595.0) - 1.0)
}

fn hamming_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (size - 1) as f64).cos())
        .collect()
}
