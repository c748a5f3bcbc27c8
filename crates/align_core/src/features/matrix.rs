//! Dense frame-major feature matrix.

/// An `F × T` feature matrix stored frame-major in one contiguous buffer.
///
/// `frame(t)` yields the `F` coefficients of frame `t`; coefficient 0 is the
/// log-energy proxy used by the VAD.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    n_coeffs: usize,
    n_frames: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    /// Build a matrix from per-frame coefficient vectors.
    ///
    /// All frames must have the same length.
    pub fn from_frames(frames: Vec<Vec<f64>>) -> Self {
        let n_frames = frames.len();
        let n_coeffs = frames.first().map(|f| f.len()).unwrap_or(0);
        debug_assert!(frames.iter().all(|f| f.len() == n_coeffs));

        let mut data = Vec::with_capacity(n_frames * n_coeffs);
        for frame in &frames {
            data.extend_from_slice(frame);
        }

        Self {
            n_coeffs,
            n_frames,
            data,
        }
    }

    /// Number of frames (`T`).
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// Number of coefficients per frame (`F`).
    pub fn n_coeffs(&self) -> usize {
        self.n_coeffs
    }

    /// Check if the matrix has no frames.
    pub fn is_empty(&self) -> bool {
        self.n_frames == 0
    }

    /// Coefficients of frame `t`.
    pub fn frame(&self, t: usize) -> &[f64] {
        let start = t * self.n_coeffs;
        &self.data[start..start + self.n_coeffs]
    }

    /// Log-energy proxy of frame `t` (coefficient 0).
    pub fn energy(&self, t: usize) -> f64 {
        self.data[t * self.n_coeffs]
    }

    /// Euclidean norms of all frame vectors.
    pub fn frame_norms(&self) -> Vec<f64> {
        (0..self.n_frames)
            .map(|t| self.frame(t).iter().map(|x| x * x).sum::<f64>().sqrt())
            .collect()
    }
}
