//! Banded DTW forward pass and path recovery.
//!
//! The accumulated-cost matrix is never materialized: the forward pass keeps
//! two rolling rows inside the Sakoe-Chiba band and records one of three
//! predecessors per cell in a 2-bit stream, which the backtrack replays.

use crate::errors::{AlignError, AlignResult};
use crate::features::FeatureMatrix;
use crate::pipeline::CancelHandle;

/// Cancellation is polled once at least this many cells have been evaluated.
const CANCEL_CHECK_CELLS: usize = 4096;

/// Hard cap on the back-pointer stream plus rolling rows.
const MEMORY_CEILING_BYTES: usize = 1 << 30;

const PRED_DIAG: u8 = 0;
const PRED_LEFT: u8 = 1;
const PRED_UP: u8 = 2;
const PRED_NONE: u8 = 3;

/// Packed 2-bit predecessor codes, one per in-band cell.
struct BackPointers {
    bits: Vec<u8>,
}

impl BackPointers {
    fn new(cells: usize) -> Self {
        Self {
            bits: vec![0u8; cells.div_ceil(4)],
        }
    }

    fn set(&mut self, idx: usize, code: u8) {
        let shift = (idx & 3) * 2;
        let byte = &mut self.bits[idx >> 2];
        *byte = (*byte & !(0b11 << shift)) | (code << shift);
    }

    fn get(&self, idx: usize) -> u8 {
        (self.bits[idx >> 2] >> ((idx & 3) * 2)) & 0b11
    }
}

/// A recovered warp path with its accumulated cost.
pub(crate) struct WarpPath {
    /// Monotonically non-decreasing `(real, synth)` index pairs from
    /// `(0, 0)` to `(T_r−1, T_s−1)`.
    pub pairs: Vec<(usize, usize)>,
    /// Accumulated cosine-distance cost along the path.
    pub cost: f64,
}

/// Cosine distance between two frame vectors with precomputed norms.
pub(crate) fn cosine_distance(a: &[f64], b: &[f64], norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    1.0 - dot / (norm_a * norm_b)
}

/// Compute the minimum-cost monotonic path between two feature sequences,
/// restricted to a Sakoe-Chiba band of `radius` frames around the scaled
/// diagonal.
pub(crate) fn shortest_warp_path(
    real: &FeatureMatrix,
    synth: &FeatureMatrix,
    radius: usize,
    cancel: Option<&CancelHandle>,
) -> AlignResult<WarpPath> {
    let t_r = real.n_frames();
    let t_s = synth.n_frames();

    // Widen the radius so the terminal cell is always inside the band even
    // when the sequences have very different lengths.
    let radius = radius.max(t_r.div_ceil(t_s) + 1);

    // Band window over real indices for each synth row, plus cumulative cell
    // offsets into the back-pointer stream.
    let mut row_lo = Vec::with_capacity(t_s);
    let mut row_start = Vec::with_capacity(t_s + 1);
    row_start.push(0usize);
    let mut total_cells = 0usize;
    for j in 0..t_s {
        let center = j * t_r / t_s;
        let lo = center.saturating_sub(radius);
        let hi = (center + radius + 1).min(t_r);
        row_lo.push(lo);
        total_cells += hi - lo;
        row_start.push(total_cells);
    }

    let estimated_bytes = total_cells.div_ceil(4) + 2 * (2 * radius + 2) * 8;
    if estimated_bytes > MEMORY_CEILING_BYTES {
        return Err(AlignError::DtwOutOfMemory {
            estimated_mb: estimated_bytes >> 20,
        });
    }

    let real_norms = real.frame_norms();
    let synth_norms = synth.frame_norms();
    let dist = |i: usize, j: usize| {
        cosine_distance(real.frame(i), synth.frame(j), real_norms[i], synth_norms[j])
    };

    let mut ptrs = BackPointers::new(total_cells);
    let mut prev: Vec<f64> = Vec::new();
    let mut prev_lo = 0usize;
    let mut prev_hi = 0usize;
    let mut cells_since_check = 0usize;

    for j in 0..t_s {
        let lo = row_lo[j];
        let width = row_start[j + 1] - row_start[j];
        let hi = lo + width;
        let base = row_start[j];
        let mut cur = vec![f64::INFINITY; width];

        for i in lo..hi {
            let idx = base + (i - lo);
            let d = dist(i, j);

            if j == 0 {
                // First row: cumulative sum along the real axis.
                if i == 0 {
                    cur[0] = d;
                    ptrs.set(idx, PRED_NONE);
                } else {
                    cur[i - lo] = d + cur[i - 1 - lo];
                    ptrs.set(idx, PRED_LEFT);
                }
                continue;
            }

            let mut best = f64::INFINITY;
            let mut code = PRED_NONE;
            if i >= 1 && i - 1 >= prev_lo && i - 1 < prev_hi {
                let v = prev[i - 1 - prev_lo];
                if v < best {
                    best = v;
                    code = PRED_DIAG;
                }
            }
            if i > lo {
                let v = cur[i - 1 - lo];
                if v < best {
                    best = v;
                    code = PRED_LEFT;
                }
            }
            if i >= prev_lo && i < prev_hi {
                let v = prev[i - prev_lo];
                if v < best {
                    best = v;
                    code = PRED_UP;
                }
            }

            if code != PRED_NONE {
                cur[i - lo] = d + best;
            }
            ptrs.set(idx, code);
        }

        cells_since_check += width;
        if cells_since_check >= CANCEL_CHECK_CELLS {
            cells_since_check = 0;
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return Err(AlignError::Cancelled);
            }
        }

        prev = cur;
        prev_lo = lo;
        prev_hi = hi;
    }

    let cost = prev[t_r - 1 - prev_lo];
    if !cost.is_finite() {
        return Err(AlignError::invalid_audio("no warp path within the band"));
    }

    // Backtrack through the recorded predecessors.
    let mut pairs = Vec::with_capacity(t_r + t_s);
    let (mut i, mut j) = (t_r - 1, t_s - 1);
    pairs.push((i, j));
    while i > 0 || j > 0 {
        if j == 0 {
            i -= 1;
        } else if i == 0 {
            j -= 1;
        } else {
            let idx = row_start[j] + (i - row_lo[j]);
            match ptrs.get(idx) {
                PRED_DIAG => {
                    i -= 1;
                    j -= 1;
                }
                PRED_LEFT => i -= 1,
                PRED_UP => j -= 1,
                _ => return Err(AlignError::invalid_audio("disconnected warp path cell")),
            }
        }
        pairs.push((i, j));
    }
    pairs.reverse();

    Ok(WarpPath { pairs, cost })
}
