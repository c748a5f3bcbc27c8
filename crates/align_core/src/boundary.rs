//! Boundary adjustment between consecutive sync-map fragments.
//!
//! Policies move only the interior boundaries between two text fragments;
//! the HEAD and TAIL boundaries are fixed. A policy that cannot be applied
//! at a given boundary (no usable non-speech interval) leaves that boundary
//! unchanged.

use tracing::{debug, warn};

use crate::syncmap::TimedInterval;
use crate::vad::{find_containing, VadSegments};

/// Guard margin so an adjusted boundary never collapses an interval.
const EPSILON_S: f64 = 0.001;

/// Iteration cap for [`BoundaryPolicy::RateAggressive`].
const MAX_RATE_PASSES: usize = 10;

/// Boundary adjustment policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryPolicy {
    /// Leave all boundaries unchanged.
    None,
    /// Documented no-op, kept distinct from `None` for configuration parity.
    Auto,
    /// Place the boundary `δ` seconds after the current fragment's speech
    /// ends, inside the containing non-speech interval.
    AfterCurrent(f64),
    /// Place the boundary `δ` seconds before the next fragment's speech
    /// starts, inside the containing non-speech interval.
    BeforeNext(f64),
    /// Shift the boundary by `δ` seconds, clamped to the neighbors.
    Offset(f64),
    /// Place the boundary at the given percentage of the containing
    /// non-speech interval.
    Percent(f64),
    /// Extend fragments spoken faster than `r` chars/second into following
    /// non-speech.
    Rate(f64),
    /// Like `Rate`, but may also borrow time from slower successors.
    RateAggressive(f64),
}

impl BoundaryPolicy {
    /// Check whether the policy never moves a boundary.
    pub fn is_noop(&self) -> bool {
        matches!(self, BoundaryPolicy::None | BoundaryPolicy::Auto)
    }
}

/// Adjusts interior fragment boundaries against the VAD segmentation.
pub struct BoundaryAdjuster<'a> {
    policy: BoundaryPolicy,
    segments: &'a VadSegments,
}

impl<'a> BoundaryAdjuster<'a> {
    /// Create an adjuster for the given policy and VAD segmentation of the
    /// full audio.
    pub fn new(policy: BoundaryPolicy, segments: &'a VadSegments) -> Self {
        Self { policy, segments }
    }

    /// Apply the policy to an interval map (HEAD + fragments + TAIL).
    ///
    /// Order, contiguity, and total coverage are preserved.
    pub fn adjust(&self, mut map: Vec<TimedInterval>) -> Vec<TimedInterval> {
        match self.policy {
            BoundaryPolicy::None | BoundaryPolicy::Auto => map,
            BoundaryPolicy::Offset(delta) => {
                self.each_interior_boundary(&mut map, |b, left, right| {
                    Some((b + delta).clamp(left + EPSILON_S, right - EPSILON_S))
                });
                map
            }
            BoundaryPolicy::AfterCurrent(delta) => {
                self.adjust_in_gap(&mut map, |ns| ns.start + delta);
                map
            }
            BoundaryPolicy::BeforeNext(delta) => {
                self.adjust_in_gap(&mut map, |ns| ns.end - delta);
                map
            }
            BoundaryPolicy::Percent(percent) => {
                let frac = percent.clamp(0.0, 100.0) / 100.0;
                self.adjust_in_gap(&mut map, |ns| ns.start + frac * ns.duration());
                map
            }
            BoundaryPolicy::Rate(rate) => {
                self.adjust_rate(&mut map, rate, false);
                map
            }
            BoundaryPolicy::RateAggressive(rate) => {
                self.adjust_rate(&mut map, rate, true);
                map
            }
        }
    }

    /// Visit every interior text-to-text boundary, left to right.
    ///
    /// The callback receives the boundary time and the enclosing limits
    /// (start of the left fragment, end of the right fragment) and returns
    /// the new boundary, or `None` to keep it.
    fn each_interior_boundary<F>(&self, map: &mut [TimedInterval], mut f: F)
    where
        F: FnMut(f64, f64, f64) -> Option<f64>,
    {
        for i in 1..map.len().saturating_sub(2) {
            if !map[i].is_text() || !map[i + 1].is_text() {
                continue;
            }
            let b = map[i].end;
            let left = map[i].start;
            let right = map[i + 1].end;
            if right - left < 2.0 * EPSILON_S {
                continue;
            }
            if let Some(new_b) = f(b, left, right) {
                let new_b = new_b.clamp(left + EPSILON_S, right - EPSILON_S);
                map[i].end = new_b;
                map[i + 1].start = new_b;
            }
        }
    }

    /// Apply a placement rule inside the non-speech interval containing each
    /// boundary; boundaries outside non-speech stay put.
    fn adjust_in_gap<F>(&self, map: &mut [TimedInterval], rule: F)
    where
        F: Fn(&crate::vad::Interval) -> f64,
    {
        let nonspeech = &self.segments.nonspeech;
        self.each_interior_boundary(map, |b, _left, _right| {
            match find_containing(nonspeech, b) {
                Some(ns) => Some(rule(ns).clamp(ns.start, ns.end)),
                None => {
                    warn!(boundary_s = b, "no non-speech interval at boundary, leaving unchanged");
                    None
                }
            }
        });
    }

    /// Extend hurried fragments (chars/second above `rate`) to the right.
    fn adjust_rate(&self, map: &mut [TimedInterval], rate: f64, aggressive: bool) {
        if rate <= 0.0 {
            warn!(rate, "non-positive rate threshold, leaving boundaries unchanged");
            return;
        }

        let mut passes_left = if aggressive { MAX_RATE_PASSES } else { 1 };
        loop {
            let mut changed = false;

            for i in 1..map.len().saturating_sub(2) {
                if !map[i].is_text() || !map[i + 1].is_text() {
                    continue;
                }
                let chars = map[i]
                    .fragment
                    .as_ref()
                    .map(|f| f.char_count() as f64)
                    .unwrap_or(0.0);
                if chars == 0.0 {
                    continue;
                }

                let duration = map[i].duration();
                if duration > 0.0 && chars / duration <= rate {
                    continue;
                }
                let needed = chars / rate - duration;

                let b = map[i].end;
                let mut new_b = b;

                // First consume the non-speech gap at the boundary.
                if let Some(ns) = find_containing(&self.segments.nonspeech, b) {
                    new_b = (b + needed).min(ns.end);
                }

                // Then, aggressively, borrow surplus from a slow successor.
                if aggressive && new_b - b < needed {
                    if let Some(succ) = &map[i + 1].fragment {
                        let succ_chars = succ.char_count() as f64;
                        let succ_duration = map[i + 1].end - new_b;
                        let surplus = succ_duration - succ_chars / rate;
                        if surplus > 0.0 {
                            let remaining = needed - (new_b - b);
                            new_b += remaining.min(surplus);
                        }
                    }
                }

                let new_b = new_b.min(map[i + 1].end - EPSILON_S);
                if new_b > b + 1e-9 {
                    debug!(
                        fragment = map[i].fragment.as_ref().map(|f| f.id.as_str()),
                        old_end = b,
                        new_end = new_b,
                        "extending hurried fragment"
                    );
                    map[i].end = new_b;
                    map[i + 1].start = new_b;
                    changed = true;
                }
            }

            passes_left -= 1;
            if !changed || passes_left == 0 {
                break;
            }
        }
    }
}
