//! Head/tail silence estimation from VAD speech intervals.
//!
//! Pure functions: given the speech set of the full recording, estimate how
//! much leading/trailing audio carries no fragment text.

use super::Interval;

/// Default lower bound for head detection, in seconds.
pub const DEFAULT_MIN_HEAD_S: f64 = 0.0;
/// Default upper bound for head detection, in seconds.
pub const DEFAULT_MAX_HEAD_S: f64 = 10.0;
/// Default lower bound for tail detection, in seconds.
pub const DEFAULT_MIN_TAIL_S: f64 = 0.0;
/// Default upper bound for tail detection, in seconds.
pub const DEFAULT_MAX_TAIL_S: f64 = 10.0;

/// Estimate the head silence length.
///
/// Returns the start of the first speech interval whose start lies in
/// `[min_head, max_head]`, or `min_head` if there is none.
pub fn detect_head(speech: &[Interval], min_head: f64, max_head: f64) -> f64 {
    speech
        .iter()
        .find(|iv| iv.start >= min_head && iv.start <= max_head)
        .map(|iv| iv.start)
        .unwrap_or(min_head)
}

/// Estimate the tail silence length, symmetric to [`detect_head`].
///
/// Returns `duration − end` for the last speech interval whose end lies in
/// `[duration − max_tail, duration − min_tail]`, or `min_tail` if none does.
pub fn detect_tail(speech: &[Interval], duration: f64, min_tail: f64, max_tail: f64) -> f64 {
    speech
        .iter()
        .rev()
        .find(|iv| iv.end >= duration - max_tail && iv.end <= duration - min_tail)
        .map(|iv| duration - iv.end)
        .unwrap_or(min_tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_is_first_speech_start_in_range() {
        let speech = vec![Interval::new(2.0, 5.0), Interval::new(6.0, 8.0)];
        assert!((detect_head(&speech, 0.5, 5.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn head_falls_back_to_minimum() {
        // First speech starts before the search range.
        let speech = vec![Interval::new(0.1, 5.0)];
        assert!((detect_head(&speech, 0.5, 5.0) - 0.5).abs() < 1e-9);

        // No speech at all.
        assert!((detect_head(&[], 0.5, 5.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn tail_is_measured_from_the_end() {
        let speech = vec![Interval::new(1.0, 4.0), Interval::new(5.0, 8.5)];
        // Last speech ends at 8.5 on a 10 s file: tail of 1.5 s.
        assert!((detect_tail(&speech, 10.0, 0.0, 5.0) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn tail_falls_back_to_minimum() {
        let speech = vec![Interval::new(1.0, 2.0)];
        // 8 s of trailing silence is outside a 5 s search range.
        assert!((detect_tail(&speech, 10.0, 0.3, 5.0) - 0.3).abs() < 1e-9);
    }
}
