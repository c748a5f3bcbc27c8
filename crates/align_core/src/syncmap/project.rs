//! Projection of synthetic anchors onto the real timeline.

use crate::dtw::WaveMapping;
use crate::errors::{AlignError, AlignResult};
use crate::synthesis::SynthAnchor;
use crate::text::TextFragment;

use super::TimedInterval;

/// Project per-fragment synthetic anchors to real times via the DTW mapping.
///
/// For each anchor, the mapping row with the synthetic time closest to the
/// anchor (ties: smallest index) supplies the fragment's real start; the
/// real time of the last row closes the final fragment. Returns one interval
/// per fragment, contiguous and with non-decreasing starts.
pub fn project_anchors(
    mapping: &WaveMapping,
    anchors: &[SynthAnchor],
    fragments: &[TextFragment],
) -> AlignResult<Vec<TimedInterval>> {
    if mapping.is_empty() {
        return Err(AlignError::invalid_audio("empty DTW mapping"));
    }
    if anchors.len() != fragments.len() {
        return Err(AlignError::invalid_text(format!(
            "{} anchors for {} fragments",
            anchors.len(),
            fragments.len()
        )));
    }

    let rows = mapping.frames();
    let mut starts = Vec::with_capacity(anchors.len());
    let mut idx = 0usize;
    for anchor in anchors {
        // Anchors are non-decreasing and synth times strictly increase, so
        // the argmin can only move forward. Strict improvement keeps the
        // smallest index on ties.
        while idx + 1 < rows.len()
            && (rows[idx + 1].synth_s - anchor.time_s).abs()
                < (rows[idx].synth_s - anchor.time_s).abs()
        {
            idx += 1;
        }
        starts.push(rows[idx].real_s);
    }

    let mut intervals = Vec::with_capacity(fragments.len());
    for (k, fragment) in fragments.iter().enumerate() {
        let start = starts[k];
        let end = starts.get(k + 1).copied().unwrap_or(mapping.last_real_s());
        intervals.push(TimedInterval::text(start, end, fragment.clone()));
    }

    Ok(intervals)
}

/// Shift a trimmed-timeline interval map back onto the full timeline.
///
/// All starts/ends move by `head_s`; a HEAD interval `[0, head_s]` is
/// prepended and a TAIL interval up to `full_length_s` is appended.
pub fn retranslate_with_head(
    intervals: Vec<TimedInterval>,
    head_s: f64,
    full_length_s: f64,
) -> Vec<TimedInterval> {
    let mut translated = Vec::with_capacity(intervals.len() + 2);
    translated.push(TimedInterval::untexted(0.0, head_s));

    let mut last_end = head_s;
    for interval in intervals {
        let start = interval.start + head_s;
        let end = interval.end + head_s;
        last_end = end;
        translated.push(TimedInterval {
            start,
            end,
            fragment: interval.fragment,
        });
    }

    translated.push(TimedInterval::untexted(last_end, full_length_s));
    translated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtw::{DtwAligner, DtwConfig};
    use crate::features::FeatureMatrix;

    const HOP: f64 = 0.040;

    fn fragment(id: &str) -> TextFragment {
        TextFragment::new(id, "en", vec![id.to_string()])
    }

    fn identity_mapping(n: usize) -> WaveMapping {
        // Align a sequence against itself to get the diagonal mapping.
        let frames = (0..n)
            .map(|i| vec![(i as f64 * 0.37).sin() + 1.5, (i as f64 * 0.11).cos()])
            .collect();
        let m = FeatureMatrix::from_frames(frames);
        DtwAligner::new(&DtwConfig::default(), HOP)
            .align(&m, &m, None)
            .unwrap()
    }

    #[test]
    fn identity_projection_returns_anchor_times() {
        let mapping = identity_mapping(76); // 3 s at 40 ms hop
        let anchors = vec![
            SynthAnchor::new(0.0, "a"),
            SynthAnchor::new(1.0, "b"),
            SynthAnchor::new(2.0, "c"),
        ];
        let fragments = vec![fragment("a"), fragment("b"), fragment("c")];

        let intervals = project_anchors(&mapping, &anchors, &fragments).unwrap();

        assert_eq!(intervals.len(), 3);
        for (interval, anchor) in intervals.iter().zip(&anchors) {
            assert!((interval.start - anchor.time_s).abs() <= HOP);
        }
        // Contiguous, and the last interval closes at the mapping end.
        assert!((intervals[0].end - intervals[1].start).abs() < 1e-9);
        assert!((intervals[2].end - mapping.last_real_s()).abs() < 1e-9);
    }

    #[test]
    fn durations_sum_to_mapped_span() {
        let mapping = identity_mapping(50);
        let anchors = vec![SynthAnchor::new(0.0, "a"), SynthAnchor::new(0.8, "b")];
        let fragments = vec![fragment("a"), fragment("b")];

        let intervals = project_anchors(&mapping, &anchors, &fragments).unwrap();
        let total: f64 = intervals.iter().map(|iv| iv.duration()).sum();
        assert!((total - (mapping.last_real_s() - mapping.first_real_s())).abs() < 1e-9);
    }

    #[test]
    fn anchor_count_mismatch_is_invalid_text() {
        let mapping = identity_mapping(10);
        let anchors = vec![SynthAnchor::new(0.0, "a")];
        let fragments = vec![fragment("a"), fragment("b")];

        assert!(matches!(
            project_anchors(&mapping, &anchors, &fragments),
            Err(AlignError::InvalidText(_))
        ));
    }

    #[test]
    fn retranslation_adds_head_and_tail() {
        let intervals = vec![
            TimedInterval::text(0.0, 1.0, fragment("a")),
            TimedInterval::text(1.0, 2.5, fragment("b")),
        ];
        let translated = retranslate_with_head(intervals, 0.5, 4.0);

        assert_eq!(translated.len(), 4);
        assert!(!translated[0].is_text());
        assert!((translated[0].end - 0.5).abs() < 1e-9);
        assert!((translated[1].start - 0.5).abs() < 1e-9);
        assert!((translated[2].end - 3.0).abs() < 1e-9);
        assert!(!translated[3].is_text());
        assert!((translated[3].start - 3.0).abs() < 1e-9);
        assert!((translated[3].end - 4.0).abs() < 1e-9);
    }
}
