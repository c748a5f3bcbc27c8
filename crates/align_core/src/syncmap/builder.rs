//! Final sync-map assembly from the adjusted interval map.

use serde::{Deserialize, Serialize};

use crate::errors::{AlignError, AlignResult};
use crate::text::TextFragment;

use super::{SyncMap, SyncMapFragment, TimedInterval};

/// How HEAD/TAIL audio is represented in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HeadTailFormat {
    /// Emit HEAD and TAIL as explicit fragments with empty text.
    #[default]
    Add,
    /// Drop HEAD/TAIL and stretch the first/last fragment to cover them.
    Stretch,
    /// Drop HEAD/TAIL and leave the remaining intervals unchanged.
    Hidden,
}

impl std::fmt::Display for HeadTailFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeadTailFormat::Add => write!(f, "ADD"),
            HeadTailFormat::Stretch => write!(f, "STRETCH"),
            HeadTailFormat::Hidden => write!(f, "HIDDEN"),
        }
    }
}

/// Assemble the final sync map from an adjusted interval map.
///
/// `adjusted` must hold exactly HEAD + one interval per fragment + TAIL.
pub fn build_sync_map(
    adjusted: Vec<TimedInterval>,
    fragments: &[TextFragment],
    format: HeadTailFormat,
) -> AlignResult<SyncMap> {
    if adjusted.len() != fragments.len() + 2 {
        return Err(AlignError::invalid_text(format!(
            "interval map has {} entries for {} fragments",
            adjusted.len(),
            fragments.len()
        )));
    }

    let head = &adjusted[0];
    let tail = &adjusted[adjusted.len() - 1];
    let language = fragments
        .first()
        .map(|f| f.language.clone())
        .unwrap_or_default();

    let mut map = SyncMap::new();

    if format == HeadTailFormat::Add {
        let head_frag = TextFragment::new("HEAD", language.clone(), vec![String::new()]);
        map.append(SyncMapFragment::new(head_frag, head.start, head.end));
    }

    for (k, fragment) in fragments.iter().enumerate() {
        let interval = &adjusted[k + 1];
        let mut start = interval.start;
        let mut end = interval.end;
        if format == HeadTailFormat::Stretch {
            if k == 0 {
                start = head.start;
            }
            if k == fragments.len() - 1 {
                end = tail.end;
            }
        }
        map.append(SyncMapFragment::new(fragment.clone(), start, end));
    }

    if format == HeadTailFormat::Add {
        let tail_frag = TextFragment::new("TAIL", language, vec![String::new()]);
        map.append(SyncMapFragment::new(tail_frag, tail.start, tail.end));
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(id: &str) -> TextFragment {
        TextFragment::new(id, "en", vec![id.to_string()])
    }

    fn adjusted_map() -> (Vec<TimedInterval>, Vec<TextFragment>) {
        let fragments = vec![fragment("a"), fragment("b")];
        let adjusted = vec![
            TimedInterval::untexted(0.0, 0.3),
            TimedInterval::text(0.3, 1.2, fragments[0].clone()),
            TimedInterval::text(1.2, 2.8, fragments[1].clone()),
            TimedInterval::untexted(2.8, 3.0),
        ];
        (adjusted, fragments)
    }

    #[test]
    fn add_emits_head_and_tail_fragments() {
        let (adjusted, fragments) = adjusted_map();
        let map = build_sync_map(adjusted, &fragments, HeadTailFormat::Add).unwrap();

        assert_eq!(map.len(), 4);
        assert_eq!(map.fragments()[0].fragment.id, "HEAD");
        assert_eq!(map.fragments()[3].fragment.id, "TAIL");
        // Full coverage, contiguous.
        assert!((map.fragments()[0].start_s - 0.0).abs() < 1e-9);
        assert!((map.fragments()[3].end_s - 3.0).abs() < 1e-9);
        for pair in map.fragments().windows(2) {
            assert!((pair[0].end_s - pair[1].start_s).abs() < 1e-9);
        }
    }

    #[test]
    fn stretch_extends_first_and_last_fragments() {
        let (adjusted, fragments) = adjusted_map();
        let map = build_sync_map(adjusted, &fragments, HeadTailFormat::Stretch).unwrap();

        assert_eq!(map.len(), 2);
        assert!((map.fragments()[0].start_s - 0.0).abs() < 1e-9);
        assert!((map.fragments()[1].end_s - 3.0).abs() < 1e-9);
    }

    #[test]
    fn hidden_keeps_fragment_timings() {
        let (adjusted, fragments) = adjusted_map();
        let map = build_sync_map(adjusted, &fragments, HeadTailFormat::Hidden).unwrap();

        assert_eq!(map.len(), 2);
        assert!((map.fragments()[0].start_s - 0.3).abs() < 1e-9);
        assert!((map.fragments()[1].end_s - 2.8).abs() < 1e-9);
    }

    #[test]
    fn entry_count_mismatch_is_rejected() {
        let (mut adjusted, fragments) = adjusted_map();
        adjusted.pop();

        assert!(matches!(
            build_sync_map(adjusted, &fragments, HeadTailFormat::Add),
            Err(AlignError::InvalidText(_))
        ));
    }

    #[test]
    fn format_parses_from_config_strings() {
        let fmt: HeadTailFormat = serde_json::from_str("\"STRETCH\"").unwrap();
        assert_eq!(fmt, HeadTailFormat::Stretch);
        assert_eq!(fmt.to_string(), "STRETCH");
    }
}
