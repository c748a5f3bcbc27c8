//! Staged execution of one alignment task.

use std::path::Path;

use tracing::{debug, info};

use crate::audio;
use crate::boundary::BoundaryAdjuster;
use crate::config::TaskConfig;
use crate::dtw::DtwAligner;
use crate::errors::{AlignError, AlignResult};
use crate::features::{FeatureMatrix, MfccExtractor};
use crate::syncmap::{build_sync_map, project_anchors, retranslate_with_head};
use crate::synthesis::{AudioDecoder, SpeechSynthesizer};
use crate::vad::{self, VoiceActivityDetector};

use super::cancel::CancelHandle;
use super::task::{ExecutionReport, Task};
use super::temp::TempRegistry;

/// Executes alignment tasks against a fixed configuration and a pair of
/// external collaborators (decoder and synthesizer).
pub struct TaskExecutor {
    config: TaskConfig,
    decoder: Box<dyn AudioDecoder>,
    synthesizer: Box<dyn SpeechSynthesizer>,
}

impl TaskExecutor {
    /// Create an executor; the configuration is validated once, up front.
    pub fn new(
        config: TaskConfig,
        decoder: Box<dyn AudioDecoder>,
        synthesizer: Box<dyn SpeechSynthesizer>,
    ) -> AlignResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            decoder,
            synthesizer,
        })
    }

    /// The executor's configuration.
    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    /// Compute the sync map for `task`.
    ///
    /// On success the map is stored on the task and a report is returned; on
    /// any failure the task is left untouched. Temp files are removed on
    /// every exit path, including cancellation.
    pub fn execute(
        &self,
        task: &mut Task,
        cancel: Option<&CancelHandle>,
    ) -> AlignResult<ExecutionReport> {
        if task.fragments.is_empty() {
            return Err(AlignError::invalid_text("task has no text fragments"));
        }

        let tmp_dir = self.config.paths.tmp_dir();
        std::fs::create_dir_all(&tmp_dir)
            .map_err(|e| AlignError::io_error("creating temp directory", e))?;

        let mut temps = TempRegistry::new();
        let result = self.run_stages(task, &tmp_dir, &mut temps, cancel);
        temps.cleanup();
        result
    }

    fn run_stages(
        &self,
        task: &mut Task,
        tmp_dir: &Path,
        temps: &mut TempRegistry,
        cancel: Option<&CancelHandle>,
    ) -> AlignResult<ExecutionReport> {
        let started_at = chrono::Local::now().to_rfc3339();
        let mut stages = Vec::new();
        let hop_s = self.config.mfcc.hop_s;
        let extractor = MfccExtractor::new(self.config.mfcc.clone());

        // Decode the recording and park it as a temp WAV.
        check_cancel(cancel)?;
        info!(path = %task.audio_path.display(), "decoding audio");
        let mut real_audio = self.decoder.decode(&task.audio_path)?;
        if real_audio.is_empty() || real_audio.sample_rate == 0 {
            return Err(AlignError::invalid_audio("decoder produced no samples"));
        }
        let full_length_s = real_audio.duration_secs();
        let real_wav = temps.create_wav_path(tmp_dir);
        audio::write_wav(&real_wav, &real_audio)?;
        stages.push("decode".to_string());

        // MFCCs of the full recording, kept alive until boundary adjustment.
        check_cancel(cancel)?;
        debug!("extracting MFCCs from the full recording");
        let full_mfcc = extractor.extract(&real_audio)?;
        stages.push("mfcc_full".to_string());

        // Resolve the head/tail and trim the working copy.
        check_cancel(cancel)?;
        let (head_length_s, process_length_s) =
            self.resolve_head_tail(&full_mfcc, full_length_s, hop_s);
        if head_length_s > 0.0 || process_length_s < full_length_s {
            info!(
                head_s = head_length_s,
                process_s = process_length_s,
                "trimming head/tail"
            );
            real_audio.trim(Some(head_length_s), Some(process_length_s));
            audio::write_wav(&real_wav, &real_audio)?;
        }
        stages.push("head_tail".to_string());

        // Synthesize the text and park it as a temp WAV.
        check_cancel(cancel)?;
        info!(fragments = task.fragments.len(), "synthesizing text");
        let (synth_audio, anchors) = self.synthesizer.synthesize(&task.fragments)?;
        if anchors.len() != task.fragments.len() {
            return Err(AlignError::synthesize_failed(format!(
                "synthesizer returned {} anchors for {} fragments",
                anchors.len(),
                task.fragments.len()
            )));
        }
        let synth_wav = temps.create_wav_path(tmp_dir);
        audio::write_wav(&synth_wav, &synth_audio)?;
        stages.push("synthesize".to_string());

        // Warp the trimmed recording onto the synthetic timeline.
        check_cancel(cancel)?;
        debug!("extracting MFCCs for alignment");
        let real_mfcc = extractor.extract(&real_audio)?;
        let synth_mfcc = extractor.extract(&synth_audio)?;
        drop(real_audio);
        drop(synth_audio);
        info!(
            real_frames = real_mfcc.n_frames(),
            synth_frames = synth_mfcc.n_frames(),
            "computing DTW path"
        );
        let aligner = DtwAligner::new(&self.config.dtw, hop_s);
        let mapping = aligner.align(&real_mfcc, &synth_mfcc, cancel)?;
        drop(real_mfcc);
        drop(synth_mfcc);
        stages.push("dtw".to_string());

        // Project anchors onto the real timeline.
        check_cancel(cancel)?;
        let intervals = project_anchors(&mapping, &anchors, &task.fragments)?;
        stages.push("project".to_string());

        // Back onto the full timeline, with HEAD and TAIL entries.
        let translated = retranslate_with_head(intervals, head_length_s, full_length_s);
        stages.push("retranslate".to_string());

        // Refine boundaries against the full-audio VAD.
        check_cancel(cancel)?;
        let policy = self.config.boundary.policy()?;
        let adjusted = if policy.is_noop() {
            translated
        } else {
            debug!(?policy, "adjusting boundaries");
            let segments =
                VoiceActivityDetector::new(self.config.vad.clone()).detect(&full_mfcc, hop_s);
            BoundaryAdjuster::new(policy, &segments).adjust(translated)
        };
        drop(full_mfcc);
        stages.push("adjust".to_string());

        // Assemble the final map.
        check_cancel(cancel)?;
        let sync_map = build_sync_map(
            adjusted,
            &task.fragments,
            self.config.output.head_tail_format,
        )?;
        info!(fragments = sync_map.len(), "sync map computed");
        task.sync_map = Some(sync_map);
        stages.push("syncmap".to_string());

        Ok(ExecutionReport {
            started_at,
            audio_length_s: full_length_s,
            head_length_s,
            process_length_s,
            stages_completed: stages,
        })
    }

    /// Resolve the head and process lengths.
    ///
    /// Explicit configuration wins; otherwise configured detection bounds
    /// drive a VAD pass; otherwise the whole recording is processed.
    fn resolve_head_tail(
        &self,
        full_mfcc: &FeatureMatrix,
        full_length_s: f64,
        hop_s: f64,
    ) -> (f64, f64) {
        let audio_cfg = &self.config.audio;

        if audio_cfg.is_explicit() {
            let head = audio_cfg.head_length.unwrap_or(0.0).clamp(0.0, full_length_s);
            let process = audio_cfg
                .process_length
                .unwrap_or(full_length_s - head)
                .clamp(0.0, full_length_s - head);
            return (head, process);
        }

        if !audio_cfg.wants_head_detection() && !audio_cfg.wants_tail_detection() {
            return (0.0, full_length_s);
        }

        let segments =
            VoiceActivityDetector::new(self.config.vad.clone()).detect(full_mfcc, hop_s);

        let head = if audio_cfg.wants_head_detection() {
            vad::detect_head(
                &segments.speech,
                audio_cfg.detect_head_min.unwrap_or(vad::DEFAULT_MIN_HEAD_S),
                audio_cfg.detect_head_max.unwrap_or(vad::DEFAULT_MAX_HEAD_S),
            )
        } else {
            0.0
        };
        let tail = if audio_cfg.wants_tail_detection() {
            vad::detect_tail(
                &segments.speech,
                full_length_s,
                audio_cfg.detect_tail_min.unwrap_or(vad::DEFAULT_MIN_TAIL_S),
                audio_cfg.detect_tail_max.unwrap_or(vad::DEFAULT_MAX_TAIL_S),
            )
        } else {
            0.0
        };
        debug!(head_s = head, tail_s = tail, "detected head/tail");

        let head = head.clamp(0.0, full_length_s);
        let process = (full_length_s - head - tail).max(0.0);
        (head, process)
    }
}

fn check_cancel(cancel: Option<&CancelHandle>) -> AlignResult<()> {
    if cancel.is_some_and(|c| c.is_cancelled()) {
        return Err(AlignError::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    use crate::audio::AudioBuffer;
    use crate::config::{BoundaryAlgorithm, TaskConfig};
    use crate::syncmap::HeadTailFormat;
    use crate::synthesis::SynthAnchor;
    use crate::text::TextFragment;

    const RATE: u32 = 16000;

    /// Speech-like test signal: pitch wobble plus gentle amplitude
    /// modulation, so frame content varies over time but every frame stays
    /// well above the VAD threshold.
    fn speech_signal(duration_s: f64) -> Vec<f32> {
        let n = (duration_s * RATE as f64) as usize;
        (0..n)
            .map(|i| {
                let t = i as f64 / RATE as f64;
                let f0 = 170.0 + 30.0 * (2.0 * PI * 0.5 * t).sin();
                let env = 0.6 + 0.3 * (2.0 * PI * 1.3 * t).sin();
                let carrier = (2.0 * PI * f0 * t).sin()
                    + 0.5 * (2.0 * PI * 2.0 * f0 * t).sin()
                    + 0.25 * (2.0 * PI * 3.0 * f0 * t).sin();
                (0.5 * env * carrier) as f32
            })
            .collect()
    }

    struct BufferDecoder {
        buffer: AudioBuffer,
    }

    impl AudioDecoder for BufferDecoder {
        fn decode(&self, _path: &Path) -> AlignResult<AudioBuffer> {
            Ok(self.buffer.clone())
        }
    }

    struct CannedSynthesizer {
        buffer: AudioBuffer,
        anchors: Vec<SynthAnchor>,
    }

    impl SpeechSynthesizer for CannedSynthesizer {
        fn synthesize(
            &self,
            _fragments: &[TextFragment],
        ) -> AlignResult<(AudioBuffer, Vec<SynthAnchor>)> {
            Ok((self.buffer.clone(), self.anchors.clone()))
        }
    }

    struct FailingSynthesizer;

    impl SpeechSynthesizer for FailingSynthesizer {
        fn synthesize(
            &self,
            _fragments: &[TextFragment],
        ) -> AlignResult<(AudioBuffer, Vec<SynthAnchor>)> {
            Err(AlignError::synthesize_failed("engine unavailable"))
        }
    }

    fn fragments(ids: &[&str]) -> Vec<TextFragment> {
        ids.iter()
            .map(|id| TextFragment::new(*id, "en", vec![id.to_string()]))
            .collect()
    }

    fn config_with_tmp(dir: &Path) -> TaskConfig {
        let mut config = TaskConfig::default();
        config.paths.tmp_dir = Some(dir.to_path_buf());
        config
    }

    fn temp_file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn identity_audio_recovers_anchor_times() {
        let dir = tempfile::tempdir().unwrap();
        let signal = speech_signal(3.0);
        let executor = TaskExecutor::new(
            config_with_tmp(dir.path()),
            Box::new(BufferDecoder {
                buffer: AudioBuffer::new(signal.clone(), RATE),
            }),
            Box::new(CannedSynthesizer {
                buffer: AudioBuffer::new(signal, RATE),
                anchors: vec![
                    SynthAnchor::new(0.0, "aa"),
                    SynthAnchor::new(1.0, "bb"),
                    SynthAnchor::new(2.0, "cc"),
                ],
            }),
        )
        .unwrap();

        let mut task = Task::new("real.wav", fragments(&["aa", "bb", "cc"]));
        let report = executor.execute(&mut task, None).unwrap();

        let map = task.sync_map.as_ref().unwrap();
        // ADD format: HEAD + 3 fragments + TAIL.
        assert_eq!(map.len(), 5);

        let expected_starts = [0.0, 1.0, 2.0];
        for (frag, expected) in map.fragments()[1..4].iter().zip(expected_starts) {
            assert!(
                (frag.start_s - expected).abs() <= 0.1,
                "fragment {} starts at {}, expected ~{}",
                frag.fragment.id,
                frag.start_s,
                expected
            );
        }

        // Full coverage and contiguity.
        assert!((map.fragments()[0].start_s - 0.0).abs() < 1e-9);
        assert!((map.fragments()[4].end_s - 3.0).abs() < 1e-9);
        for pair in map.fragments().windows(2) {
            assert!((pair[0].end_s - pair[1].start_s).abs() < 1e-9);
            assert!(pair[1].end_s >= pair[0].end_s);
        }

        assert!((report.audio_length_s - 3.0).abs() < 1e-9);
        assert_eq!(report.stages_completed.len(), 9);
        assert_eq!(temp_file_count(dir.path()), 0);
    }

    #[test]
    fn silence_head_is_detected_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut real = vec![0.0f32; 2 * RATE as usize];
        real.extend(speech_signal(2.0));

        let mut config = config_with_tmp(dir.path());
        config.audio.detect_head_min = Some(0.5);
        config.audio.detect_head_max = Some(5.0);

        let executor = TaskExecutor::new(
            config,
            Box::new(BufferDecoder {
                buffer: AudioBuffer::new(real, RATE),
            }),
            Box::new(CannedSynthesizer {
                buffer: AudioBuffer::new(speech_signal(2.0), RATE),
                anchors: vec![SynthAnchor::new(0.0, "f1")],
            }),
        )
        .unwrap();

        let mut task = Task::new("real.wav", fragments(&["f1"]));
        let report = executor.execute(&mut task, None).unwrap();

        assert!(
            report.head_length_s >= 1.9 && report.head_length_s <= 2.1,
            "detected head {} outside [1.9, 2.1]",
            report.head_length_s
        );

        let map = task.sync_map.as_ref().unwrap();
        // First text fragment starts at or after the detected head.
        assert!(map.fragments()[1].start_s >= 1.9);
        assert_eq!(temp_file_count(dir.path()), 0);
    }

    #[test]
    fn stretch_covers_the_full_recording_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_with_tmp(dir.path());
        config.audio.head_length = Some(0.3);
        config.audio.process_length = Some(9.5);
        config.output.head_tail_format = HeadTailFormat::Stretch;

        let executor = TaskExecutor::new(
            config,
            Box::new(BufferDecoder {
                buffer: AudioBuffer::new(speech_signal(10.0), RATE),
            }),
            Box::new(CannedSynthesizer {
                buffer: AudioBuffer::new(speech_signal(9.5), RATE),
                anchors: vec![SynthAnchor::new(0.0, "a"), SynthAnchor::new(4.75, "b")],
            }),
        )
        .unwrap();

        let mut task = Task::new("real.wav", fragments(&["a", "b"]));
        let report = executor.execute(&mut task, None).unwrap();

        assert!((report.head_length_s - 0.3).abs() < 1e-9);
        assert!((report.process_length_s - 9.5).abs() < 1e-9);

        let map = task.sync_map.as_ref().unwrap();
        assert_eq!(map.len(), 2);
        assert!((map.fragments()[0].start_s - 0.0).abs() < 1e-9);
        assert!((map.fragments()[1].end_s - 10.0).abs() < 1e-9);
    }

    #[test]
    fn cancellation_leaves_no_temps_and_no_sync_map() {
        let dir = tempfile::tempdir().unwrap();
        let signal = speech_signal(1.0);
        let executor = TaskExecutor::new(
            config_with_tmp(dir.path()),
            Box::new(BufferDecoder {
                buffer: AudioBuffer::new(signal.clone(), RATE),
            }),
            Box::new(CannedSynthesizer {
                buffer: AudioBuffer::new(signal, RATE),
                anchors: vec![SynthAnchor::new(0.0, "f1")],
            }),
        )
        .unwrap();

        let handle = CancelHandle::new();
        handle.cancel();

        let mut task = Task::new("real.wav", fragments(&["f1"]));
        let result = executor.execute(&mut task, Some(&handle));

        assert!(matches!(result, Err(AlignError::Cancelled)));
        assert!(task.sync_map.is_none());
        assert_eq!(temp_file_count(dir.path()), 0);
    }

    #[test]
    fn synthesizer_failure_cleans_temps_and_keeps_task_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let executor = TaskExecutor::new(
            config_with_tmp(dir.path()),
            Box::new(BufferDecoder {
                buffer: AudioBuffer::new(speech_signal(1.0), RATE),
            }),
            Box::new(FailingSynthesizer),
        )
        .unwrap();

        let mut task = Task::new("real.wav", fragments(&["f1"]));
        let result = executor.execute(&mut task, None);

        assert!(matches!(result, Err(AlignError::SynthesizeFailed(_))));
        assert!(task.sync_map.is_none());
        assert_eq!(temp_file_count(dir.path()), 0);
    }

    #[test]
    fn anchor_count_mismatch_is_a_synthesis_failure() {
        let dir = tempfile::tempdir().unwrap();
        let signal = speech_signal(1.0);
        let executor = TaskExecutor::new(
            config_with_tmp(dir.path()),
            Box::new(BufferDecoder {
                buffer: AudioBuffer::new(signal.clone(), RATE),
            }),
            Box::new(CannedSynthesizer {
                buffer: AudioBuffer::new(signal, RATE),
                anchors: vec![],
            }),
        )
        .unwrap();

        let mut task = Task::new("real.wav", fragments(&["f1"]));
        assert!(matches!(
            executor.execute(&mut task, None),
            Err(AlignError::SynthesizeFailed(_))
        ));
        assert_eq!(temp_file_count(dir.path()), 0);
    }

    #[test]
    fn empty_fragment_list_is_invalid_text() {
        let dir = tempfile::tempdir().unwrap();
        let signal = speech_signal(1.0);
        let executor = TaskExecutor::new(
            config_with_tmp(dir.path()),
            Box::new(BufferDecoder {
                buffer: AudioBuffer::new(signal.clone(), RATE),
            }),
            Box::new(CannedSynthesizer {
                buffer: AudioBuffer::new(signal, RATE),
                anchors: vec![],
            }),
        )
        .unwrap();

        let mut task = Task::new("real.wav", vec![]);
        assert!(matches!(
            executor.execute(&mut task, None),
            Err(AlignError::InvalidText(_))
        ));
    }

    #[test]
    fn noop_boundary_policies_still_produce_a_map() {
        let dir = tempfile::tempdir().unwrap();
        let signal = speech_signal(2.0);
        let mut config = config_with_tmp(dir.path());
        config.boundary.algorithm = BoundaryAlgorithm::Auto;

        let executor = TaskExecutor::new(
            config,
            Box::new(BufferDecoder {
                buffer: AudioBuffer::new(signal.clone(), RATE),
            }),
            Box::new(CannedSynthesizer {
                buffer: AudioBuffer::new(signal, RATE),
                anchors: vec![SynthAnchor::new(0.0, "a"), SynthAnchor::new(1.0, "b")],
            }),
        )
        .unwrap();

        let mut task = Task::new("real.wav", fragments(&["a", "b"]));
        executor.execute(&mut task, None).unwrap();
        assert_eq!(task.sync_map.as_ref().unwrap().len(), 4);
    }
}
