use crate::interface::{DeviceId, Segment};
use crate::prelude::{AnalysisConfig, ProcessingStage, StageError, StageResult};
use crate::telemetry::log::LogManager;
use std::collections::BTreeMap;

/// Coalesces segments separated by less than `threshold` seconds into utterances.
///
/// `segments` must be ordered by start; use [`crate::interface::prepare_segments`]
/// at the input boundary.
pub fn merge_segments(segments: &[Segment], threshold: f64) -> Vec<Segment> {
    debug_assert!(
        segments.windows(2).all(|pair| pair[0].start <= pair[1].start),
        "segments must be sorted by start"
    );

    let mut merged = Vec::new();
    let mut current: Option<Segment> = None;

    for segment in segments {
        current = match current {
            Some(mut open) if segment.start - open.end < threshold => {
                open.end = open.end.max(segment.end);
                Some(open)
            }
            Some(open) => {
                merged.push(open);
                Some(*segment)
            }
            None => Some(*segment),
        };
    }
    merged.extend(current);
    merged
}

/// Merges the raw segments of every speaker.
pub struct MergeStage {
    threshold: Option<f64>,
    logger: LogManager,
}

impl MergeStage {
    pub fn new() -> Self {
        Self {
            threshold: None,
            logger: LogManager::new("merge"),
        }
    }
}

impl Default for MergeStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for MergeStage {
    type Input = BTreeMap<DeviceId, Vec<Segment>>;
    type Output = BTreeMap<DeviceId, Vec<Segment>>;

    fn initialize(&mut self, config: &AnalysisConfig) -> StageResult<()> {
        if !config.merge_threshold.is_finite() {
            return Err(StageError::InvalidInput(format!(
                "merge threshold must be finite, got {}",
                config.merge_threshold
            )));
        }
        self.threshold = Some(config.merge_threshold);
        Ok(())
    }

    fn execute(&mut self, input: Self::Input) -> StageResult<Self::Output> {
        let threshold = self
            .threshold
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        let mut merged = BTreeMap::new();
        for (speaker, raw) in input {
            let utterances = merge_segments(&raw, threshold);
            self.logger.record(&format!(
                "speaker {}: {} raw segments -> {} utterances",
                speaker,
                raw.len(),
                utterances.len()
            ));
            merged.insert(speaker, utterances);
        }
        Ok(merged)
    }

    fn cleanup(&mut self) {
        self.threshold = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(bounds: &[(f64, f64)]) -> Vec<Segment> {
        bounds.iter().map(|&(s, e)| Segment::new(s, e)).collect()
    }

    #[test]
    fn close_segments_are_combined() {
        let raw = segs(&[(0.0, 1.0), (1.2, 2.0), (3.0, 4.0), (4.4, 5.0), (9.0, 9.5)]);
        let merged = merge_segments(&raw, 0.5);
        assert_eq!(merged, segs(&[(0.0, 2.0), (3.0, 5.0), (9.0, 9.5)]));
    }

    #[test]
    fn gap_equal_to_threshold_is_kept_apart() {
        let raw = segs(&[(0.0, 1.0), (1.5, 2.0)]);
        assert_eq!(merge_segments(&raw, 0.5).len(), 2);
    }

    #[test]
    fn nested_segment_keeps_later_end() {
        let raw = segs(&[(0.0, 5.0), (1.0, 2.0), (5.2, 6.0)]);
        assert_eq!(merge_segments(&raw, 0.5), segs(&[(0.0, 6.0)]));
    }

    #[test]
    fn absorbed_segment_never_shortens_the_utterance() {
        // the open utterance keeps end 5.0, not the nested segment's 2.0,
        // so the gap to 5.8 is measured from 5.0 and stays apart
        let raw = segs(&[(0.0, 5.0), (1.0, 2.0), (5.8, 6.0)]);
        assert_eq!(merge_segments(&raw, 0.5), segs(&[(0.0, 5.0), (5.8, 6.0)]));
    }

    #[test]
    fn merging_is_idempotent_and_leaves_wide_gaps() {
        let raw = segs(&[
            (0.0, 0.4),
            (0.6, 1.0),
            (1.9, 2.5),
            (2.6, 3.0),
            (4.0, 4.1),
            (4.2, 7.0),
            (8.0, 8.0),
        ]);
        let threshold = 0.8;
        let once = merge_segments(&raw, threshold);
        let twice = merge_segments(&once, threshold);
        assert_eq!(once, twice);
        assert!(once
            .windows(2)
            .all(|pair| pair[1].start - pair[0].end >= threshold));
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(merge_segments(&[], 1.0).is_empty());
    }

    #[test]
    fn stage_merges_every_speaker() {
        let mut stage = MergeStage::new();
        stage
            .initialize(&AnalysisConfig {
                merge_threshold: 1.0,
                ..Default::default()
            })
            .unwrap();

        let input = BTreeMap::from([
            (1, segs(&[(0.0, 1.0), (1.5, 3.0)])),
            (2, segs(&[(0.0, 1.0), (4.0, 5.0)])),
        ]);
        let merged = stage.execute(input).unwrap();
        assert_eq!(merged[&1], segs(&[(0.0, 3.0)]));
        assert_eq!(merged[&2].len(), 2);
        stage.cleanup();
    }
}
