use crate::interface::{DeviceId, FeatureRow, Segment};
use crate::prelude::{AnalysisConfig, ProcessingStage, StageError, StageResult};
use crate::processing::classifier::{speaking_time, BehaviorClassifier};
use crate::processing::formation::FormationMatrix;
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::MetricsRecorder;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Behavioural features that can be requested for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Feature {
    Overlapped,
    Connected,
    SpeakingTime,
    ToOther,
}

impl Feature {
    pub const ALL: [Feature; 4] = [
        Feature::Overlapped,
        Feature::Connected,
        Feature::SpeakingTime,
        Feature::ToOther,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::Overlapped => "overlapped",
            Feature::Connected => "connected",
            Feature::SpeakingTime => "speaking_time",
            Feature::ToOther => "to_other",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|feature| feature.name() == s)
            .ok_or_else(|| StageError::InvalidInput(format!("unknown feature '{}'", s)))
    }
}

/// Requested features, deduplicated, in output column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet {
    features: Vec<Feature>,
}

impl FeatureSet {
    /// Parses feature names, returning the names that were not recognised.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> (Self, Vec<String>) {
        let mut features = Vec::new();
        let mut unknown = Vec::new();
        for name in names {
            match name.as_ref().parse::<Feature>() {
                Ok(feature) => features.push(feature),
                Err(_) => unknown.push(name.as_ref().to_string()),
            }
        }
        features.sort();
        features.dedup();
        (Self { features }, unknown)
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.features.iter().copied()
    }
}

/// Everything the feature stage needs for one session.
#[derive(Debug, Clone)]
pub struct FeatureInput {
    pub session_name: String,
    /// Merged utterances per speaker.
    pub speakers: BTreeMap<DeviceId, Vec<Segment>>,
    /// Formation matrix per reference device.
    pub formations: BTreeMap<DeviceId, FormationMatrix>,
}

/// Classifies every speaker of a session and assembles the feature table.
pub struct FeatureStage {
    config: Option<AnalysisConfig>,
    features: FeatureSet,
    logger: LogManager,
    metrics: MetricsRecorder,
}

impl FeatureStage {
    pub fn new() -> Self {
        Self {
            config: None,
            features: FeatureSet::default(),
            logger: LogManager::new("features"),
            metrics: MetricsRecorder::new(),
        }
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    fn fill(
        &self,
        row: &mut FeatureRow,
        feature: Feature,
        input: &FeatureInput,
        config: &AnalysisConfig,
    ) -> StageResult<()> {
        let speaker = row.device_id;
        match feature {
            Feature::SpeakingTime => {
                row.speaking_time_duration = Some(speaking_time(speaker_segments(input, speaker)));
            }
            Feature::Overlapped => {
                let tally = classifier_for(input, speaker, config)?.overlapped();
                row.overlapped_count = Some(tally.count);
                row.overlapped_duration = Some(tally.duration);
            }
            Feature::Connected => {
                let tally = classifier_for(input, speaker, config)?.connected();
                row.connected_count = Some(tally.count);
                row.connected_duration = Some(tally.duration);
            }
            Feature::ToOther => {
                let tally = classifier_for(input, speaker, config)?.to_other();
                row.to_other_count = Some(tally.count);
                row.to_other_duration = Some(tally.duration);
            }
        }
        Ok(())
    }
}

fn speaker_segments(input: &FeatureInput, speaker: DeviceId) -> &[Segment] {
    input
        .speakers
        .get(&speaker)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn classifier_for<'i>(
    input: &'i FeatureInput,
    speaker: DeviceId,
    config: &AnalysisConfig,
) -> StageResult<BehaviorClassifier<'i>> {
    let matrix = input
        .formations
        .get(&speaker)
        .ok_or(StageError::MissingFormation(speaker))?;
    Ok(BehaviorClassifier {
        segments: speaker_segments(input, speaker),
        speakers: &input.speakers,
        matrix,
        audio_offset: config.audio_offset,
        connected_threshold: config.connected_threshold,
    })
}

impl Default for FeatureStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for FeatureStage {
    type Input = FeatureInput;
    type Output = Vec<FeatureRow>;

    fn initialize(&mut self, config: &AnalysisConfig) -> StageResult<()> {
        let (features, unknown) = FeatureSet::parse(&config.features);
        for name in unknown {
            self.logger.warn(&format!(
                "unexpected feature in requested feature list, received '{}'",
                name
            ));
            self.metrics.record_skipped_feature();
        }
        self.features = features;
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: Self::Input) -> StageResult<Self::Output> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        let mut rows = Vec::with_capacity(input.speakers.len());
        for &speaker in input.speakers.keys() {
            let mut row = FeatureRow::new(input.session_name.as_str(), speaker);
            for feature in self.features.iter() {
                match self.fill(&mut row, feature, &input, config) {
                    Ok(()) => self.metrics.record_computed(),
                    Err(err) => {
                        self.logger.warn(&format!(
                            "speaker {}: skipping {}: {}",
                            speaker, feature, err
                        ));
                        self.metrics.record_failure();
                    }
                }
            }
            rows.push(row);
        }

        self.logger.record(&format!(
            "session {}: {} speakers, features [{}]",
            input.session_name,
            rows.len(),
            self.features
                .iter()
                .map(|f| f.name())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        Ok(rows)
    }

    fn cleanup(&mut self) {
        self.config = None;
        self.features = FeatureSet::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::metrics::MetricsSnapshot;

    fn matrix_in_formation(reference: DeviceId, others: &[DeviceId], until: i64) -> FormationMatrix {
        let mut matrix = FormationMatrix::new(reference);
        for tick in 0..=until {
            for &other in others {
                matrix.insert(tick, other, true);
            }
        }
        matrix
    }

    fn two_speaker_input() -> FeatureInput {
        FeatureInput {
            session_name: "group-1".into(),
            speakers: BTreeMap::from([
                (1, vec![Segment::new(0.0, 5.0)]),
                (2, vec![Segment::new(6.0, 10.0)]),
            ]),
            formations: BTreeMap::from([
                (1, matrix_in_formation(1, &[2], 20)),
                (2, matrix_in_formation(2, &[1], 20)),
            ]),
        }
    }

    #[test]
    fn feature_names_parse_and_report_unknowns() {
        let (set, unknown) = FeatureSet::parse(&["to_other", "overlapped", "laughter", "overlapped"]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Feature::Overlapped, Feature::ToOther]);
        assert_eq!(unknown, vec!["laughter".to_string()]);
        assert!("speaking_time".parse::<Feature>().is_ok());
    }

    #[test]
    fn stage_builds_one_row_per_speaker() {
        let mut stage = FeatureStage::new();
        stage.initialize(&AnalysisConfig::default()).unwrap();

        let rows = stage.execute(two_speaker_input()).unwrap();
        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        assert_eq!(first.session_name, "group-1");
        assert_eq!(first.device_id, 1);
        assert_eq!(first.connected_count, Some(1));
        assert_eq!(first.connected_duration, Some(5.0));
        assert_eq!(first.overlapped_count, Some(0));
        assert_eq!(first.to_other_count, Some(0));
        assert_eq!(first.speaking_time_duration, Some(5.0));

        // the second speaker is shorter, so the reply does not connect back
        let second = &rows[1];
        assert_eq!(second.connected_count, Some(0));
        assert_eq!(second.to_other_count, Some(0));
        assert_eq!(second.speaking_time_duration, Some(4.0));
        stage.cleanup();
    }

    #[test]
    fn unknown_features_are_skipped_not_fatal() {
        let mut stage = FeatureStage::new();
        let config = AnalysisConfig {
            features: vec!["speaking_time".into(), "laughter".into()],
            ..Default::default()
        };
        stage.initialize(&config).unwrap();

        let rows = stage.execute(two_speaker_input()).unwrap();
        assert_eq!(rows[0].speaking_time_duration, Some(5.0));
        assert_eq!(rows[0].overlapped_count, None);
        assert_eq!(stage.metrics().snapshot().skipped_features, 1);
    }

    #[test]
    fn missing_formation_only_affects_that_speaker() {
        let mut stage = FeatureStage::new();
        stage.initialize(&AnalysisConfig::default()).unwrap();

        let mut input = two_speaker_input();
        input.formations.remove(&2);
        let rows = stage.execute(input).unwrap();

        assert_eq!(rows[0].connected_count, Some(1));
        assert_eq!(rows[1].connected_count, None);
        assert_eq!(rows[1].overlapped_count, None);
        assert_eq!(rows[1].to_other_count, None);
        assert_eq!(rows[1].speaking_time_duration, Some(4.0));
        assert_eq!(
            stage.metrics().snapshot(),
            MetricsSnapshot {
                computed: 5,
                failed: 3,
                skipped_features: 0,
            }
        );
    }

    #[test]
    fn execute_before_initialize_fails() {
        let mut stage = FeatureStage::new();
        assert!(matches!(
            stage.execute(two_speaker_input()),
            Err(StageError::Internal(_))
        ));
    }
}
