use anyhow::Context;
use fformcore::interface::{
    prepare_segments, DeviceId, FeatureRow, PositionRecord, Segment, Trajectory,
};
use fformcore::processing::{
    FeatureInput, FeatureStage, FormationMatrix, FormationStage, InterpolationStage, MergeStage,
};
use fformcore::telemetry::MetricsSnapshot;
use fformcore::{AnalysisConfig, ProcessingStage};
use std::collections::BTreeMap;

/// Raw inputs of one recorded session.
#[derive(Debug, Clone)]
pub struct SessionData {
    pub session_name: String,
    pub device_ids: Vec<DeviceId>,
    pub positions: Vec<PositionRecord>,
    /// Raw, unmerged speech segments per speaker on the audio clock.
    pub speech: BTreeMap<DeviceId, Vec<Segment>>,
}

pub struct SessionResult {
    pub trajectories: Vec<Trajectory>,
    pub formations: BTreeMap<DeviceId, FormationMatrix>,
    pub features: Vec<FeatureRow>,
    pub metrics: MetricsSnapshot,
}

/// Chains the core stages with one analysis configuration.
#[derive(Clone)]
pub struct Runner {
    config: AnalysisConfig,
}

impl Runner {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// One trajectory per requested device, in request order.
    pub fn interpolate(
        &self,
        positions: &[PositionRecord],
        device_ids: &[DeviceId],
    ) -> anyhow::Result<Vec<Trajectory>> {
        let mut by_device: BTreeMap<DeviceId, Vec<PositionRecord>> = BTreeMap::new();
        for record in positions {
            by_device.entry(record.device_id).or_default().push(*record);
        }

        let mut stage = InterpolationStage::new();
        stage
            .initialize(&self.config)
            .context("initializing interpolation stage")?;
        let mut trajectories = Vec::with_capacity(device_ids.len());
        for &device_id in device_ids {
            let records = by_device
                .remove(&device_id)
                .with_context(|| format!("no position samples for device {}", device_id))?;
            let trajectory = stage
                .execute(records)
                .with_context(|| format!("interpolating device {}", device_id))?;
            trajectories.push(trajectory);
        }
        stage.cleanup();

        Ok(trajectories)
    }

    pub fn formations(
        &self,
        trajectories: Vec<Trajectory>,
    ) -> anyhow::Result<BTreeMap<DeviceId, FormationMatrix>> {
        let mut stage = FormationStage::new();
        stage
            .initialize(&self.config)
            .context("initializing formation stage")?;
        let matrices = stage
            .execute(trajectories)
            .context("executing formation stage")?;
        stage.cleanup();
        Ok(matrices)
    }

    /// Sorts and merges raw speech, then classifies every speaker against the formations.
    pub fn features(
        &self,
        session_name: &str,
        speech: BTreeMap<DeviceId, Vec<Segment>>,
        formations: BTreeMap<DeviceId, FormationMatrix>,
    ) -> anyhow::Result<(Vec<FeatureRow>, MetricsSnapshot)> {
        let mut prepared = BTreeMap::new();
        for (speaker, segments) in speech {
            let segments = prepare_segments(segments)
                .with_context(|| format!("validating speech of speaker {}", speaker))?;
            prepared.insert(speaker, segments);
        }

        let mut merge_stage = MergeStage::new();
        merge_stage
            .initialize(&self.config)
            .context("initializing merge stage")?;
        let speakers = merge_stage
            .execute(prepared)
            .context("executing merge stage")?;
        merge_stage.cleanup();

        let mut feature_stage = FeatureStage::new();
        feature_stage
            .initialize(&self.config)
            .context("initializing feature stage")?;
        let rows = feature_stage
            .execute(FeatureInput {
                session_name: session_name.to_string(),
                speakers,
                formations,
            })
            .context("executing feature stage")?;
        let metrics = feature_stage.metrics().snapshot();
        feature_stage.cleanup();

        Ok((rows, metrics))
    }

    /// Runs the whole pipeline on an in-memory session.
    pub fn analyze(&self, session: &SessionData) -> anyhow::Result<SessionResult> {
        let trajectories = self.interpolate(&session.positions, &session.device_ids)?;
        let formations = self.formations(trajectories.clone())?;
        let (features, metrics) = self.features(
            &session.session_name,
            session.speech.clone(),
            formations.clone(),
        )?;

        Ok(SessionResult {
            trajectories,
            formations,
            features,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn facing_pair() -> SessionData {
        let mut positions = Vec::new();
        for step in 0..=20 {
            let t = 100.0 + step as f64 * 0.5;
            positions.push(PositionRecord::new(1, t, 0.0, 0.0, 0.0));
            positions.push(PositionRecord::new(2, t, 1.0, 0.0, PI));
        }
        SessionData {
            session_name: "pair".into(),
            device_ids: vec![1, 2],
            positions,
            speech: BTreeMap::from([
                (1, vec![Segment::new(0.0, 2.0), Segment::new(2.2, 5.0)]),
                (2, vec![Segment::new(6.0, 9.0)]),
            ]),
        }
    }

    #[test]
    fn runner_analyzes_a_facing_pair() {
        let runner = Runner::new(AnalysisConfig {
            audio_offset: 100.0,
            ..Default::default()
        });
        let result = runner.analyze(&facing_pair()).unwrap();

        assert_eq!(result.trajectories.len(), 2);
        assert_eq!(result.trajectories[0].len(), 11);
        assert!(result.formations[&1].is_in_formation(105, 2));

        // speaker 1's two segments merge into (0, 5) and hand over to speaker 2
        let first = &result.features[0];
        assert_eq!(first.connected_count, Some(1));
        assert_eq!(first.connected_duration, Some(5.0));
        assert_eq!(first.speaking_time_duration, Some(5.0));
        assert_eq!(result.metrics.failed, 0);
    }

    #[test]
    fn missing_device_is_an_error() {
        let runner = Runner::new(AnalysisConfig::default());
        let session = facing_pair();
        let err = runner.interpolate(&session.positions, &[1, 3]).unwrap_err();
        assert!(err.to_string().contains("device 3"));
    }
}
