use crate::interface::{PositionRecord, Trajectory, TrajectorySample};
use crate::prelude::{AnalysisConfig, ProcessingStage, StageError, StageResult};
use crate::telemetry::log::LogManager;

/// Resamples one device's raw positioning log onto whole seconds.
pub struct InterpolationStage {
    initialized: bool,
    logger: LogManager,
}

impl InterpolationStage {
    pub fn new() -> Self {
        Self {
            initialized: false,
            logger: LogManager::new("interpolation"),
        }
    }
}

impl Default for InterpolationStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for InterpolationStage {
    type Input = Vec<PositionRecord>;
    type Output = Trajectory;

    fn initialize(&mut self, _config: &AnalysisConfig) -> StageResult<()> {
        self.initialized = true;
        Ok(())
    }

    fn execute(&mut self, input: Self::Input) -> StageResult<Self::Output> {
        if !self.initialized {
            return Err(StageError::Internal("stage not initialized".into()));
        }
        let trajectory = interpolate_trajectory(input)?;
        self.logger.record(&format!(
            "device {} resampled to {} seconds",
            trajectory.device_id(),
            trajectory.len()
        ));
        Ok(trajectory)
    }

    fn cleanup(&mut self) {
        self.initialized = false;
    }
}

/// Linear interpolation of x, y and heading at every integer second between
/// `ceil(first timestamp)` and `floor(last timestamp)`.
pub fn interpolate_trajectory(mut records: Vec<PositionRecord>) -> StageResult<Trajectory> {
    let device_id = records
        .first()
        .map(|r| r.device_id)
        .ok_or_else(|| StageError::InvalidInput("no position records to interpolate".into()))?;

    if let Some(bad) = records.iter().find(|r| r.device_id != device_id || !r.is_finite()) {
        return Err(StageError::InvalidInput(format!(
            "unusable position record for device {} at {}",
            bad.device_id, bad.timestamp
        )));
    }

    records.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    let first = records[0].timestamp.ceil() as i64;
    let last = records[records.len() - 1].timestamp.floor() as i64;

    let mut samples = Vec::with_capacity((last - first + 1).max(0) as usize);
    for second in first..=last {
        let t = second as f64;
        let upper = records.partition_point(|r| r.timestamp <= t);
        let lower = &records[upper - 1];

        let sample = match records.get(upper) {
            Some(next) if lower.timestamp < t => {
                let frac = (t - lower.timestamp) / (next.timestamp - lower.timestamp);
                TrajectorySample::new(
                    device_id,
                    second,
                    lerp(lower.x, next.x, frac),
                    lerp(lower.y, next.y, frac),
                    lerp(lower.heading, next.heading, frac),
                )
            }
            _ => TrajectorySample::new(device_id, second, lower.x, lower.y, lower.heading),
        };
        samples.push(sample);
    }

    Trajectory::new(device_id, samples)
}

fn lerp(from: f64, to: f64, frac: f64) -> f64 {
    from + (to - from) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolation_fills_whole_seconds() {
        let records = vec![
            PositionRecord::new(4, 12.5, 10.0, 0.0, 1.0),
            PositionRecord::new(4, 10.5, 0.0, 0.0, 0.0),
        ];
        let trajectory = interpolate_trajectory(records).unwrap();
        let stamps: Vec<i64> = trajectory.samples().iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![11, 12]);

        let at_11 = trajectory.sample_at(11).unwrap();
        assert!((at_11.x - 2.5).abs() < 1e-12);
        assert!((at_11.heading - 0.25).abs() < 1e-12);
    }

    #[test]
    fn single_integer_sample_is_kept() {
        let trajectory =
            interpolate_trajectory(vec![PositionRecord::new(1, 7.0, 1.0, 2.0, 0.5)]).unwrap();
        assert_eq!(trajectory.samples(), &[TrajectorySample::new(1, 7, 1.0, 2.0, 0.5)]);

        let empty = interpolate_trajectory(vec![PositionRecord::new(1, 7.5, 1.0, 2.0, 0.5)]).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn stage_rejects_mixed_devices_and_uninitialized_use() {
        let mut stage = InterpolationStage::new();
        let records = vec![
            PositionRecord::new(1, 0.0, 0.0, 0.0, 0.0),
            PositionRecord::new(2, 1.0, 0.0, 0.0, 0.0),
        ];
        assert!(matches!(
            stage.execute(records.clone()),
            Err(StageError::Internal(_))
        ));

        stage.initialize(&AnalysisConfig::default()).unwrap();
        assert!(matches!(stage.execute(records), Err(StageError::InvalidInput(_))));
        assert!(stage.execute(Vec::new()).is_err());
        stage.cleanup();
    }
}
