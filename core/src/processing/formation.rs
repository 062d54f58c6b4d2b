use crate::interface::{DeviceId, FormationRow, Trajectory, TrajectorySample};
use crate::math::geometry::GeometryHelper;
use crate::prelude::{AnalysisConfig, ProcessingStage, StageError, StageResult};
use crate::telemetry::log::LogManager;
use std::collections::{BTreeMap, BTreeSet};

/// Thresholds of the mutual field-of-view test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormationParams {
    pub fov_threshold_deg: f64,
    pub distance_threshold: f64,
    pub heading_correction: bool,
}

impl FormationParams {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            fov_threshold_deg: f64::from(config.fov_threshold_deg),
            distance_threshold: config.distance_threshold,
            heading_correction: config.heading_correction,
        }
    }
}

/// Two agents are in formation when they are close enough and each one has
/// the other strictly inside half of its field-of-view cone.
pub fn in_formation(a: &TrajectorySample, b: &TrajectorySample, params: &FormationParams) -> bool {
    let (pa, pb) = (a.position(), b.position());
    let distance = GeometryHelper::distance(pa, pb);
    if distance.is_nan() || distance > params.distance_threshold {
        return false;
    }

    let (mut heading_a, mut heading_b) = (a.heading, b.heading);
    if params.heading_correction {
        heading_a = GeometryHelper::correct_heading(heading_a);
        heading_b = GeometryHelper::correct_heading(heading_b);
    }

    let half_fov = params.fov_threshold_deg / 2.0;
    match (
        GeometryHelper::bearing_offset_deg(pa, heading_a, pb),
        GeometryHelper::bearing_offset_deg(pb, heading_b, pa),
    ) {
        (Some(a_to_b), Some(b_to_a)) => a_to_b < half_fov && b_to_a < half_fov,
        _ => false,
    }
}

/// Per-second formation flags of one reference device against every other device.
///
/// A `(timestamp, other)` entry only exists where both trajectories have a sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormationMatrix {
    reference: DeviceId,
    timeline: Vec<i64>,
    others: BTreeSet<DeviceId>,
    ticks: BTreeMap<i64, BTreeMap<DeviceId, bool>>,
}

impl FormationMatrix {
    pub fn new(reference: DeviceId) -> Self {
        Self {
            reference,
            ..Default::default()
        }
    }

    /// Evaluates the reference trajectory against every other trajectory, skipping itself.
    pub fn build(reference: &Trajectory, others: &[Trajectory], params: &FormationParams) -> Self {
        let mut matrix = Self::new(reference.device_id());
        matrix.timeline = reference.samples().iter().map(|s| s.timestamp).collect();

        for other in others.iter().filter(|t| t.device_id() != reference.device_id()) {
            matrix.others.insert(other.device_id());
            for sample in reference.samples() {
                if let Some(other_sample) = other.sample_at(sample.timestamp) {
                    let flag = in_formation(sample, other_sample, params);
                    matrix.insert(sample.timestamp, other.device_id(), flag);
                }
            }
        }
        matrix
    }

    /// Rebuilds a matrix from a previously written formation table.
    pub fn from_rows(reference: DeviceId, rows: &[FormationRow]) -> StageResult<Self> {
        let mut matrix = Self::new(reference);
        for row in rows {
            if row.device_id != reference {
                return Err(StageError::InvalidInput(format!(
                    "formation row of device {} in table of device {}",
                    row.device_id, reference
                )));
            }
            matrix.timeline.push(row.timestamp);
            for (&other, &flag) in row.formation.iter().filter(|(&id, _)| id != reference) {
                matrix.others.insert(other);
                matrix.insert(row.timestamp, other, flag);
            }
        }
        matrix.timeline.sort_unstable();
        matrix.timeline.dedup();
        Ok(matrix)
    }

    pub fn insert(&mut self, timestamp: i64, other: DeviceId, flag: bool) {
        self.others.insert(other);
        self.ticks.entry(timestamp).or_default().insert(other, flag);
    }

    pub fn reference(&self) -> DeviceId {
        self.reference
    }

    pub fn others(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.others.iter().copied()
    }

    pub fn get(&self, timestamp: i64, other: DeviceId) -> Option<bool> {
        self.ticks.get(&timestamp)?.get(&other).copied()
    }

    /// Absent entries count as "not in formation".
    pub fn is_in_formation(&self, timestamp: i64, other: DeviceId) -> bool {
        self.get(timestamp, other).unwrap_or(false)
    }

    pub fn tick_count(&self) -> usize {
        self.ticks.len()
    }

    /// One row per reference timestamp with a flag for every other device.
    pub fn to_rows(&self, session_name: &str) -> Vec<FormationRow> {
        self.timeline
            .iter()
            .map(|&timestamp| FormationRow {
                session_name: session_name.to_string(),
                timestamp,
                device_id: self.reference,
                formation: self
                    .others
                    .iter()
                    .map(|&other| (other, self.is_in_formation(timestamp, other)))
                    .collect(),
            })
            .collect()
    }
}

/// Builds a formation matrix for every device of a session.
pub struct FormationStage {
    params: Option<FormationParams>,
    logger: LogManager,
}

impl FormationStage {
    pub fn new() -> Self {
        Self {
            params: None,
            logger: LogManager::new("formation"),
        }
    }
}

impl Default for FormationStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for FormationStage {
    type Input = Vec<Trajectory>;
    type Output = BTreeMap<DeviceId, FormationMatrix>;

    fn initialize(&mut self, config: &AnalysisConfig) -> StageResult<()> {
        if config.distance_threshold.is_nan() || config.distance_threshold < 0.0 {
            return Err(StageError::InvalidInput(format!(
                "distance threshold must be non-negative, got {}",
                config.distance_threshold
            )));
        }
        self.params = Some(FormationParams::from_config(config));
        Ok(())
    }

    fn execute(&mut self, input: Self::Input) -> StageResult<Self::Output> {
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        let mut seen = BTreeSet::new();
        if let Some(dup) = input.iter().find(|t| !seen.insert(t.device_id())) {
            return Err(StageError::InvalidInput(format!(
                "device {} has more than one trajectory",
                dup.device_id()
            )));
        }

        let mut matrices = BTreeMap::new();
        for reference in &input {
            let matrix = FormationMatrix::build(reference, &input, params);
            let in_formation = matrix
                .ticks
                .values()
                .flat_map(|flags| flags.values())
                .filter(|&&flag| flag)
                .count();
            self.logger.record(&format!(
                "device {}: {} shared ticks, {} formation flags",
                reference.device_id(),
                matrix.tick_count(),
                in_formation
            ));
            matrices.insert(reference.device_id(), matrix);
        }
        Ok(matrices)
    }

    fn cleanup(&mut self) {
        self.params = None;
    }
}
