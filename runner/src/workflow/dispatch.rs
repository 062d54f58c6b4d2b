use crate::workflow::config::{
    FeatureMission, FormationMission, InterpolateMission, Mission, MissionEntry,
};
use crate::workflow::runner::Runner;
use crate::workflow::tables::{read_records, read_segments, write_records};
use anyhow::Context;
use fformcore::interface::{decode_position_log, FormationRow, Trajectory, TrajectorySample};
use fformcore::processing::FormationMatrix;
use fformcore::AnalysisConfig;
use log::{info, warn};
use std::collections::BTreeMap;
use std::fs;

#[derive(Debug, Clone, PartialEq)]
pub struct MissionFailure {
    pub index: usize,
    pub mission_type: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissionReport {
    pub completed: usize,
    pub failures: Vec<MissionFailure>,
}

impl MissionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs missions in order; a failing or unsupported mission never stops the
/// ones after it.
pub fn run_missions(entries: &[MissionEntry]) -> MissionReport {
    let mut report = MissionReport::default();

    for (index, entry) in entries.iter().enumerate() {
        let outcome = match entry {
            MissionEntry::Supported(mission) => {
                info!("mission {}: running {}", index, mission.mission_type());
                run_mission(mission)
                    .map_err(|err| (mission.mission_type().to_string(), format!("{:#}", err)))
            }
            MissionEntry::Unsupported { mission_type } => Err((
                mission_type.clone(),
                format!("unsupported mission type '{}'", mission_type),
            )),
        };

        match outcome {
            Ok(()) => report.completed += 1,
            Err((mission_type, reason)) => {
                warn!("mission {} ({}) failed: {}", index, mission_type, reason);
                report.failures.push(MissionFailure {
                    index,
                    mission_type,
                    reason,
                });
            }
        }
    }

    for failure in &report.failures {
        warn!(
            "mission {} ({}) did not complete: {}",
            failure.index, failure.mission_type, failure.reason
        );
    }
    report
}

pub fn run_mission(mission: &Mission) -> anyhow::Result<()> {
    match mission {
        Mission::InterpolatePositions(m) => run_interpolation(m),
        Mission::Formation(m) => run_formation(m),
        Mission::FeatureExtraction(m) => run_feature_extraction(m),
    }
}

fn run_interpolation(mission: &InterpolateMission) -> anyhow::Result<()> {
    mission.validate()?;
    let text = fs::read_to_string(&mission.position_log)
        .with_context(|| format!("reading position log {}", mission.position_log.display()))?;
    let records = decode_position_log(&text, &mission.device_ids)
        .with_context(|| format!("decoding position log {}", mission.position_log.display()))?;

    let runner = Runner::new(AnalysisConfig::default());
    let trajectories = runner.interpolate(&records, &mission.device_ids)?;
    for (trajectory, path) in trajectories.iter().zip(&mission.output_paths) {
        write_records(path, trajectory.samples())?;
        info!(
            "session {}: trajectory of device {} written to {}",
            mission.session_name,
            trajectory.device_id(),
            path.display()
        );
    }
    Ok(())
}

fn run_formation(mission: &FormationMission) -> anyhow::Result<()> {
    mission.validate()?;
    let mut trajectories = Vec::with_capacity(mission.device_ids.len());
    for (&device_id, path) in mission.device_ids.iter().zip(&mission.trajectory_paths) {
        let samples: Vec<TrajectorySample> = read_records(path)?;
        let trajectory = Trajectory::new(device_id, samples)
            .with_context(|| format!("loading trajectory {}", path.display()))?;
        trajectories.push(trajectory);
    }

    let runner = Runner::new(mission.to_analysis_config());
    let matrices = runner.formations(trajectories)?;
    for (device_id, path) in mission.device_ids.iter().zip(&mission.output_paths) {
        let matrix = matrices
            .get(device_id)
            .with_context(|| format!("no formation matrix for device {}", device_id))?;
        write_records(path, &matrix.to_rows(&mission.session_name))?;
    }
    Ok(())
}

fn run_feature_extraction(mission: &FeatureMission) -> anyhow::Result<()> {
    mission.validate()?;
    let mut speech = BTreeMap::new();
    let mut formations = BTreeMap::new();
    for ((&device_id, speech_path), formation_path) in mission
        .device_ids
        .iter()
        .zip(&mission.speech_paths)
        .zip(&mission.formation_paths)
    {
        speech.insert(device_id, read_segments(speech_path)?);
        let rows: Vec<FormationRow> = read_records(formation_path)?;
        let matrix = FormationMatrix::from_rows(device_id, &rows)
            .with_context(|| format!("loading formation table {}", formation_path.display()))?;
        formations.insert(device_id, matrix);
    }

    let runner = Runner::new(mission.to_analysis_config());
    let (rows, metrics) = runner.features(&mission.session_name, speech, formations)?;
    write_records(&mission.output_path, &rows)?;
    info!(
        "session {}: {} feature rows, {} computed, {} failed",
        mission.session_name,
        rows.len(),
        metrics.computed,
        metrics.failed
    );
    Ok(())
}
