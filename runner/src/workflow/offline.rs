use crate::generator::template::position_log;
use crate::workflow::config::{FeatureMission, FormationMission, InterpolateMission, Mission};
use crate::workflow::runner::{SessionData, SessionResult};
use crate::workflow::tables::write_records;
use anyhow::Context;
use fformcore::AnalysisConfig;
use std::fs;
use std::path::Path;

/// Writes the inputs and tables of an in-memory run under `dir` and returns
/// the missions that recompute the same tables from those files.
pub fn write_offline_run(
    dir: &Path,
    session: &SessionData,
    result: &SessionResult,
    config: &AnalysisConfig,
) -> anyhow::Result<Vec<Mission>> {
    fs::create_dir_all(dir).with_context(|| format!("creating directory {}", dir.display()))?;
    let name = &session.session_name;
    let ids = &session.device_ids;
    let per_device = |prefix: &str| -> Vec<_> {
        ids.iter()
            .map(|id| dir.join(format!("{}_{}.json", prefix, id)))
            .collect()
    };

    let log_path = dir.join("positions.log");
    fs::write(&log_path, position_log(&session.positions))
        .with_context(|| format!("writing position log {}", log_path.display()))?;

    let speech_paths = per_device("speech");
    for (id, path) in ids.iter().zip(&speech_paths) {
        let segments = session.speech.get(id).map(Vec::as_slice).unwrap_or_default();
        write_records(path, segments)?;
    }

    let trajectory_paths = per_device("trajectory");
    for (trajectory, path) in result.trajectories.iter().zip(&trajectory_paths) {
        write_records(path, trajectory.samples())?;
    }

    let formation_paths = per_device("formation");
    for (id, path) in ids.iter().zip(&formation_paths) {
        if let Some(matrix) = result.formations.get(id) {
            write_records(path, &matrix.to_rows(name))?;
        }
    }

    let feature_path = dir.join("features.json");
    write_records(&feature_path, &result.features)?;

    Ok(vec![
        Mission::InterpolatePositions(InterpolateMission {
            position_log: log_path,
            device_ids: ids.clone(),
            output_paths: trajectory_paths.clone(),
            session_name: name.clone(),
        }),
        Mission::Formation(FormationMission {
            trajectory_paths,
            device_ids: ids.clone(),
            output_paths: formation_paths.clone(),
            session_name: name.clone(),
            fov_threshold: config.fov_threshold_deg,
            distance_threshold: config.distance_threshold,
            correction: config.heading_correction,
        }),
        Mission::FeatureExtraction(FeatureMission {
            device_ids: ids.clone(),
            speech_paths,
            formation_paths,
            features: config.features.clone(),
            audio_start_timestamp: config.audio_offset,
            session_name: name.clone(),
            segment_merging_threshold: config.merge_threshold,
            connected_threshold: config.connected_threshold,
            output_path: feature_path,
        }),
    ])
}
