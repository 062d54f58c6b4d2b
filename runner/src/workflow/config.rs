use anyhow::{ensure, Context};
use fformcore::interface::DeviceId;
use fformcore::AnalysisConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_connected_threshold() -> f64 {
    AnalysisConfig::default().connected_threshold
}

/// Resample a raw positioning log into one trajectory table per device.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InterpolateMission {
    #[serde(alias = "pozyx_path")]
    pub position_log: PathBuf,
    #[serde(alias = "pozyx_device_id")]
    pub device_ids: Vec<DeviceId>,
    #[serde(alias = "output_path")]
    pub output_paths: Vec<PathBuf>,
    pub session_name: String,
}

/// Compute one formation table per device from trajectory tables.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormationMission {
    #[serde(alias = "interpolated_pozyx_path")]
    pub trajectory_paths: Vec<PathBuf>,
    #[serde(alias = "pozyx_device_id")]
    pub device_ids: Vec<DeviceId>,
    #[serde(alias = "output_path")]
    pub output_paths: Vec<PathBuf>,
    pub session_name: String,
    pub fov_threshold: u32,
    pub distance_threshold: f64,
    #[serde(default)]
    pub correction: bool,
}

/// Classify every speaker's speech against the formation tables.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeatureMission {
    #[serde(alias = "pozyx_device_id")]
    pub device_ids: Vec<DeviceId>,
    #[serde(alias = "audio_data_path")]
    pub speech_paths: Vec<PathBuf>,
    #[serde(alias = "formation_path")]
    pub formation_paths: Vec<PathBuf>,
    #[serde(alias = "feature")]
    pub features: Vec<String>,
    #[serde(default)]
    pub audio_start_timestamp: f64,
    pub session_name: String,
    pub segment_merging_threshold: f64,
    #[serde(default = "default_connected_threshold")]
    pub connected_threshold: f64,
    pub output_path: PathBuf,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "mission_type", rename_all = "snake_case")]
pub enum Mission {
    #[serde(alias = "interpolate_pozyx")]
    InterpolatePositions(InterpolateMission),
    #[serde(rename = "f_formation")]
    Formation(FormationMission),
    FeatureExtraction(FeatureMission),
}

/// A mission entry as found in the file; unsupported types are kept so the
/// runner can report them without aborting the others.
#[derive(Clone, Debug)]
pub enum MissionEntry {
    Supported(Mission),
    Unsupported { mission_type: String },
}

impl Mission {
    pub fn mission_type(&self) -> &'static str {
        match self {
            Mission::InterpolatePositions(_) => "interpolate_positions",
            Mission::Formation(_) => "f_formation",
            Mission::FeatureExtraction(_) => "feature_extraction",
        }
    }
}

impl FormationMission {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.trajectory_paths.len() == self.device_ids.len()
                && self.output_paths.len() == self.device_ids.len(),
            "f_formation mission needs one trajectory and one output path per device"
        );
        Ok(())
    }

    pub fn to_analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            fov_threshold_deg: self.fov_threshold,
            distance_threshold: self.distance_threshold,
            heading_correction: self.correction,
            ..Default::default()
        }
    }
}

impl FeatureMission {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.speech_paths.len() == self.device_ids.len()
                && self.formation_paths.len() == self.device_ids.len(),
            "feature_extraction mission needs one speech and one formation path per device"
        );
        Ok(())
    }

    pub fn to_analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            merge_threshold: self.segment_merging_threshold,
            connected_threshold: self.connected_threshold,
            audio_offset: self.audio_start_timestamp,
            features: self.features.clone(),
            ..Default::default()
        }
    }
}

impl InterpolateMission {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.output_paths.len() == self.device_ids.len(),
            "interpolation mission needs one output path per device"
        );
        Ok(())
    }
}

/// Loads a mission list from YAML, or from JSON when the file ends in `.json`.
pub fn load_missions<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<MissionEntry>> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading mission file {}", path_ref.display()))?;

    let is_json = path_ref
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let raw: Vec<serde_yaml::Value> = if is_json {
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing mission file {}", path_ref.display()))?
    } else {
        serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing mission file {}", path_ref.display()))?
    };

    raw.into_iter()
        .enumerate()
        .map(|(idx, value)| parse_entry(value).with_context(|| format!("mission number {}", idx)))
        .collect()
}

fn parse_entry(value: serde_yaml::Value) -> anyhow::Result<MissionEntry> {
    let mission_type = value
        .get("mission_type")
        .and_then(serde_yaml::Value::as_str)
        .context("missing mission_type")?
        .to_string();

    match mission_type.as_str() {
        "interpolate_positions" | "interpolate_pozyx" | "f_formation" | "feature_extraction" => {
            let mission: Mission = serde_yaml::from_value(value)
                .with_context(|| format!("parsing {} mission", mission_type))?;
            Ok(MissionEntry::Supported(mission))
        }
        _ => Ok(MissionEntry::Unsupported { mission_type }),
    }
}

/// Writes missions as YAML so a run can be replayed from files.
pub fn save_missions<P: AsRef<Path>>(path: P, missions: &[Mission]) -> anyhow::Result<()> {
    let path_ref = path.as_ref();
    let yaml = serde_yaml::to_string(missions).context("serializing missions")?;
    fs::write(path_ref, yaml)
        .with_context(|| format!("writing mission file {}", path_ref.display()))?;
    Ok(())
}
