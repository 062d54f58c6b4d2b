use crate::interface::DeviceId;
use serde::{Deserialize, Serialize};

/// Shared configuration for each processing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Full field-of-view cone in degrees; each agent must see the other within half of it.
    pub fov_threshold_deg: u32,
    /// Maximum distance between two agents, in position units.
    pub distance_threshold: f64,
    /// Replace recorded headings `h` by `2π - h` before use.
    pub heading_correction: bool,
    /// Raw speech segments closer than this (seconds) are merged.
    pub merge_threshold: f64,
    /// Maximum pause (seconds) for a reply to count as connected speech.
    pub connected_threshold: f64,
    /// Added to audio-relative times to land on the positioning clock.
    pub audio_offset: f64,
    /// Requested feature names; unknown names are skipped with a warning.
    pub features: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fov_threshold_deg: 90,
            distance_threshold: 2.0,
            heading_correction: false,
            merge_threshold: 0.5,
            connected_threshold: 1.5,
            audio_offset: 0.0,
            features: vec![
                "overlapped".into(),
                "connected".into(),
                "speaking_time".into(),
                "to_other".into(),
            ],
        }
    }
}

/// Common error type for stage execution.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no formation data for device {0}")]
    MissingFormation(DeviceId),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type StageResult<T> = Result<T, StageError>;

/// Trait describing the batch processing stages of a session.
pub trait ProcessingStage {
    type Input;
    type Output;

    fn initialize(&mut self, config: &AnalysisConfig) -> StageResult<()>;
    fn execute(&mut self, input: Self::Input) -> StageResult<Self::Output>;
    fn cleanup(&mut self);
}
