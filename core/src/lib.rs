//! Core formation-detection and speech-behaviour analysis for instrumented
//! small-group sessions.
//!
//! Positioning trajectories are turned into per-second F-formation matrices,
//! which then gate the classification of every speaker's utterances into
//! overlapped, connected and speaking-to-other events.

pub mod interface;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use prelude::{AnalysisConfig, ProcessingStage, StageError, StageResult};
