use crate::interface::DeviceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of a formation table: whether the reference device was in
/// formation with each other device at one second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationRow {
    pub session_name: String,
    pub timestamp: i64,
    pub device_id: DeviceId,
    pub formation: BTreeMap<DeviceId, bool>,
}

/// Behavioural features of one speaker in one session.
///
/// Columns of features that were not requested stay `None` and are left out
/// of the serialized row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub session_name: String,
    pub device_id: DeviceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlapped_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlapped_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaking_time_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_other_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_other_duration: Option<f64>,
}

impl FeatureRow {
    pub fn new(session_name: impl Into<String>, device_id: DeviceId) -> Self {
        Self {
            session_name: session_name.into(),
            device_id,
            ..Default::default()
        }
    }
}
