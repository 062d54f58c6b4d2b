use crate::prelude::{StageError, StageResult};
use serde::{Deserialize, Serialize};

/// Identifier of a tracked positioning tag; speakers share the id of the tag they wear.
pub type DeviceId = u32;

/// Raw positioning sample decoded from a device log, before interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub device_id: DeviceId,
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl PositionRecord {
    pub fn new(device_id: DeviceId, timestamp: f64, x: f64, y: f64, heading: f64) -> Self {
        Self {
            device_id,
            timestamp,
            x,
            y,
            heading,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.timestamp.is_finite() && self.x.is_finite() && self.y.is_finite() && self.heading.is_finite()
    }
}

/// One interpolated, per-second position and heading of a device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub device_id: DeviceId,
    pub timestamp: i64,
    pub x: f64,
    pub y: f64,
    /// Heading in radians.
    pub heading: f64,
}

impl TrajectorySample {
    pub fn new(device_id: DeviceId, timestamp: i64, x: f64, y: f64, heading: f64) -> Self {
        Self {
            device_id,
            timestamp,
            x,
            y,
            heading,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Per-second trajectory of a single device, ordered by timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    device_id: DeviceId,
    samples: Vec<TrajectorySample>,
}

impl Trajectory {
    /// Builds a trajectory, rejecting samples of other devices or out-of-order timestamps.
    pub fn new(device_id: DeviceId, samples: Vec<TrajectorySample>) -> StageResult<Self> {
        if let Some(foreign) = samples.iter().find(|s| s.device_id != device_id) {
            return Err(StageError::InvalidInput(format!(
                "sample of device {} in trajectory of device {}",
                foreign.device_id, device_id
            )));
        }
        if let Some(pair) = samples
            .windows(2)
            .find(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(StageError::InvalidInput(format!(
                "device {} timestamps not strictly increasing at {}",
                device_id, pair[1].timestamp
            )));
        }
        Ok(Self { device_id, samples })
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_at(&self, timestamp: i64) -> Option<&TrajectorySample> {
        self.samples
            .binary_search_by_key(&timestamp, |s| s.timestamp)
            .ok()
            .map(|idx| &self.samples[idx])
    }
}
