use crate::interface::{DeviceId, PositionRecord};
use crate::prelude::{StageError, StageResult};
use serde::Deserialize;

/// Tag ids show up both as numbers and as decimal strings in recorded logs.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagId {
    Number(DeviceId),
    Text(String),
}

impl TagId {
    fn resolve(&self) -> Option<DeviceId> {
        match self {
            TagId::Number(id) => Some(*id),
            TagId::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Coordinates {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct Orientation {
    yaw: f64,
}

#[derive(Debug, Deserialize)]
struct PozyxData {
    coordinates: Coordinates,
    orientation: Orientation,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PozyxLine {
    tag_id: TagId,
    #[serde(default)]
    success: bool,
    timestamp: f64,
    data: Option<PozyxData>,
}

/// Decodes a positioning log with one bracket-wrapped JSON object per line.
///
/// Keeps successful samples of the requested devices only. Lines of three
/// characters or fewer are treated as separators.
pub fn decode_position_log(text: &str, device_ids: &[DeviceId]) -> StageResult<Vec<PositionRecord>> {
    let mut records = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        if line.len() <= 3 {
            continue;
        }
        let trimmed = line.trim();
        let body = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(trimmed);

        let parsed: PozyxLine = serde_json::from_str(body).map_err(|e| {
            StageError::InvalidInput(format!("position log line {}: {}", idx + 1, e))
        })?;

        let Some(device_id) = parsed.tag_id.resolve() else {
            continue;
        };
        if !parsed.success || !device_ids.contains(&device_id) {
            continue;
        }
        let data = parsed.data.ok_or_else(|| {
            StageError::InvalidInput(format!(
                "position log line {}: successful sample without data",
                idx + 1
            ))
        })?;

        records.push(PositionRecord::new(
            device_id,
            parsed.timestamp,
            data.coordinates.x,
            data.coordinates.y,
            data.orientation.yaw,
        ));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = r#"[{"tagId": "27", "success": true, "timestamp": 100.2, "data": {"coordinates": {"x": 10, "y": 20, "z": 0}, "orientation": {"yaw": 1.5}}}]
[{"tagId": 31, "success": true, "timestamp": 100.4, "data": {"coordinates": {"x": 5, "y": 6}, "orientation": {"yaw": 0.1}}}]
[{"tagId": "27", "success": false, "timestamp": 100.6}]

[{"tagId": "99", "success": true, "timestamp": 100.8, "data": {"coordinates": {"x": 1, "y": 1}, "orientation": {"yaw": 0.0}}}]
"#;

    #[test]
    fn decoder_keeps_successful_requested_tags() {
        let records = decode_position_log(LOG, &[27, 31]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], PositionRecord::new(27, 100.2, 10.0, 20.0, 1.5));
        assert_eq!(records[1].device_id, 31);
    }

    #[test]
    fn decoder_reports_line_of_malformed_json() {
        let err = decode_position_log("[{\"tagId\": 1, oops}]\n", &[1]).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
