use fformcore::interface::PositionRecord;
use serde_json::json;

/// Renders a record as one bracket-wrapped line of a positioning log, the
/// layout the position decoder reads back.
pub fn position_log_line(record: &PositionRecord) -> String {
    let body = json!({
        "tagId": record.device_id.to_string(),
        "success": true,
        "timestamp": record.timestamp,
        "data": {
            "coordinates": { "x": record.x, "y": record.y, "z": 0.0 },
            "orientation": { "yaw": record.heading }
        }
    });
    format!("[{}]", body)
}

pub fn position_log(records: &[PositionRecord]) -> String {
    let mut text = String::new();
    for record in records {
        text.push_str(&position_log_line(record));
        text.push('\n');
    }
    text
}
