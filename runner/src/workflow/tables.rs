use anyhow::Context;
use fformcore::interface::{prepare_segments, Segment};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Reads a JSON table (an array of rows).
pub fn read_records<T, P>(path: P) -> anyhow::Result<Vec<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading table {}", path_ref.display()))?;
    let rows = serde_json::from_str(&contents)
        .with_context(|| format!("parsing table {}", path_ref.display()))?;
    Ok(rows)
}

/// Writes rows as a pretty-printed JSON array, creating parent directories.
pub fn write_records<T, P>(path: P, rows: &[T]) -> anyhow::Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path_ref = path.as_ref();
    if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(rows).context("serializing table")?;
    fs::write(path_ref, json).with_context(|| format!("writing table {}", path_ref.display()))?;
    Ok(())
}

/// Loads one speaker's raw speech segments, validated and sorted by start.
pub fn read_segments<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Segment>> {
    let path_ref = path.as_ref();
    let raw: Vec<Segment> = read_records(path_ref)?;
    prepare_segments(raw).with_context(|| format!("validating segments in {}", path_ref.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn tables_round_trip_through_nested_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session").join("speech_1.json");
        let segments = vec![Segment::new(3.0, 4.0), Segment::new(0.0, 1.5)];

        write_records(&path, &segments).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("voice_start"));

        let loaded = read_segments(&path).unwrap();
        assert_eq!(loaded, vec![Segment::new(0.0, 1.5), Segment::new(3.0, 4.0)]);
    }

    #[test]
    fn inverted_segments_are_rejected_with_the_file_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"[{"voice_start": 5.0, "voice_end": 2.0}]"#).unwrap();

        let err = read_segments(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("bad.json"));
    }

    #[test]
    fn missing_table_reports_path() {
        let dir = tempdir().unwrap();
        let err = read_records::<Segment, _>(dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
