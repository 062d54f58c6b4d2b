use crate::prelude::{StageError, StageResult};
use serde::{Deserialize, Serialize};

/// A contiguous interval of detected speech, in seconds since the audio origin.
///
/// Serialized with the column names produced by the voice activity detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(rename = "voice_start")]
    pub start: f64,
    #[serde(rename = "voice_end")]
    pub end: f64,
}

impl Segment {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Checks the boundary precondition of the core: finite bounds with `start <= end`.
    pub fn validate(&self) -> StageResult<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(StageError::InvalidInput(format!(
                "segment ({}, {}) has non-finite bounds",
                self.start, self.end
            )));
        }
        if self.start > self.end {
            return Err(StageError::InvalidInput(format!(
                "segment starts at {} after it ends at {}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// Validates raw segments and orders them by start time for merging.
pub fn prepare_segments(mut segments: Vec<Segment>) -> StageResult<Vec<Segment>> {
    for segment in &segments {
        segment.validate()?;
    }
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_reads_detector_columns() {
        let segment: Segment =
            serde_json::from_str(r#"{"voice_start": 1.5, "voice_end": 2.25}"#).unwrap();
        assert_eq!(segment, Segment::new(1.5, 2.25));
        assert_eq!(segment.duration(), 0.75);
    }

    #[test]
    fn prepare_sorts_and_rejects_inverted() {
        let sorted = prepare_segments(vec![Segment::new(4.0, 5.0), Segment::new(1.0, 2.0)]).unwrap();
        assert_eq!(sorted[0].start, 1.0);

        assert!(prepare_segments(vec![Segment::new(3.0, 2.0)]).is_err());
        assert!(prepare_segments(vec![Segment::new(f64::NAN, 2.0)]).is_err());
    }
}
