use crate::interface::{DeviceId, Segment};
use crate::processing::formation::FormationMatrix;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Share of a segment's ticks another speaker must spend in formation with
/// the main speaker to count as a possible addressee.
pub const FORMATION_COVERAGE: f64 = 0.7;

/// Whole seconds on the positioning clock spanned by a segment, endpoints included.
pub fn window_ticks(segment: &Segment, audio_offset: f64) -> RangeInclusive<i64> {
    let first = (segment.start + audio_offset).floor() as i64;
    let last = (segment.end + audio_offset).ceil() as i64;
    first..=last
}

/// Speakers in formation with the owner of `matrix` for at least
/// [`FORMATION_COVERAGE`] of the segment's ticks.
///
/// Ticks missing from the matrix still count towards the total.
pub fn formation_targets<I>(
    segment: &Segment,
    candidates: I,
    matrix: &FormationMatrix,
    audio_offset: f64,
) -> BTreeSet<DeviceId>
where
    I: IntoIterator<Item = DeviceId>,
{
    let ticks = window_ticks(segment, audio_offset);
    let total = (ticks.end() - ticks.start() + 1).max(0) as f64;

    candidates
        .into_iter()
        .filter(|&other| other != matrix.reference())
        .filter(|&other| {
            let in_formation = ticks
                .clone()
                .filter(|&tick| matrix.is_in_formation(tick, other))
                .count() as f64;
            in_formation >= total * FORMATION_COVERAGE
        })
        .collect()
}
