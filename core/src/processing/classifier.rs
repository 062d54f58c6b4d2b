use crate::interface::{DeviceId, Segment};
use crate::math::interval::IntervalHelper;
use crate::processing::formation::FormationMatrix;
use crate::processing::relation::Pairing;
use crate::processing::targets::formation_targets;
use std::collections::BTreeMap;
use std::ops::AddAssign;

/// Count and total duration of one kind of speech event.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EventTally {
    pub count: u32,
    pub duration: f64,
}

impl EventTally {
    pub fn once(duration: f64) -> Self {
        Self { count: 1, duration }
    }
}

impl AddAssign for EventTally {
    fn add_assign(&mut self, rhs: Self) {
        self.count += rhs.count;
        self.duration += rhs.duration;
    }
}

/// Read-only view of a session from one speaker's point of view.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorClassifier<'a> {
    /// Merged utterances of the main speaker.
    pub segments: &'a [Segment],
    /// Merged utterances of every speaker of the session.
    pub speakers: &'a BTreeMap<DeviceId, Vec<Segment>>,
    /// Formation matrix whose reference is the main speaker.
    pub matrix: &'a FormationMatrix,
    pub audio_offset: f64,
    pub connected_threshold: f64,
}

impl<'a> BehaviorClassifier<'a> {
    pub fn speaker(&self) -> DeviceId {
        self.matrix.reference()
    }

    /// Pairs `segment` with every utterance of its formation targets.
    ///
    /// `None` means nobody was in formation with the speaker during the segment.
    fn pairings(&self, segment: &Segment) -> Option<Vec<Pairing>> {
        let speaker = self.speaker();
        let candidates = self.speakers.keys().copied().filter(|&id| id != speaker);
        let targets = formation_targets(segment, candidates, self.matrix, self.audio_offset);
        if targets.is_empty() {
            return None;
        }

        let pairings = targets
            .iter()
            .filter_map(|target| self.speakers.get(target))
            .flatten()
            .map(|other| Pairing::classify(segment, other))
            .collect();
        Some(pairings)
    }

    /// One event per utterance that overlaps anyone; duration is the union
    /// of all overlapped regions.
    pub fn overlapped_segment(&self, segment: &Segment) -> EventTally {
        let Some(pairings) = self.pairings(segment) else {
            return EventTally::default();
        };
        let regions: Vec<(f64, f64)> = pairings.iter().filter_map(Pairing::overlap_region).collect();
        if regions.is_empty() {
            return EventTally::default();
        }
        EventTally::once(IntervalHelper::union_length(&regions))
    }

    pub fn connected_segment(&self, segment: &Segment) -> EventTally {
        match self.pairings(segment) {
            Some(pairings) if pairings.iter().any(|p| p.is_connected(self.connected_threshold)) => {
                EventTally::once(segment.duration())
            }
            _ => EventTally::default(),
        }
    }

    /// Speech with no formation member to address, or not tied to any of them.
    pub fn to_other_segment(&self, segment: &Segment) -> EventTally {
        match self.pairings(segment) {
            Some(pairings) if pairings.iter().any(|p| p.is_addressed(self.connected_threshold)) => {
                EventTally::default()
            }
            _ => EventTally::once(segment.duration()),
        }
    }

    pub fn overlapped(&self) -> EventTally {
        self.total(Self::overlapped_segment)
    }

    pub fn connected(&self) -> EventTally {
        self.total(Self::connected_segment)
    }

    pub fn to_other(&self) -> EventTally {
        self.total(Self::to_other_segment)
    }

    fn total(&self, per_segment: fn(&Self, &Segment) -> EventTally) -> EventTally {
        let mut tally = EventTally::default();
        for segment in self.segments {
            tally += per_segment(self, segment);
        }
        tally
    }
}

/// Total speaking time; no formation gating.
pub fn speaking_time(segments: &[Segment]) -> f64 {
    segments.iter().map(Segment::duration).sum()
}
