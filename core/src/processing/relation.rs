//! Interval relations between a speaker's utterance and another speaker's utterance.
//!
//! The relation is decided once per pair from the signs of the four endpoint
//! offsets, in a fixed precedence order, so that boundary equalities always
//! resolve the same way. Each behavioural feature then reads its outcome from
//! the relation instead of re-testing the offsets.

use crate::interface::Segment;

/// Where the target utterance `T` lies relative to the main utterance `S`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// `T` lies inside `S` (shared endpoints allowed).
    TargetWithin,
    /// `T` starts before `S` and ends strictly inside it.
    TargetLeadsIn,
    /// `T` starts strictly inside `S` and ends after it.
    TargetRunsOn,
    /// `T` covers all of `S`.
    TargetContains,
    /// `T` starts at or after the end of `S`.
    TargetFollows,
    /// `T` ends at or before the start of `S`.
    TargetPrecedes,
    /// Offsets that fit no pattern, which only happens with non-finite bounds.
    Unrelated,
}

/// Signed endpoint offsets of a main utterance against a target utterance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offsets {
    /// main start - target start
    pub d00: f64,
    /// main start - target end
    pub d01: f64,
    /// main end - target start
    pub d10: f64,
    /// main end - target end
    pub d11: f64,
}

impl Offsets {
    pub fn between(main: &Segment, target: &Segment) -> Self {
        Self {
            d00: main.start - target.start,
            d01: main.start - target.end,
            d10: main.end - target.start,
            d11: main.end - target.end,
        }
    }
}

/// A classified pair of utterances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pairing {
    pub main: Segment,
    pub target: Segment,
    pub relation: Relation,
}

impl Pairing {
    pub fn classify(main: &Segment, target: &Segment) -> Self {
        Self {
            main: *main,
            target: *target,
            relation: Relation::of(&Offsets::between(main, target)),
        }
    }

    /// Region of simultaneous speech, if the utterances overlap at all.
    pub fn overlap_region(&self) -> Option<(f64, f64)> {
        let (s, t) = (&self.main, &self.target);
        match self.relation {
            Relation::TargetWithin => Some((t.start, t.end)),
            Relation::TargetLeadsIn => Some((s.start, t.end)),
            Relation::TargetRunsOn => Some((t.start, s.end)),
            Relation::TargetContains => Some((s.start, s.end)),
            _ => None,
        }
    }

    /// The main utterance connects to the target: the target either sits
    /// inside it, or the main utterance is the longer one and hands over to
    /// the target by overlapping into it or by pausing less than
    /// `connected_threshold` before it starts.
    pub fn is_connected(&self, connected_threshold: f64) -> bool {
        let longer = self.main.duration() > self.target.duration();
        match self.relation {
            Relation::TargetWithin => true,
            Relation::TargetRunsOn => longer,
            Relation::TargetFollows => {
                self.target.start - self.main.end < connected_threshold && longer
            }
            _ => false,
        }
    }

    /// Evidence that the main utterance is addressed to the target's speaker:
    /// any overlap, or a pause shorter than `connected_threshold` on either side.
    pub fn is_addressed(&self, connected_threshold: f64) -> bool {
        match self.relation {
            Relation::TargetWithin
            | Relation::TargetLeadsIn
            | Relation::TargetRunsOn
            | Relation::TargetContains => true,
            Relation::TargetFollows => self.target.start - self.main.end < connected_threshold,
            Relation::TargetPrecedes => self.main.start - self.target.end < connected_threshold,
            Relation::Unrelated => false,
        }
    }
}

impl Relation {
    /// First matching pattern wins.
    pub fn of(o: &Offsets) -> Self {
        if o.d00 <= 0.0 && o.d01 < 0.0 && o.d10 > 0.0 && o.d11 >= 0.0 {
            Relation::TargetWithin
        } else if o.d00 > 0.0 && o.d01 < 0.0 && o.d10 > 0.0 && o.d11 > 0.0 {
            Relation::TargetLeadsIn
        } else if o.d00 < 0.0 && o.d01 < 0.0 && o.d10 > 0.0 && o.d11 < 0.0 {
            Relation::TargetRunsOn
        } else if o.d00 >= 0.0 && o.d01 <= 0.0 && o.d10 >= 0.0 && o.d11 <= 0.0 {
            Relation::TargetContains
        } else if o.d00 <= 0.0 && o.d01 <= 0.0 && o.d10 <= 0.0 && o.d11 <= 0.0 {
            Relation::TargetFollows
        } else if o.d00 >= 0.0 && o.d01 >= 0.0 && o.d10 >= 0.0 && o.d11 >= 0.0 {
            Relation::TargetPrecedes
        } else {
            Relation::Unrelated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(main: (f64, f64), target: (f64, f64)) -> Relation {
        let (main, target) = (Segment::new(main.0, main.1), Segment::new(target.0, target.1));
        Pairing::classify(&main, &target).relation
    }

    #[test]
    fn relations_for_proper_intervals() {
        assert_eq!(relation((0.0, 10.0), (2.0, 3.0)), Relation::TargetWithin);
        assert_eq!(relation((5.0, 10.0), (2.0, 7.0)), Relation::TargetLeadsIn);
        assert_eq!(relation((0.0, 5.0), (3.0, 8.0)), Relation::TargetRunsOn);
        assert_eq!(relation((2.0, 3.0), (0.0, 10.0)), Relation::TargetContains);
        assert_eq!(relation((0.0, 5.0), (6.0, 10.0)), Relation::TargetFollows);
        assert_eq!(relation((6.0, 10.0), (0.0, 5.0)), Relation::TargetPrecedes);
    }

    #[test]
    fn boundary_ties_resolve_in_precedence_order() {
        // identical utterances: inside wins over containment
        assert_eq!(relation((1.0, 4.0), (1.0, 4.0)), Relation::TargetWithin);
        // shared start, target ends later: containment
        assert_eq!(relation((1.0, 4.0), (1.0, 6.0)), Relation::TargetContains);
        // shared end, target starts earlier: containment
        assert_eq!(relation((3.0, 6.0), (1.0, 6.0)), Relation::TargetContains);
        // meeting end to start
        assert_eq!(relation((0.0, 5.0), (5.0, 8.0)), Relation::TargetFollows);
        assert_eq!(relation((5.0, 8.0), (0.0, 5.0)), Relation::TargetPrecedes);
        // instantaneous main utterance at the target's start
        assert_eq!(relation((2.0, 2.0), (2.0, 5.0)), Relation::TargetContains);
        assert_eq!(relation((0.0, 1.0), (f64::NAN, 2.0)), Relation::Unrelated);
    }

    #[test]
    fn overlap_regions_follow_relation() {
        let region = |main: (f64, f64), target: (f64, f64)| {
            Pairing::classify(&Segment::new(main.0, main.1), &Segment::new(target.0, target.1))
                .overlap_region()
        };
        assert_eq!(region((0.0, 10.0), (2.0, 3.0)), Some((2.0, 3.0)));
        assert_eq!(region((5.0, 10.0), (2.0, 7.0)), Some((5.0, 7.0)));
        assert_eq!(region((0.0, 5.0), (3.0, 8.0)), Some((3.0, 5.0)));
        assert_eq!(region((2.0, 3.0), (0.0, 10.0)), Some((2.0, 3.0)));
        assert_eq!(region((0.0, 5.0), (5.0, 8.0)), None);
    }

    #[test]
    fn connection_requires_the_longer_main_utterance() {
        let pair = |main: (f64, f64), target: (f64, f64)| {
            Pairing::classify(&Segment::new(main.0, main.1), &Segment::new(target.0, target.1))
        };
        assert!(pair((0.0, 5.0), (6.0, 10.0)).is_connected(1.5));
        assert!(!pair((0.0, 3.0), (4.0, 10.0)).is_connected(1.5));
        assert!(!pair((0.0, 5.0), (7.0, 8.0)).is_connected(1.5));
        assert!(pair((0.0, 6.0), (3.0, 8.0)).is_connected(1.5));
        assert!(!pair((0.0, 4.0), (3.0, 9.0)).is_connected(1.5));
        // the target speaking first never connects the main utterance
        assert!(!pair((6.0, 20.0), (0.0, 5.0)).is_connected(1.5));
        assert!(!pair((5.0, 20.0), (0.0, 7.0)).is_connected(1.5));
    }

    #[test]
    fn addressing_accepts_short_pauses_on_both_sides() {
        let pair = |main: (f64, f64), target: (f64, f64)| {
            Pairing::classify(&Segment::new(main.0, main.1), &Segment::new(target.0, target.1))
        };
        assert!(pair((0.0, 3.0), (4.0, 10.0)).is_addressed(1.5));
        assert!(pair((6.0, 9.0), (0.0, 5.0)).is_addressed(1.5));
        assert!(!pair((0.0, 3.0), (5.0, 10.0)).is_addressed(1.5));
        assert!(!pair((8.0, 9.0), (0.0, 5.0)).is_addressed(1.5));
        assert!(pair((2.0, 3.0), (0.0, 10.0)).is_addressed(1.5));
    }
}
