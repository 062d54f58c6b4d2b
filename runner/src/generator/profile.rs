use crate::workflow::runner::SessionData;
use anyhow::ensure;
use fformcore::interface::{DeviceId, PositionRecord, Segment};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::{PI, TAU};

/// Shape of a synthetic conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionProfile {
    pub session_name: String,
    pub devices: usize,
    pub duration_secs: f64,
    /// Positioning clock at audio time zero.
    pub start_timestamp: f64,
    pub sample_period: f64,
    /// Radius of the circle the participants stand on.
    pub radius: f64,
    pub noise: f64,
    pub seed: u64,
}

impl Default for SessionProfile {
    fn default() -> Self {
        Self {
            session_name: "synthetic".into(),
            devices: 3,
            duration_secs: 300.0,
            start_timestamp: 1_600_000_000.0,
            sample_period: 0.25,
            radius: 0.8,
            noise: 0.03,
            seed: 0,
        }
    }
}

impl SessionProfile {
    pub fn device_ids(&self) -> Vec<DeviceId> {
        (1..=self.devices as DeviceId).collect()
    }

    /// The last participant looks out of the group during the middle third.
    fn turned_away(&self, device_index: usize, elapsed: f64) -> bool {
        device_index + 1 == self.devices
            && elapsed >= self.duration_secs / 3.0
            && elapsed < 2.0 * self.duration_secs / 3.0
    }
}

fn jitter(rng: &mut StdRng, noise: f64) -> f64 {
    if noise > 0.0 {
        rng.gen_range(-noise..noise)
    } else {
        0.0
    }
}

fn build_positions(profile: &SessionProfile, rng: &mut StdRng) -> Vec<PositionRecord> {
    let ids = profile.device_ids();
    let steps = (profile.duration_secs / profile.sample_period).floor() as usize;
    let mut records = Vec::with_capacity(ids.len() * (steps + 1));

    for step in 0..=steps {
        let elapsed = step as f64 * profile.sample_period;
        for (index, &device_id) in ids.iter().enumerate() {
            let angle = TAU * index as f64 / ids.len() as f64;
            let facing = if profile.turned_away(index, elapsed) {
                angle
            } else {
                angle + PI
            };
            records.push(PositionRecord::new(
                device_id,
                profile.start_timestamp + elapsed,
                profile.radius * angle.cos() + jitter(rng, profile.noise),
                profile.radius * angle.sin() + jitter(rng, profile.noise),
                (facing + jitter(rng, profile.noise)).rem_euclid(TAU),
            ));
        }
    }
    records
}

/// Turn-taking speech: utterances split into short chunks with pauses below
/// the default merge threshold, occasionally overlapping the previous turn.
fn build_speech(profile: &SessionProfile, rng: &mut StdRng) -> BTreeMap<DeviceId, Vec<Segment>> {
    let ids = profile.device_ids();
    let mut speech: BTreeMap<DeviceId, Vec<Segment>> =
        ids.iter().map(|&id| (id, Vec::new())).collect();

    let mut cursor = 1.0;
    let mut previous: Option<DeviceId> = None;
    while cursor < profile.duration_secs - 1.0 {
        let candidates: Vec<DeviceId> = ids.iter().copied().filter(|&id| Some(id) != previous).collect();
        let speaker = candidates[rng.gen_range(0..candidates.len())];
        let end = (cursor + rng.gen_range(1.0..6.0)).min(profile.duration_secs);

        let mut start = cursor;
        while start < end {
            let chunk_end = (start + rng.gen_range(0.6..2.0)).min(end);
            speech.entry(speaker).or_default().push(Segment::new(start, chunk_end));
            start = chunk_end + rng.gen_range(0.05..0.3);
        }

        previous = Some(speaker);
        cursor = (end + rng.gen_range(-1.0..2.5)).max(0.0);
    }
    speech
}

pub fn build_session(profile: &SessionProfile) -> anyhow::Result<SessionData> {
    ensure!(profile.devices >= 2, "a session needs at least two devices");
    ensure!(
        profile.duration_secs > 2.0 && profile.sample_period > 0.0,
        "session duration must exceed two seconds and the sample period must be positive"
    );

    let mut rng = StdRng::seed_from_u64(profile.seed);
    let positions = build_positions(profile, &mut rng);
    let speech = build_speech(profile, &mut rng);

    Ok(SessionData {
        session_name: profile.session_name.clone(),
        device_ids: profile.device_ids(),
        positions,
        speech,
    })
}
