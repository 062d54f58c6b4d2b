pub mod pozyx;
pub mod speech;
pub mod tables;
pub mod trajectory;

pub use pozyx::decode_position_log;
pub use speech::{prepare_segments, Segment};
pub use tables::{FeatureRow, FormationRow};
pub use trajectory::{DeviceId, PositionRecord, Trajectory, TrajectorySample};
