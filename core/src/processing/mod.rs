pub mod classifier;
pub mod features;
pub mod formation;
pub mod interpolate;
pub mod merge;
pub mod relation;
pub mod targets;

pub use classifier::{speaking_time, BehaviorClassifier, EventTally};
pub use features::{Feature, FeatureInput, FeatureSet, FeatureStage};
pub use formation::{in_formation, FormationMatrix, FormationParams, FormationStage};
pub use interpolate::{interpolate_trajectory, InterpolationStage};
pub use merge::{merge_segments, MergeStage};
pub use relation::{Pairing, Relation};
pub use targets::{formation_targets, FORMATION_COVERAGE};
