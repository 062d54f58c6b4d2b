pub mod geometry;
pub mod interval;

pub use geometry::GeometryHelper;
pub use interval::IntervalHelper;
