use std::f64::consts::TAU;

pub struct GeometryHelper;

impl GeometryHelper {
    pub fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
        (b.0 - a.0).hypot(b.1 - a.1)
    }

    /// Mirrors a heading recorded with the opposite rotational sense.
    pub fn correct_heading(heading: f64) -> f64 {
        TAU - heading
    }

    /// Angle in degrees between the observer's heading and the direction to `target`.
    ///
    /// Returns `None` when the two positions coincide.
    pub fn bearing_offset_deg(observer: (f64, f64), heading: f64, target: (f64, f64)) -> Option<f64> {
        let to_target = (target.0 - observer.0, target.1 - observer.1);
        let norm = to_target.0.hypot(to_target.1);
        if norm == 0.0 || !norm.is_finite() {
            return None;
        }
        let facing = (heading.cos(), heading.sin());
        let facing_norm = facing.0.hypot(facing.1);
        let cosine = (to_target.0 * facing.0 + to_target.1 * facing.1) / (norm * facing_norm);
        Some(cosine.clamp(-1.0, 1.0).acos().to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn bearing_offset_for_facing_and_perpendicular_targets() {
        let ahead = GeometryHelper::bearing_offset_deg((0.0, 0.0), 0.0, (3.0, 0.0)).unwrap();
        assert!(ahead.abs() < 1e-9);

        let side = GeometryHelper::bearing_offset_deg((0.0, 0.0), FRAC_PI_2, (3.0, 0.0)).unwrap();
        assert!((side - 90.0).abs() < 1e-9);

        let behind = GeometryHelper::bearing_offset_deg((1.0, 0.0), 0.0, (0.0, 0.0)).unwrap();
        assert!((behind - 180.0).abs() < 1e-9);
    }

    #[test]
    fn coincident_positions_have_no_bearing() {
        assert!(GeometryHelper::bearing_offset_deg((1.0, 1.0), PI, (1.0, 1.0)).is_none());
    }

    #[test]
    fn correction_mirrors_heading() {
        assert!((GeometryHelper::correct_heading(FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < 1e-12);
        assert_eq!(GeometryHelper::distance((0.0, 0.0), (3.0, 4.0)), 5.0);
    }
}
