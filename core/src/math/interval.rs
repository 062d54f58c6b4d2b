pub struct IntervalHelper;

impl IntervalHelper {
    /// Merges closed intervals whose spans touch or cross.
    pub fn union(intervals: &[(f64, f64)]) -> Vec<(f64, f64)> {
        let mut sorted = intervals.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut merged: Vec<(f64, f64)> = Vec::with_capacity(sorted.len());
        for (start, end) in sorted {
            match merged.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }
        merged
    }

    /// Total length covered by the union of closed intervals.
    pub fn union_length(intervals: &[(f64, f64)]) -> f64 {
        Self::union(intervals)
            .iter()
            .map(|(start, end)| end - start)
            .sum()
    }
}
