use std::sync::Mutex;

/// Counters of per-speaker feature computations.
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub computed: usize,
    pub failed: usize,
    pub skipped_features: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_computed(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.computed += 1;
        }
    }

    pub fn record_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.failed += 1;
        }
    }

    pub fn record_skipped_feature(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.skipped_features += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().map(|m| *m).unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_counts_every_outcome() {
        let metrics = MetricsRecorder::new();
        metrics.record_computed();
        metrics.record_computed();
        metrics.record_failure();
        metrics.record_skipped_feature();

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                computed: 2,
                failed: 1,
                skipped_features: 1,
            }
        );
    }
}
