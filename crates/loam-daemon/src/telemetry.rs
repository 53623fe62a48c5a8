//! Per-method request counters, flushed periodically through tracing.

use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Default, Clone, Copy)]
struct MethodStats {
    count: u64,
    errors: u64,
    total: Duration,
}

#[derive(Debug, Default)]
pub struct RequestMetrics {
    methods: HashMap<&'static str, MethodStats>,
    dirty: bool,
}

impl RequestMetrics {
    pub fn record(&mut self, method: &'static str, elapsed: Duration, is_error: bool) {
        let stats = self.methods.entry(method).or_default();
        stats.count += 1;
        stats.total += elapsed;
        if is_error {
            stats.errors += 1;
        }
        self.dirty = true;
    }

    /// Emit one line per method seen since the last flush.
    pub fn flush(&mut self) {
        if !self.dirty {
            return;
        }
        for (method, stats) in &self.methods {
            tracing::info!(
                target = "loam.daemon.telemetry",
                method,
                count = stats.count,
                errors = stats.errors,
                total_ms = stats.total.as_millis() as u64,
                "request stats"
            );
        }
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_clears_the_dirty_flag_but_keeps_totals() {
        let mut metrics = RequestMetrics::default();
        metrics.record("hover", Duration::from_millis(3), false);
        metrics.record("hover", Duration::from_millis(4), true);
        metrics.flush();
        assert!(!metrics.dirty);

        let stats = metrics.methods["hover"];
        assert_eq!(stats.count, 2);
        assert_eq!(stats.errors, 1);
    }
}
