//! Metrics for the allocation engine
//!
//! Lightweight atomic counters the engine updates as passes and sweeps run.
//! The Prometheus exporter (observability crate) is a separate, optional
//! concern wired up by the binary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Simple atomic counter
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, amount: u64) {
        self.value.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Simple gauge for current values
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicU64,
}

impl Gauge {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn set(&self, value: u64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Latency histogram (count/sum/min/max)
#[derive(Debug)]
pub struct Histogram {
    count: AtomicU64,
    sum: AtomicU64,
    min: AtomicU64,
    max: AtomicU64,
}

impl Histogram {
    pub fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: AtomicU64::new(0),
            min: AtomicU64::new(u64::MAX),
            max: AtomicU64::new(0),
        }
    }

    pub fn record(&self, value_us: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(value_us, Ordering::Relaxed);
        self.min.fetch_min(value_us, Ordering::Relaxed);
        self.max.fetch_max(value_us, Ordering::Relaxed);
    }

    pub fn stats(&self) -> HistogramStats {
        let count = self.count.load(Ordering::Relaxed);
        let sum = self.sum.load(Ordering::Relaxed);

        HistogramStats {
            count,
            sum_us: sum,
            avg_us: if count > 0 { sum / count } else { 0 },
            min_us: if count > 0 {
                self.min.load(Ordering::Relaxed)
            } else {
                0
            },
            max_us: self.max.load(Ordering::Relaxed),
        }
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HistogramStats {
    pub count: u64,
    pub sum_us: u64,
    pub avg_us: u64,
    pub min_us: u64,
    pub max_us: u64,
}

/// Metrics for the allocation engine
#[derive(Debug, Default)]
pub struct EngineMetrics {
    pub passes_run: Counter,
    pub orders_fulfilled: Counter,
    pub doses_allocated: Counter,
    pub sweeps_run: Counter,
    pub orders_expired: Counter,
    pub pass_latency: Histogram,
    pub open_orders: Gauge,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pass(&self, orders_fulfilled: u64, doses_allocated: u64, elapsed: Duration) {
        self.passes_run.increment();
        self.orders_fulfilled.add(orders_fulfilled);
        self.doses_allocated.add(doses_allocated);
        self.pass_latency.record(elapsed.as_micros() as u64);
    }

    pub fn record_sweep(&self, orders_expired: u64) {
        self.sweeps_run.increment();
        self.orders_expired.add(orders_expired);
    }

    pub fn set_open_orders(&self, count: u64) {
        self.open_orders.set(count);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let latency = self.pass_latency.stats();

        MetricsSnapshot {
            passes_run: self.passes_run.get(),
            orders_fulfilled: self.orders_fulfilled.get(),
            doses_allocated: self.doses_allocated.get(),
            sweeps_run: self.sweeps_run.get(),
            orders_expired: self.orders_expired.get(),
            pass_latency_avg_us: latency.avg_us,
            pass_latency_max_us: latency.max_us,
            open_orders: self.open_orders.get(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    pub passes_run: u64,
    pub orders_fulfilled: u64,
    pub doses_allocated: u64,
    pub sweeps_run: u64,
    pub orders_expired: u64,
    pub pass_latency_avg_us: u64,
    pub pass_latency_max_us: u64,
    pub open_orders: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_and_gauge() {
        let metrics = EngineMetrics::new();
        metrics.record_pass(2, 150, Duration::from_micros(40));
        metrics.record_pass(1, 30, Duration::from_micros(60));
        metrics.record_sweep(3);
        metrics.set_open_orders(7);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.passes_run, 2);
        assert_eq!(snapshot.orders_fulfilled, 3);
        assert_eq!(snapshot.doses_allocated, 180);
        assert_eq!(snapshot.sweeps_run, 1);
        assert_eq!(snapshot.orders_expired, 3);
        assert_eq!(snapshot.pass_latency_avg_us, 50);
        assert_eq!(snapshot.pass_latency_max_us, 60);
        assert_eq!(snapshot.open_orders, 7);
    }

    #[test]
    fn test_empty_histogram_stats() {
        let histogram = Histogram::new();
        let stats = histogram.stats();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.avg_us, 0);
        assert_eq!(stats.min_us, 0);
    }
}
