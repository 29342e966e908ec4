//! The synthetic demo workload.
//!
//! Each iteration produces one `demo-operation` span wrapping a
//! `process-data` child that simulates work by sleeping a randomly sampled
//! latency, then records one counter increment and one histogram sample.
//! Latencies above the configured threshold additionally emit a
//! warning-level event.
//!
//! Spans and events flow through the `tracing` macros, so they reach
//! whatever subscriber [`TelemetryGuard`](crate::TelemetryGuard) installed;
//! the workload itself only holds its two instruments and its config.

use crate::config::WorkloadConfig;
use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram, Meter};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// The synthetic request generator.
pub struct Workload {
    requests: Counter<u64>,
    latency: Histogram<f64>,
    config: WorkloadConfig,
    count: u64,
}

impl Workload {
    /// Creates the workload and its instruments from a meter.
    pub fn new(meter: &Meter, config: WorkloadConfig) -> Self {
        let requests = meter
            .u64_counter("demo.requests")
            .with_description("Number of demo requests")
            .build();

        let latency = meter
            .f64_histogram("demo.latency")
            .with_description("Request latency in ms")
            .with_unit("ms")
            .build();

        Self {
            requests,
            latency,
            config,
            count: 0,
        }
    }

    /// Runs iterations until `stop` is raised.
    ///
    /// Each iteration samples a latency, runs the iteration body, prints a
    /// progress line, and pauses. The pause is sliced so an interrupt is
    /// honoured promptly.
    pub fn run(&mut self, stop: &AtomicBool) {
        let mut rng = rand::rng();

        while !stop.load(Ordering::Relaxed) {
            let latency_ms = sample_latency(&mut rng, &self.config);
            let count = self.run_iteration(latency_ms);

            println!("[{count}] Sent trace and metrics (latency: {latency_ms:.1}ms)");

            if !pause(stop, self.config.iteration_pause) {
                break;
            }
        }
    }

    /// Runs a single iteration with the given simulated latency and returns
    /// the iteration number.
    pub fn run_iteration(&mut self, latency_ms: f64) -> u64 {
        self.count += 1;

        let span = tracing::info_span!(
            "demo-operation",
            request.id = self.count,
            request.latency_ms = latency_ms,
        );
        let _parent = span.enter();

        {
            let _child = tracing::info_span!("process-data").entered();
            thread::sleep(Duration::from_secs_f64(latency_ms / 1000.0));
        }

        self.requests.add(1, &[KeyValue::new("status", "success")]);
        self.latency
            .record(latency_ms, &[KeyValue::new("endpoint", "/demo")]);

        if is_slow(latency_ms, &self.config) {
            tracing::warn!(
                request.id = self.count,
                latency_ms,
                "Simulated latency exceeded threshold"
            );
        }

        self.count
    }

    /// Returns the number of iterations run so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }
}

fn sample_latency<R: Rng>(rng: &mut R, config: &WorkloadConfig) -> f64 {
    rng.random_range(config.latency_min_ms..config.latency_max_ms)
}

fn is_slow(latency_ms: f64, config: &WorkloadConfig) -> bool {
    latency_ms > config.slow_threshold_ms
}

/// Sleeps for `total` in short slices, bailing out early when `stop` is
/// raised. Returns `false` if the sleep was interrupted.
fn pause(stop: &AtomicBool, total: Duration) -> bool {
    const SLICE: Duration = Duration::from_millis(50);

    let mut remaining = total;
    while !remaining.is_zero() {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let step = remaining.min(SLICE);
        thread::sleep(step);
        remaining -= step;
    }

    !stop.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn sampled_latencies_stay_in_range() {
        let config = WorkloadConfig::default();
        let mut rng = rand::rng();

        for _ in 0..1000 {
            let latency = sample_latency(&mut rng, &config);
            assert!(latency >= config.latency_min_ms);
            assert!(latency < config.latency_max_ms);
        }
    }

    #[test]
    fn slow_threshold_is_exclusive() {
        let config = WorkloadConfig::default();

        assert!(!is_slow(150.0, &config));
        assert!(is_slow(150.1, &config));
        assert!(!is_slow(10.0, &config));
        assert!(is_slow(199.9, &config));
    }

    #[test]
    fn pause_runs_to_completion_when_not_stopped() {
        let stop = AtomicBool::new(false);
        assert!(pause(&stop, Duration::from_millis(10)));
    }

    #[test]
    fn pause_bails_out_when_stopped() {
        let stop = AtomicBool::new(true);
        assert!(!pause(&stop, Duration::from_secs(60)));
    }
}
