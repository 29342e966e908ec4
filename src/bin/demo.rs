//! Demo emitter, first variant: traces and metrics over OTLP/HTTP.
//!
//! Loops forever emitting one parent/child span pair, one counter increment,
//! and one histogram sample per iteration, then pauses. Ctrl+C flushes and
//! shuts the pipeline down.
//!
//! Run with: cargo run --bin demo

use otel_demo::{DemoBuilder, Workload};
use signal_hook::consts::SIGINT;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let stop = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGINT, Arc::clone(&stop))?;

    let builder = DemoBuilder::new()
        .with_file("demo.toml")
        .with_standard_env()
        .logs(false);

    let config = builder.extract_config()?;
    println!(
        "Starting Rust demo (sending to {})...",
        config.effective_endpoint()
    );

    let guard = builder.build()?;

    let meter = opentelemetry::global::meter("demo");
    let mut workload = Workload::new(&meter, config.workload);

    println!("Sending telemetry data... (Ctrl+C to stop)");
    println!("Check Grafana at http://localhost:3000");

    workload.run(&stop);

    println!("\nShutting down...");
    guard.shutdown()?;

    Ok(())
}
