//! Demo emitter, second variant: traces, metrics, and logs over OTLP/HTTP.
//!
//! Identical to the first variant except that the log signal stays enabled,
//! so events emitted in the loop are also exported as OTLP log records, and
//! the shutdown closes the logger provider first.
//!
//! Run with: cargo run --bin demo-logs

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
        .service_name("rust-demo-logs");

    let config = builder.extract_config()?;
    println!(
        "Starting Rust demo with logs (sending to {})...",
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
