//! Synthetic OTLP telemetry generator for a local observability stack.
//!
//! Wires together the OpenTelemetry SDK, OTLP/HTTP exporters, and `tracing`
//! into a small pipeline with automatic lifecycle management, plus a
//! synthetic workload that exercises it: one parent/child span pair, one
//! counter increment, and one histogram sample per iteration, at randomized
//! latencies.
//!
//! # Example
//!
//! ```no_run
//! use otel_demo::{DemoBuilder, DemoError, Workload};
//!
//! fn main() -> Result<(), DemoError> {
//!     let guard = DemoBuilder::new()
//!         .service_name("rust-demo")
//!         .build()?;
//!
//!     let meter = opentelemetry::global::meter("demo");
//!     let mut workload = Workload::new(&meter, Default::default());
//!     workload.run_iteration(42.0);
//!
//!     guard.shutdown()?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod guard;
mod workload;

pub use builder::DemoBuilder;
pub use config::{
    BatchConfig, DemoConfig, EndpointConfig, Protocol, ResourceConfig, ResourceDetection,
    SignalConfig, WorkloadConfig,
};
pub use error::DemoError;
pub use guard::TelemetryGuard;
pub use workload::Workload;

/// Re-exported for version compatibility with this crate's dependencies.
pub use opentelemetry;
/// Re-exported for version compatibility with this crate's dependencies.
pub use opentelemetry_sdk;
/// Re-exported for version compatibility with this crate's dependencies.
pub use tracing;

/// Re-exported for users who want to construct custom configuration providers.
pub use figment;
