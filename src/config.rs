//! Configuration types for the demo telemetry pipeline.
//!
//! These types are designed to be deserialised from multiple sources using
//! figment, supporting layered configuration from defaults, files, and
//! environment variables. The compiled defaults reproduce the demo's fixed
//! constants, so a bare `DemoConfig::default()` points at a local collector.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Resource attribute detection mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceDetection {
    /// Run the host, OS, and process detectors.
    #[default]
    Auto,
    /// No automatic detection - only use explicitly configured attributes.
    None,
}

/// OTLP export encoding. Both variants ship over HTTP to port 4318.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// HTTP with Protocol Buffers encoding.
    #[default]
    #[serde(alias = "http_binary", alias = "http-binary")]
    HttpBinary,
    /// HTTP with JSON encoding.
    #[serde(alias = "http_json", alias = "http-json")]
    HttpJson,
}

impl Protocol {
    /// Returns the default endpoint for this protocol.
    #[must_use]
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Protocol::HttpBinary | Protocol::HttpJson => "http://localhost:4318",
        }
    }
}

/// Complete configuration for the demo pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Endpoint configuration.
    pub endpoint: EndpointConfig,

    /// Resource configuration.
    pub resource: ResourceConfig,

    /// Traces configuration.
    pub traces: SignalConfig,

    /// Metrics configuration.
    pub metrics: SignalConfig,

    /// Logs configuration.
    pub logs: SignalConfig,

    /// Synthetic workload configuration.
    pub workload: WorkloadConfig,

    /// Whether to initialise the tracing subscriber.
    pub init_tracing_subscriber: bool,

    /// Name for the instrumentation scope (otel.library.name).
    /// Defaults to the service name.
    pub instrumentation_scope_name: Option<String>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            resource: ResourceConfig::default(),
            traces: SignalConfig::default_enabled(),
            metrics: SignalConfig::default_enabled(),
            logs: SignalConfig::default_enabled(),
            workload: WorkloadConfig::default(),
            init_tracing_subscriber: true,
            instrumentation_scope_name: None,
        }
    }
}

impl DemoConfig {
    /// Returns the effective endpoint URL, using protocol defaults if not specified.
    #[must_use]
    pub fn effective_endpoint(&self) -> String {
        self.endpoint
            .url
            .clone()
            .unwrap_or_else(|| self.endpoint.protocol.default_endpoint().to_string())
    }

    /// Returns the endpoint URL for a specific signal type.
    ///
    /// Signal paths (`/v1/traces`, `/v1/metrics`, `/v1/logs`) are appended
    /// to the base endpoint.
    #[must_use]
    pub fn signal_endpoint(&self, signal_path: &str) -> String {
        let base = self.effective_endpoint();
        let base = base.trim_end_matches('/');
        format!("{base}{signal_path}")
    }

    /// Returns the instrumentation scope name, falling back to the service name.
    #[must_use]
    pub fn scope_name(&self) -> String {
        self.instrumentation_scope_name
            .clone()
            .unwrap_or_else(|| self.resource.service_name.clone())
    }
}

/// Endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// OTLP endpoint URL. Defaults to `http://localhost:4318`.
    pub url: Option<String>,

    /// Export encoding.
    pub protocol: Protocol,

    /// Request timeout.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// HTTP headers for authentication or customisation.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: None,
            protocol: Protocol::default(),
            timeout: Duration::from_secs(10),
            headers: HashMap::new(),
        }
    }
}

/// Resource configuration.
///
/// The defaults identify the demo the way the original scripts do: a
/// `rust-demo` service in the `homelab` namespace, deployed `local`ly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Service name (`service.name`).
    pub service_name: String,

    /// Service namespace (`service.namespace`).
    pub service_namespace: String,

    /// Deployment environment (`deployment.environment.name`).
    pub deployment_environment: String,

    /// Additional resource attributes.
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Automatic resource detection mode.
    #[serde(default)]
    pub detection: ResourceDetection,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            service_name: "rust-demo".to_string(),
            service_namespace: "homelab".to_string(),
            deployment_environment: "local".to_string(),
            attributes: HashMap::new(),
            detection: ResourceDetection::default(),
        }
    }
}

/// Configuration for an individual signal type (traces, metrics, logs).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Whether this signal is enabled.
    pub enabled: bool,

    /// Batch export configuration. For metrics, `scheduled_delay` doubles as
    /// the periodic export interval.
    pub batch: BatchConfig,
}

impl SignalConfig {
    /// Creates a default config with the signal enabled.
    #[must_use]
    pub fn default_enabled() -> Self {
        Self {
            enabled: true,
            batch: BatchConfig::default(),
        }
    }
}

/// Batch exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum queue size.
    pub max_queue_size: usize,

    /// Maximum batch size for export.
    pub max_export_batch_size: usize,

    /// Scheduled delay between exports.
    #[serde(with = "humantime_serde")]
    pub scheduled_delay: Duration,

    /// Maximum time to wait for export to complete.
    #[serde(with = "humantime_serde")]
    pub export_timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 2048,
            max_export_batch_size: 512,
            scheduled_delay: Duration::from_secs(5),
            export_timeout: Duration::from_secs(30),
        }
    }
}

/// Synthetic workload configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Lower bound of the simulated latency, in milliseconds (inclusive).
    pub latency_min_ms: f64,

    /// Upper bound of the simulated latency, in milliseconds (exclusive).
    pub latency_max_ms: f64,

    /// Latencies above this value emit a warning-level log record.
    pub slow_threshold_ms: f64,

    /// Pause between loop iterations.
    #[serde(with = "humantime_serde")]
    pub iteration_pause: Duration,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            latency_min_ms: 10.0,
            latency_max_ms: 200.0,
            slow_threshold_ms: 150.0,
            iteration_pause: Duration::from_secs(2),
        }
    }
}
