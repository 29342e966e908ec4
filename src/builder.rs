//! Builder for the demo telemetry pipeline.
//!
//! The builder supports layered configuration from multiple sources:
//! 1. Compiled defaults (the demo's fixed constants)
//! 2. Configuration files (TOML)
//! 3. Environment variables
//! 4. Programmatic overrides
//!
//! Sources are merged in order, with later sources taking precedence.

use crate::DemoError;
use crate::config::{DemoConfig, Protocol, ResourceDetection};
use crate::guard::TelemetryGuard;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use std::path::Path;

/// Builder for configuring and initialising the demo telemetry pipeline.
///
/// # Example
///
/// ```no_run
/// use otel_demo::{DemoBuilder, DemoError};
///
/// fn main() -> Result<(), DemoError> {
///     // Simple case - uses defaults (localhost:4318)
///     let _guard = DemoBuilder::new().build()?;
///
///     // With environment variables
///     let _guard = DemoBuilder::new()
///         .with_standard_env()
///         .build()?;
///
///     // Full configuration
///     let _guard = DemoBuilder::new()
///         .with_file("./demo.toml")
///         .with_standard_env()
///         .endpoint("http://collector:4318")
///         .service_name("rust-demo")
///         .build()?;
///
///     Ok(())
/// }
/// ```
#[must_use = "builders do nothing unless .build() is called"]
pub struct DemoBuilder {
    figment: Figment,
    resource_attributes: std::collections::HashMap<String, String>,
}

impl DemoBuilder {
    /// Creates a new builder with default configuration.
    ///
    /// Defaults include:
    /// - Endpoint: `http://localhost:4318` (HTTP with protobuf encoding)
    /// - All signals enabled (traces, metrics, logs)
    /// - Tracing subscriber initialisation enabled
    /// - Metric export every 5s, iteration pause 2s, latency range [10, 200) ms
    pub fn new() -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(DemoConfig::default())),
            resource_attributes: std::collections::HashMap::new(),
        }
    }

    /// Creates a builder from an existing figment.
    ///
    /// This allows power users to construct complex configuration chains
    /// before passing them to the builder.
    pub fn from_figment(figment: Figment) -> Self {
        Self {
            figment,
            resource_attributes: std::collections::HashMap::new(),
        }
    }

    /// Merges configuration from a TOML file.
    ///
    /// If the file doesn't exist, it's silently skipped. This allows optional
    /// configuration files that may or may not be present.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        if path.exists() {
            self.figment = self.figment.merge(Toml::file(path));
        }
        self
    }

    /// Merges configuration from environment variables with the given prefix.
    ///
    /// Environment variables are split on underscores to match nested config.
    /// For example, with prefix `DEMO_`:
    /// - `DEMO_ENDPOINT_URL` → `endpoint.url`
    /// - `DEMO_TRACES_ENABLED` → `traces.enabled`
    /// - `DEMO_WORKLOAD_ITERATION_PAUSE` → `workload.iteration_pause`
    pub fn with_env(mut self, prefix: &str) -> Self {
        self.figment = self.figment.merge(Env::prefixed(prefix).split("_"));
        self
    }

    /// Merges configuration from standard OpenTelemetry environment variables.
    ///
    /// This reads the standard `OTEL_*` environment variables as defined by
    /// the OpenTelemetry specification:
    /// - `OTEL_EXPORTER_OTLP_ENDPOINT` → endpoint URL
    /// - `OTEL_EXPORTER_OTLP_PROTOCOL` → encoding (http/protobuf, http/json)
    /// - `OTEL_SERVICE_NAME` → service name
    /// - `OTEL_TRACES_EXPORTER` → traces exporter (otlp, none)
    /// - `OTEL_METRICS_EXPORTER` → metrics exporter (otlp, none)
    /// - `OTEL_LOGS_EXPORTER` → logs exporter (otlp, none)
    pub fn with_standard_env(mut self) -> Self {
        if let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
            self.figment = self
                .figment
                .merge(Serialized::default("endpoint.url", endpoint));
        }

        if let Ok(protocol) = std::env::var("OTEL_EXPORTER_OTLP_PROTOCOL") {
            let protocol = match protocol.as_str() {
                "http/json" => "httpjson",
                _ => "httpbinary",
            };
            self.figment = self
                .figment
                .merge(Serialized::default("endpoint.protocol", protocol));
        }

        if let Ok(service_name) = std::env::var("OTEL_SERVICE_NAME") {
            self.figment = self
                .figment
                .merge(Serialized::default("resource.service_name", service_name));
        }

        if let Ok(exporter) = std::env::var("OTEL_TRACES_EXPORTER") {
            let enabled = exporter != "none";
            self.figment = self
                .figment
                .merge(Serialized::default("traces.enabled", enabled));
        }

        if let Ok(exporter) = std::env::var("OTEL_METRICS_EXPORTER") {
            let enabled = exporter != "none";
            self.figment = self
                .figment
                .merge(Serialized::default("metrics.enabled", enabled));
        }

        if let Ok(exporter) = std::env::var("OTEL_LOGS_EXPORTER") {
            let enabled = exporter != "none";
            self.figment = self
                .figment
                .merge(Serialized::default("logs.enabled", enabled));
        }

        self
    }

    /// Sets the OTLP endpoint URL explicitly.
    ///
    /// This overrides any configuration from files or environment variables.
    /// Signal-specific paths (`/v1/traces`, `/v1/metrics`, `/v1/logs`) are
    /// appended automatically.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("endpoint.url", url.into()));
        self
    }

    /// Sets the export encoding.
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        let protocol_str = match protocol {
            Protocol::HttpBinary => "httpbinary",
            Protocol::HttpJson => "httpjson",
        };
        self.figment = self
            .figment
            .merge(Serialized::default("endpoint.protocol", protocol_str));
        self
    }

    /// Sets the service name resource attribute.
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("resource.service_name", name.into()));
        self
    }

    /// Sets the service namespace resource attribute.
    pub fn service_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.figment = self.figment.merge(Serialized::default(
            "resource.service_namespace",
            namespace.into(),
        ));
        self
    }

    /// Sets the deployment environment resource attribute.
    pub fn deployment_environment(mut self, env: impl Into<String>) -> Self {
        self.figment = self.figment.merge(Serialized::default(
            "resource.deployment_environment",
            env.into(),
        ));
        self
    }

    /// Adds a resource attribute.
    pub fn resource_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.resource_attributes.insert(key.into(), value.into());
        self
    }

    /// Sets the resource detection mode.
    ///
    /// `Auto` (the default) runs the host, OS, and process detectors; `None`
    /// keeps the resource limited to explicitly configured attributes.
    pub fn resource_detection(mut self, detection: ResourceDetection) -> Self {
        let detection_str = match detection {
            ResourceDetection::Auto => "auto",
            ResourceDetection::None => "none",
        };
        self.figment = self
            .figment
            .merge(Serialized::default("resource.detection", detection_str));
        self
    }

    /// Enables or disables trace collection.
    ///
    /// Default: enabled
    pub fn traces(mut self, enabled: bool) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("traces.enabled", enabled));
        self
    }

    /// Enables or disables metrics collection.
    ///
    /// Default: enabled
    pub fn metrics(mut self, enabled: bool) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("metrics.enabled", enabled));
        self
    }

    /// Enables or disables log collection.
    ///
    /// Default: enabled
    pub fn logs(mut self, enabled: bool) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("logs.enabled", enabled));
        self
    }

    /// Disables automatic tracing subscriber initialisation.
    ///
    /// By default, the pipeline sets up a `tracing-subscriber` with
    /// `tracing-opentelemetry` and `opentelemetry-appender-tracing`
    /// integration. Disable this if you want to configure the subscriber
    /// yourself.
    pub fn without_tracing_subscriber(mut self) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("init_tracing_subscriber", false));
        self
    }

    /// Adds an HTTP header to all export requests.
    ///
    /// Useful for authentication or custom routing.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let header_key = format!("endpoint.headers.{}", key.into());
        self.figment = self
            .figment
            .merge(Serialized::default(&header_key, value.into()));
        self
    }

    /// Sets the instrumentation scope name (otel.library.name).
    ///
    /// If not set, defaults to the service name.
    pub fn instrumentation_scope_name(mut self, name: impl Into<String>) -> Self {
        self.figment = self.figment.merge(Serialized::default(
            "instrumentation_scope_name",
            name.into(),
        ));
        self
    }

    /// Extracts the configuration for inspection or debugging.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration extraction fails, if the endpoint
    /// URL is invalid, or if the workload latency range is empty.
    pub fn extract_config(&self) -> Result<DemoConfig, DemoError> {
        let mut config: DemoConfig = self
            .figment
            .extract()
            .map_err(|e| DemoError::Config(Box::new(e)))?;

        // Merge resource attributes that couldn't go through figment
        config
            .resource
            .attributes
            .extend(self.resource_attributes.clone());

        validate(&config)?;

        Ok(config)
    }

    /// Builds and initialises the telemetry pipeline.
    ///
    /// Returns a [`TelemetryGuard`] that manages provider lifecycle. When the
    /// guard is dropped, all providers are flushed and shut down.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration extraction or validation fails
    /// - Exporter construction fails
    /// - Tracing subscriber initialisation fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// use otel_demo::{DemoBuilder, DemoError};
    ///
    /// fn main() -> Result<(), DemoError> {
    ///     let guard = DemoBuilder::new()
    ///         .with_standard_env()
    ///         .service_name("rust-demo")
    ///         .build()?;
    ///
    ///     tracing::info!("Application started");
    ///
    ///     guard.shutdown()?;
    ///     Ok(())
    /// }
    /// ```
    pub fn build(self) -> Result<TelemetryGuard, DemoError> {
        let mut config: DemoConfig = self
            .figment
            .extract()
            .map_err(|e| DemoError::Config(Box::new(e)))?;

        config.resource.attributes.extend(self.resource_attributes);

        validate(&config)?;

        TelemetryGuard::from_config(config)
    }
}

impl Default for DemoBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(config: &DemoConfig) -> Result<(), DemoError> {
    if let Some(ref url) = config.endpoint.url
        && !url.starts_with("http://")
        && !url.starts_with("https://")
    {
        return Err(DemoError::InvalidEndpoint { url: url.clone() });
    }

    if config.workload.latency_max_ms <= config.workload.latency_min_ms {
        return Err(DemoError::InvalidLatencyRange {
            min_ms: config.workload.latency_min_ms,
            max_ms: config.workload.latency_max_ms,
        });
    }

    Ok(())
}
