//! OpenTelemetry provider lifecycle management.
//!
//! The [`TelemetryGuard`] manages the lifecycle of the demo's providers
//! (traces, metrics, logs). When dropped, it automatically flushes pending
//! data and shuts down providers gracefully.

use crate::config::{DemoConfig, Protocol, ResourceDetection};
use crate::error::DemoError;
use opentelemetry::KeyValue;
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};
use opentelemetry_resource_detectors::{
    HostResourceDetector, OsResourceDetector, ProcessResourceDetector,
};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::{
    BatchConfigBuilder as LogBatchConfigBuilder, BatchLogProcessor, SdkLoggerProvider,
};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{
    BatchConfigBuilder as TraceBatchConfigBuilder, BatchSpanProcessor, SdkTracerProvider,
};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Guard that manages the demo's OpenTelemetry provider lifecycle.
///
/// On drop, flushes pending telemetry and shuts down providers.
/// Use [`shutdown()`](Self::shutdown) for explicit error handling.
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
    logger_provider: Option<SdkLoggerProvider>,
}

impl TelemetryGuard {
    /// Creates a TelemetryGuard from configuration.
    ///
    /// This is typically called by [`DemoBuilder::build`](crate::DemoBuilder::build).
    pub(crate) fn from_config(config: DemoConfig) -> Result<Self, DemoError> {
        let resource = build_resource(&config);

        let tracer_provider = if config.traces.enabled {
            Some(build_tracer_provider(&config, resource.clone())?)
        } else {
            None
        };

        let meter_provider = if config.metrics.enabled {
            Some(build_meter_provider(&config, resource.clone())?)
        } else {
            None
        };

        let logger_provider = if config.logs.enabled {
            Some(build_logger_provider(&config, resource)?)
        } else {
            None
        };

        if let Some(ref provider) = tracer_provider {
            opentelemetry::global::set_tracer_provider(provider.clone());
        }
        if let Some(ref provider) = meter_provider {
            opentelemetry::global::set_meter_provider(provider.clone());
        }

        let propagator = TextMapCompositePropagator::new(vec![
            Box::new(TraceContextPropagator::new()),
            Box::new(BaggagePropagator::new()),
        ]);
        opentelemetry::global::set_text_map_propagator(propagator);

        if config.init_tracing_subscriber {
            init_subscriber(&tracer_provider, &logger_provider, config.scope_name())?;
        }

        Ok(Self {
            tracer_provider,
            meter_provider,
            logger_provider,
        })
    }

    /// Returns the tracer provider if configured.
    pub fn tracer_provider(&self) -> Option<&SdkTracerProvider> {
        self.tracer_provider.as_ref()
    }

    /// Returns the meter provider if configured.
    pub fn meter_provider(&self) -> Option<&SdkMeterProvider> {
        self.meter_provider.as_ref()
    }

    /// Returns the logger provider if configured.
    pub fn logger_provider(&self) -> Option<&SdkLoggerProvider> {
        self.logger_provider.as_ref()
    }

    /// Flushes all configured providers. Errors are logged but not returned.
    pub fn flush(&self) {
        if let Some(provider) = &self.logger_provider
            && let Err(e) = provider.force_flush()
        {
            tracing::error!(target: "otel_lifecycle", error = %e, "Failed to flush logger provider");
        }

        if let Some(provider) = &self.tracer_provider
            && let Err(e) = provider.force_flush()
        {
            tracing::error!(target: "otel_lifecycle", error = %e, "Failed to flush tracer provider");
        }

        if let Some(provider) = &self.meter_provider
            && let Err(e) = provider.force_flush()
        {
            tracing::error!(target: "otel_lifecycle", error = %e, "Failed to flush meter provider");
        }
    }

    /// Shuts down all configured providers, returning the first error if any.
    ///
    /// Providers are flushed and closed in a fixed order: logs, traces,
    /// metrics. Consuming `self` guarantees the teardown runs at most once.
    pub fn shutdown(mut self) -> Result<(), DemoError> {
        if let Some(provider) = self.logger_provider.take() {
            provider.force_flush().map_err(DemoError::Flush)?;
            provider.shutdown().map_err(DemoError::Shutdown)?;
        }

        if let Some(provider) = self.tracer_provider.take() {
            provider.force_flush().map_err(DemoError::Flush)?;
            provider.shutdown().map_err(DemoError::Shutdown)?;
        }

        if let Some(provider) = self.meter_provider.take() {
            provider.force_flush().map_err(DemoError::Flush)?;
            provider.shutdown().map_err(DemoError::Shutdown)?;
        }

        Ok(())
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.logger_provider.take() {
            let _ = provider.force_flush();
            if let Err(e) = provider.shutdown() {
                tracing::error!(target: "otel_lifecycle", error = %e, "Failed to shut down logger provider");
            }
        }

        if let Some(provider) = self.tracer_provider.take() {
            let _ = provider.force_flush();
            if let Err(e) = provider.shutdown() {
                tracing::error!(target: "otel_lifecycle", error = %e, "Failed to shut down tracer provider");
            }
        }

        if let Some(provider) = self.meter_provider.take() {
            let _ = provider.force_flush();
            if let Err(e) = provider.shutdown() {
                tracing::error!(target: "otel_lifecycle", error = %e, "Failed to shut down meter provider");
            }
        }
    }
}

fn build_resource(config: &DemoConfig) -> Resource {
    let mut builder = Resource::builder();

    if config.resource.detection == ResourceDetection::Auto {
        builder = builder
            .with_detector(Box::new(HostResourceDetector::default()))
            .with_detector(Box::new(OsResourceDetector))
            .with_detector(Box::new(ProcessResourceDetector));
    }

    let mut attributes: Vec<KeyValue> = config
        .resource
        .attributes
        .iter()
        .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
        .collect();

    attributes.push(KeyValue::new(
        "service.name",
        config.resource.service_name.clone(),
    ));
    attributes.push(KeyValue::new(
        "service.namespace",
        config.resource.service_namespace.clone(),
    ));
    attributes.push(KeyValue::new(
        "deployment.environment.name",
        config.resource.deployment_environment.clone(),
    ));

    builder.with_attributes(attributes).build()
}

macro_rules! build_exporter {
    ($config:expr, $exporter_type:ident, $signal_path:expr, $error_variant:ident) => {{
        let endpoint = $config.signal_endpoint($signal_path);
        let encoding = match $config.endpoint.protocol {
            Protocol::HttpBinary => opentelemetry_otlp::Protocol::HttpBinary,
            Protocol::HttpJson => opentelemetry_otlp::Protocol::HttpJson,
        };

        let mut builder = opentelemetry_otlp::$exporter_type::builder()
            .with_http()
            .with_endpoint(&endpoint)
            .with_timeout($config.endpoint.timeout)
            .with_protocol(encoding);

        if !$config.endpoint.headers.is_empty() {
            builder = builder.with_headers($config.endpoint.headers.clone());
        }

        builder.build().map_err(DemoError::$error_variant)?
    }};
}

fn build_tracer_provider(
    config: &DemoConfig,
    resource: Resource,
) -> Result<SdkTracerProvider, DemoError> {
    let exporter = build_exporter!(config, SpanExporter, "/v1/traces", TraceExporter);

    let batch_config = TraceBatchConfigBuilder::default()
        .with_max_queue_size(config.traces.batch.max_queue_size)
        .with_max_export_batch_size(config.traces.batch.max_export_batch_size)
        .with_scheduled_delay(config.traces.batch.scheduled_delay)
        .build();

    let span_processor = BatchSpanProcessor::builder(exporter)
        .with_batch_config(batch_config)
        .build();

    Ok(SdkTracerProvider::builder()
        .with_span_processor(span_processor)
        .with_resource(resource)
        .build())
}

fn build_meter_provider(
    config: &DemoConfig,
    resource: Resource,
) -> Result<SdkMeterProvider, DemoError> {
    let exporter = build_exporter!(config, MetricExporter, "/v1/metrics", MetricExporter);

    let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
        .with_interval(config.metrics.batch.scheduled_delay)
        .build();

    Ok(SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(resource)
        .build())
}

fn build_logger_provider(
    config: &DemoConfig,
    resource: Resource,
) -> Result<SdkLoggerProvider, DemoError> {
    let exporter = build_exporter!(config, LogExporter, "/v1/logs", LogExporter);

    let batch_config = LogBatchConfigBuilder::default()
        .with_max_queue_size(config.logs.batch.max_queue_size)
        .with_max_export_batch_size(config.logs.batch.max_export_batch_size)
        .with_scheduled_delay(config.logs.batch.scheduled_delay)
        .build();

    let log_processor = BatchLogProcessor::builder(exporter)
        .with_batch_config(batch_config)
        .build();

    Ok(SdkLoggerProvider::builder()
        .with_log_processor(log_processor)
        .with_resource(resource)
        .build())
}

fn init_subscriber(
    tracer_provider: &Option<SdkTracerProvider>,
    logger_provider: &Option<SdkLoggerProvider>,
    scope_name: String,
) -> Result<(), DemoError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .without_time();

    let registry = tracing_subscriber::registry().with(filter).with(fmt_layer);

    match (tracer_provider, logger_provider) {
        (Some(tp), Some(lp)) => {
            let tracer = tp.tracer(scope_name);
            let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);
            let log_layer = OpenTelemetryTracingBridge::new(lp);
            registry.with(telemetry_layer).with(log_layer).try_init()?;
        }
        (Some(tp), None) => {
            let tracer = tp.tracer(scope_name);
            let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);
            registry.with(telemetry_layer).try_init()?;
        }
        (None, Some(lp)) => {
            let log_layer = OpenTelemetryTracingBridge::new(lp);
            registry.with(log_layer).try_init()?;
        }
        (None, None) => {
            registry.try_init()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceConfig;
    use std::collections::HashMap;

    fn config_with_resource(resource: ResourceConfig) -> DemoConfig {
        DemoConfig {
            resource,
            ..Default::default()
        }
    }

    #[test]
    fn build_resource_includes_service_identity() {
        let config = config_with_resource(ResourceConfig {
            service_name: "my-test-service".to_string(),
            detection: ResourceDetection::None,
            ..Default::default()
        });

        let resource = build_resource(&config);

        let service_name = resource
            .iter()
            .find(|(k, _)| k.as_str() == "service.name")
            .map(|(_, v)| v.to_string());
        assert_eq!(service_name.as_deref(), Some("my-test-service"));

        let namespace = resource
            .iter()
            .find(|(k, _)| k.as_str() == "service.namespace")
            .map(|(_, v)| v.to_string());
        assert_eq!(namespace.as_deref(), Some("homelab"));

        let environment = resource
            .iter()
            .find(|(k, _)| k.as_str() == "deployment.environment.name")
            .map(|(_, v)| v.to_string());
        assert_eq!(environment.as_deref(), Some("local"));
    }

    #[test]
    fn build_resource_with_auto_detection_includes_os_attributes() {
        let config = config_with_resource(ResourceConfig {
            detection: ResourceDetection::Auto,
            ..Default::default()
        });

        let resource = build_resource(&config);

        let os_type = resource.iter().find(|(k, _)| k.as_str() == "os.type");
        assert!(
            os_type.is_some(),
            "Auto detection should run the OS detector"
        );
    }

    #[test]
    fn build_resource_with_detection_none_excludes_detectors() {
        let config = config_with_resource(ResourceConfig {
            detection: ResourceDetection::None,
            ..Default::default()
        });

        let resource = build_resource(&config);

        let os_type = resource.iter().find(|(k, _)| k.as_str() == "os.type");
        assert!(os_type.is_none(), "None detection should not run detectors");
    }

    #[test]
    fn build_resource_includes_custom_attributes() {
        let mut attributes = HashMap::new();
        attributes.insert("custom.key".to_string(), "custom-value".to_string());

        let config = config_with_resource(ResourceConfig {
            attributes,
            detection: ResourceDetection::None,
            ..Default::default()
        });

        let resource = build_resource(&config);

        let custom_attr = resource
            .iter()
            .find(|(k, _)| k.as_str() == "custom.key")
            .map(|(_, v)| v.to_string());
        assert_eq!(custom_attr.as_deref(), Some("custom-value"));
    }

    fn guard_with_empty_providers() -> TelemetryGuard {
        TelemetryGuard {
            tracer_provider: Some(SdkTracerProvider::builder().build()),
            meter_provider: Some(SdkMeterProvider::builder().build()),
            logger_provider: Some(SdkLoggerProvider::builder().build()),
        }
    }

    #[test]
    fn guard_flush_and_shutdown_succeed() {
        let guard = guard_with_empty_providers();
        guard.flush();
        guard.shutdown().expect("shutdown should succeed");
    }

    #[test]
    fn guard_drop_tears_down_cleanly() {
        let guard = guard_with_empty_providers();
        drop(guard);
    }

    #[test]
    fn guard_with_no_providers_shuts_down() {
        let guard = TelemetryGuard {
            tracer_provider: None,
            meter_provider: None,
            logger_provider: None,
        };
        guard.flush();
        guard.shutdown().expect("empty guard should shut down");
    }
}
