//! Logging and optional OpenTelemetry export

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_semantic_conventions::resource::SERVICE_VERSION;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::{LoggingConfig, TelemetryConfig};

/// Keeps the OTLP providers alive; flushes and shuts them down on drop
#[derive(Default)]
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
    logger_provider: Option<SdkLoggerProvider>,
    meter_provider: Option<SdkMeterProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take()
            && let Err(err) = provider.shutdown()
        {
            eprintln!("Failed to shut down tracer provider: {err}");
        }
        if let Some(provider) = self.logger_provider.take()
            && let Err(err) = provider.shutdown()
        {
            eprintln!("Failed to shut down logger provider: {err}");
        }
        if let Some(provider) = self.meter_provider.take()
            && let Err(err) = provider.shutdown()
        {
            eprintln!("Failed to shut down meter provider: {err}");
        }
    }
}

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},fjall=warn,lsm_tree=warn,hyper=warn")))
}

fn resource(service_name: &str) -> Resource {
    Resource::builder()
        .with_service_name(service_name.to_string())
        .with_attribute(KeyValue::new(SERVICE_VERSION, crate::VERSION))
        .build()
}

fn otlp_providers(
    endpoint: &str,
    service_name: &str,
) -> Result<(SdkTracerProvider, SdkLoggerProvider, SdkMeterProvider)> {
    let endpoint = endpoint.trim_end_matches('/');
    let resource = resource(service_name);

    let span_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(format!("{endpoint}/v1/traces"))
        .build()
        .context("Failed to build OTLP span exporter")?;
    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(span_exporter)
        .with_resource(resource.clone())
        .build();

    let log_exporter = opentelemetry_otlp::LogExporter::builder()
        .with_http()
        .with_endpoint(format!("{endpoint}/v1/logs"))
        .build()
        .context("Failed to build OTLP log exporter")?;
    let logger_provider = SdkLoggerProvider::builder()
        .with_batch_exporter(log_exporter)
        .with_resource(resource.clone())
        .build();

    let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_http()
        .with_endpoint(format!("{endpoint}/v1/metrics"))
        .build()
        .context("Failed to build OTLP metric exporter")?;
    let meter_provider = SdkMeterProvider::builder()
        .with_periodic_exporter(metric_exporter)
        .with_resource(resource)
        .build();

    Ok((tracer_provider, logger_provider, meter_provider))
}

/// Install the global subscriber. `verbose` forces debug level.
pub fn init(logging: &LoggingConfig, telemetry: &TelemetryConfig, verbose: bool) -> Result<TelemetryGuard> {
    let level = if verbose { "debug" } else { logging.level.as_str() };

    let fmt_layer = if logging.format == "json" {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let mut guard = TelemetryGuard::default();
    let (trace_layer, log_layer) = match &telemetry.otlp_endpoint {
        Some(endpoint) => {
            let (tracer_provider, logger_provider, meter_provider) =
                otlp_providers(endpoint, &telemetry.service_name)?;
            let tracer = tracer_provider.tracer(telemetry.service_name.clone());
            let trace_layer = tracing_opentelemetry::layer().with_tracer(tracer);
            let log_layer = OpenTelemetryTracingBridge::new(&logger_provider);

            opentelemetry::global::set_tracer_provider(tracer_provider.clone());
            opentelemetry::global::set_meter_provider(meter_provider.clone());

            guard.tracer_provider = Some(tracer_provider);
            guard.logger_provider = Some(logger_provider);
            guard.meter_provider = Some(meter_provider);
            (Some(trace_layer), Some(log_layer))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter(level))
        .with(trace_layer)
        .with(log_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(endpoint) = &telemetry.otlp_endpoint {
        tracing::info!(endpoint, "exporting telemetry over OTLP");
    }

    Ok(guard)
}
