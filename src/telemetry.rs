//! Logging and optional OpenTelemetry export
//!
//! Console output is always installed (pretty or JSON). When an OTLP endpoint
//! is configured, spans and log records are also exported over OTLP/HTTP.

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_semantic_conventions::resource::SERVICE_VERSION;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LoggingConfig, TelemetryConfig};

/// Crates whose own logs must not be exported back through OTLP
const EXPORT_SILENCED: &str = "hyper=off,opentelemetry=off,tonic=off,h2=off,reqwest=off";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps exporters alive; call [`TelemetryGuard::shutdown`] before exit to flush
#[derive(Default)]
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
    logger_provider: Option<SdkLoggerProvider>,
}

impl TelemetryGuard {
    #[must_use]
    pub fn is_exporting(&self) -> bool {
        self.tracer_provider.is_some()
    }

    pub fn shutdown(self) {
        if let Some(provider) = self.tracer_provider {
            if let Err(err) = provider.shutdown() {
                eprintln!("Failed to shut down tracer provider: {err}");
            }
        }
        if let Some(provider) = self.logger_provider {
            if let Err(err) = provider.shutdown() {
                eprintln!("Failed to shut down logger provider: {err}");
            }
        }
    }
}

/// `RUST_LOG` wins over the configured level
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber
pub fn init(logging: &LoggingConfig, telemetry: &TelemetryConfig) -> Result<TelemetryGuard> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console = match logging.format.as_str() {
        "json" => fmt::layer()
            .json()
            .with_filter(env_filter(&logging.level))
            .boxed(),
        _ => fmt::layer().with_filter(env_filter(&logging.level)).boxed(),
    };
    layers.push(console);

    let mut guard = TelemetryGuard::default();
    if let Some(endpoint) = telemetry.otlp_endpoint.as_deref() {
        let endpoint = endpoint.trim_end_matches('/');
        let resource = Resource::builder()
            .with_service_name(telemetry.service_name.clone())
            .with_attribute(KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")))
            .build();

        let span_exporter = SpanExporter::builder()
            .with_http()
            .with_endpoint(format!("{endpoint}/v1/traces"))
            .build()
            .context("Failed to create OTLP span exporter")?;
        let tracer_provider = SdkTracerProvider::builder()
            .with_batch_exporter(span_exporter)
            .with_resource(resource.clone())
            .build();
        let tracer = tracer_provider.tracer(telemetry.service_name.clone());
        layers.push(
            tracing_opentelemetry::layer()
                .with_tracer(tracer)
                .with_filter(env_filter(&logging.level))
                .boxed(),
        );

        let log_exporter = LogExporter::builder()
            .with_http()
            .with_endpoint(format!("{endpoint}/v1/logs"))
            .build()
            .context("Failed to create OTLP log exporter")?;
        let logger_provider = SdkLoggerProvider::builder()
            .with_batch_exporter(log_exporter)
            .with_resource(resource)
            .build();
        layers.push(
            OpenTelemetryTracingBridge::new(&logger_provider)
                .with_filter(EnvFilter::new(format!("{},{EXPORT_SILENCED}", logging.level)))
                .boxed(),
        );

        opentelemetry::global::set_tracer_provider(tracer_provider.clone());
        guard.tracer_provider = Some(tracer_provider);
        guard.logger_provider = Some(logger_provider);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
