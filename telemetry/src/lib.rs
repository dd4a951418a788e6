use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::{SpanExporterBuilder, WithExportConfig};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{Config, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::subscriber::set_global_default;
use tracing::{Span, Subscriber};
use tracing_actix_web::{DefaultRootSpanBuilder, Level, RootSpanBuilder};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

#[derive(Deserialize, Clone)]
pub struct TelemetrySettings {
    /// OTLP/HTTP collector endpoint. Spans stay in-process when absent.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default)]
    pub honeycomb_api_key: Option<Secret<String>>,
    pub dataset_name: String,
}

/// Compose multiple layers into a tracing subscriber.
pub fn get_subscriber<Sink>(
    name: String,
    env_filter: String,
    sink: Sink,
    config: &TelemetrySettings,
    trace_provider: &TracerProvider,
) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));
    let formatting_layer = BunyanFormattingLayer::new(name, sink);

    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
        .with(
            tracing_opentelemetry::layer()
                .with_tracer(trace_provider.tracer(config.dataset_name.clone())),
        )
}

pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) {
    let _ = LogTracer::init();
    global::set_text_map_propagator(TraceContextPropagator::new());

    let _ = set_global_default(subscriber);
}

pub fn init_tracer(trace_config: &TelemetrySettings) -> Result<TracerProvider, anyhow::Error> {
    let resource = Resource::new(vec![KeyValue::new(
        opentelemetry_semantic_conventions::resource::SERVICE_NAME,
        trace_config.dataset_name.clone(),
    )]);
    let builder = TracerProvider::builder().with_config(Config::default().with_resource(resource));

    let endpoint = match trace_config.otlp_endpoint.as_deref() {
        Some(endpoint) if !endpoint.trim().is_empty() => endpoint,
        _ => return Ok(builder.build()),
    };

    let mut headers = HashMap::new();
    if let Some(api_key) = &trace_config.honeycomb_api_key {
        headers.insert(
            "x-honeycomb-dataset".to_string(),
            trace_config.dataset_name.clone(),
        );
        headers.insert(
            "x-honeycomb-team".to_string(),
            api_key.expose_secret().to_string(),
        );
    }

    let span_exporter = opentelemetry_otlp::new_exporter()
        .http()
        .with_endpoint(endpoint)
        .with_http_client(reqwest::Client::default())
        .with_headers(headers)
        .with_timeout(std::time::Duration::from_secs(2));

    let exporter = SpanExporterBuilder::Http(span_exporter).build_span_exporter()?;

    Ok(builder.with_batch_exporter(exporter, runtime::Tokio).build())
}

/// Flushes pending spans and drops `provider` on the blocking pool.
///
/// The batch exporter's worker lives on the Tokio runtime, so flushing from a
/// thread of a current-thread runtime (as under `#[actix_web::main]`) would
/// wait on a task that can never run.
pub async fn shutdown_tracer(provider: TracerProvider) {
    let shutdown = tokio::task::spawn_blocking(move || {
        for result in provider.force_flush() {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Failed to flush spans");
            }
        }
        drop(provider);
    })
    .await;

    if let Err(e) = shutdown {
        tracing::error!(error = %e, "Tracer shutdown task failed");
    }
}

/// Root span builder that keeps probes and static assets out of the `INFO` stream.
pub struct CustomLevelRootSpanBuilder;

const QUIET_PATH_PREFIXES: [&str; 4] = ["/health_check", "/css/", "/js/", "/favicon.ico"];

impl RootSpanBuilder for CustomLevelRootSpanBuilder {
    fn on_request_start(request: &ServiceRequest) -> Span {
        let level = if is_quiet_path(request.path()) {
            Level::TRACE
        } else {
            Level::INFO
        };
        tracing_actix_web::root_span!(level = level, request)
    }

    fn on_request_end<B: MessageBody>(span: Span, outcome: &Result<ServiceResponse<B>, actix_web::Error>) {
        DefaultRootSpanBuilder::on_request_end(span, outcome);
    }
}

fn is_quiet_path(path: &str) -> bool {
    QUIET_PATH_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}
