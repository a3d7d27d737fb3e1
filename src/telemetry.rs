use once_cell::sync::Lazy;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{RandomIdGenerator, Tracer, TracerProvider};
use opentelemetry_sdk::Resource;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::{OtelConfig, SpanExporterKind};

static RESOURCE: Lazy<Resource> = Lazy::new(|| {
    Resource::new(vec![KeyValue::new(
        opentelemetry_semantic_conventions::resource::SERVICE_NAME,
        "simple-app",
    )])
});

fn init_stdout_tracer() -> Tracer {
    TracerProvider::builder()
        .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
        .with_config(opentelemetry_sdk::trace::Config::default().with_resource(RESOURCE.clone()))
        .build()
        .tracer("stdout")
}

/// OTLP/HTTP exporter. Spans are batched by the SDK and posted to
/// `<endpoint>/v1/traces` on the collector.
fn init_otlp_tracer(otel_config: &OtelConfig) -> Tracer {
    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_resource(RESOURCE.clone())
                .with_id_generator(RandomIdGenerator::default()),
        )
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .http()
                .with_endpoint(format!("{}/v1/traces", otel_config.endpoint))
                .with_timeout(std::time::Duration::from_secs(5)),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)
        .expect("failed to init otlp tracer")
        .tracer("demo_app")
}

pub fn init_subscriber(otel_config: &OtelConfig) {
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

    let tracer = match otel_config.exporter {
        SpanExporterKind::Otlp => init_otlp_tracer(otel_config),
        SpanExporterKind::Stdout => init_stdout_tracer(),
    };
    let trace_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::Layer::new()
                .with_target(true)
                .with_span_events(FmtSpan::ACTIVE)
                .compact(),
        )
        .with(trace_layer)
        .init();

    std::panic::set_hook(Box::new(tracing_panic::panic_hook));
}
