use std::sync::Arc;

use actix_web::middleware::{from_fn, Logger};
use actix_web::{web, App, HttpServer};
use demo_app::api::route;
use demo_app::metrics::AppMetrics;
use demo_app::middleware::metrics::HttpMetrics;
use demo_app::middleware::tracing::record_trace;
use demo_app::telemetry::init_subscriber;
use demo_app::{AppConfig, AppContext};
use opentelemetry::global::shutdown_tracer_provider;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let app_config = AppConfig::load();
    init_subscriber(&app_config.otel);

    let metrics = Arc::new(AppMetrics::new().expect("failed to build metrics registry"));
    let http_metrics = HttpMetrics::new(metrics.registry()).expect("failed to register http metrics");
    let context = AppContext::new(metrics);

    tracing::info!(endpoint = %app_config.otel.endpoint, "starting demo-app on 0.0.0.0:8000");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(context.clone()))
            .wrap(Logger::default())
            .wrap(from_fn(record_trace))
            .wrap(http_metrics.clone())
            .configure(route)
    })
    .bind(("0.0.0.0", 8000))?
    .run()
    .await?;

    let _ = tokio::task::spawn_blocking(shutdown_tracer_provider).await;

    Ok(())
}
