use actix_web::http::header::ContentType;
use actix_web::{get, web, HttpResponse, Responder};
use tracing::instrument;

use crate::error::AppError;
use crate::metrics::PROMETHEUS_CONTENT_TYPE;
use crate::AppContext;

const INDEX_HTML: &str = include_str!("../../templates/index.html");

pub fn route(cfg: &mut web::ServiceConfig) {
    cfg.service(home)
        .service(work)
        .service(fail)
        .service(metrics);
}

#[get("/")]
#[instrument(name = "homepage", skip_all)]
pub async fn home(context: web::Data<AppContext>) -> impl Responder {
    context.metrics.inc_requests();
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(INDEX_HTML)
}

#[get("/work")]
#[instrument(name = "do_work", skip_all)]
pub async fn work(context: web::Data<AppContext>) -> impl Responder {
    context.metrics.inc_requests();
    HttpResponse::Ok().body("Doing some work...")
}

#[get("/fail")]
#[instrument(name = "forced_failure", skip_all)]
pub async fn fail(context: web::Data<AppContext>) -> Result<HttpResponse, AppError> {
    context.metrics.inc_requests();
    context.metrics.inc_errors();
    Err(AppError::ForcedFailure)
}

/// Prometheus scrape endpoint. Not counted in the demo counters.
#[get("/metrics")]
pub async fn metrics(context: web::Data<AppContext>) -> actix_web::Result<HttpResponse> {
    let body = context
        .metrics
        .render()
        .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok()
        .content_type(PROMETHEUS_CONTENT_TYPE)
        .body(body))
}
