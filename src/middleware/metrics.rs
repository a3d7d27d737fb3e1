use actix_web::body::{BodySize, MessageBody};
use actix_web::dev::{self, ServiceRequest, ServiceResponse};
use futures_util::future::{self, LocalBoxFuture};
use prometheus::{HistogramOpts, HistogramVec, IntGauge, Registry};
use std::time::Instant;

const HTTP_SERVER_DURATION: &str = "http_server_duration_seconds";
const HTTP_SERVER_ACTIVE_REQUESTS: &str = "http_server_active_requests";
const HTTP_SERVER_RESPONSE_SIZE: &str = "http_server_response_size_bytes";

#[derive(Clone)]
struct Instruments {
    http_server_duration: HistogramVec,
    http_server_active_requests: IntGauge,
    http_server_response_size: HistogramVec,
}

impl Instruments {
    fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let http_server_duration = HistogramVec::new(
            HistogramOpts::new(
                HTTP_SERVER_DURATION,
                "Measures the duration of inbound HTTP requests.",
            ),
            &["method", "route", "status"],
        )?;

        let http_server_active_requests = IntGauge::new(
            HTTP_SERVER_ACTIVE_REQUESTS,
            "Measures the number of concurrent HTTP requests that are currently in-flight.",
        )?;

        let http_server_response_size = HistogramVec::new(
            HistogramOpts::new(
                HTTP_SERVER_RESPONSE_SIZE,
                "Measures the size of HTTP response messages.",
            )
            .buckets(prometheus::exponential_buckets(64.0, 4.0, 8)?),
            &["method", "route", "status"],
        )?;

        registry.register(Box::new(http_server_duration.clone()))?;
        registry.register(Box::new(http_server_active_requests.clone()))?;
        registry.register(Box::new(http_server_response_size.clone()))?;

        Ok(Self {
            http_server_duration,
            http_server_active_requests,
            http_server_response_size,
        })
    }
}

/// Per-request HTTP server metrics, recorded into the shared registry
/// so they show up on the scrape endpoint next to the demo counters.
#[derive(Clone)]
pub struct HttpMetrics {
    instruments: Instruments,
}

impl HttpMetrics {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            instruments: Instruments::register(registry)?,
        })
    }
}

impl<S, B> dev::Transform<S, ServiceRequest> for HttpMetrics
where
    S: dev::Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = HttpMetricsMiddleware<S>;
    type InitError = ();
    type Future = future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        future::ok(HttpMetricsMiddleware {
            service,
            instruments: self.instruments.clone(),
        })
    }
}

pub struct HttpMetricsMiddleware<S> {
    service: S,
    instruments: Instruments,
}

impl<S, B> dev::Service<ServiceRequest> for HttpMetricsMiddleware<S>
where
    S: dev::Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let instruments = self.instruments.clone();
        let timer = Instant::now();
        let method = req.method().to_string();
        let route = req.match_pattern().unwrap_or_default();

        instruments.http_server_active_requests.inc();

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;
            instruments.http_server_active_requests.dec();
            let elapsed = timer.elapsed().as_secs_f64();

            match result {
                Ok(res) => {
                    let status = res.status();
                    let labels = [method.as_str(), route.as_str(), status.as_str()];
                    instruments
                        .http_server_duration
                        .with_label_values(&labels)
                        .observe(elapsed);

                    let response_size = match res.response().body().size() {
                        BodySize::Sized(size) => size,
                        _ => 0,
                    };
                    instruments
                        .http_server_response_size
                        .with_label_values(&labels)
                        .observe(response_size as f64);

                    Ok(res)
                }
                Err(err) => {
                    let status = err.as_response_error().status_code();
                    instruments
                        .http_server_duration
                        .with_label_values(&[&method, &route, status.as_str()])
                        .observe(elapsed);
                    Err(err)
                }
            }
        })
    }
}
