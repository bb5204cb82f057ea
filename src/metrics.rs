use prometheus::{Encoder, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use lazy_static::lazy_static;
use actix_web::{HttpResponse, Responder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Request metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).unwrap();

    pub static ref HTTP_REQUEST_DURATION: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds"
        ),
        &["method", "endpoint"]
    ).unwrap();

    // Authentication metrics
    pub static ref AUTH_ATTEMPTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("auth_attempts_total", "Total doctor authentication attempts"),
        &["action", "result"]
    ).unwrap();

    // Record mutations per resource
    pub static ref RECORD_WRITES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("record_writes_total", "Total create/update/delete operations"),
        &["resource", "operation"]
    ).unwrap();
}

/// Register all collectors with the registry. Call once at startup.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(HTTP_REQUEST_DURATION.clone()))?;
    REGISTRY.register(Box::new(AUTH_ATTEMPTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECORD_WRITES_TOTAL.clone()))?;

    Ok(())
}

pub fn record_auth(action: &str, success: bool) {
    let result = if success { "success" } else { "failure" };
    AUTH_ATTEMPTS_TOTAL.with_label_values(&[action, result]).inc();
}

pub fn record_write(resource: &str, operation: &str) {
    RECORD_WRITES_TOTAL.with_label_values(&[resource, operation]).inc();
}

/// Prometheus metrics endpoint handler
pub async fn metrics_handler() -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(format!("Failed to encode metrics: {}", e));
    }

    match String::from_utf8(buffer) {
        Ok(metrics) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(metrics),
        Err(e) => HttpResponse::InternalServerError().body(format!("Failed to convert metrics: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let result = init_metrics();
        assert!(result.is_ok());
    }

    #[test]
    fn test_auth_counter() {
        record_auth("login", false);

        let metric = AUTH_ATTEMPTS_TOTAL
            .with_label_values(&["login", "failure"])
            .get();

        assert!(metric >= 1);
    }

    #[test]
    fn test_write_counter() {
        record_write("patient", "create");
        assert!(RECORD_WRITES_TOTAL.with_label_values(&["patient", "create"]).get() >= 1);
    }
}
