use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION};
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use tracing::{info, warn};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identifier attached to each request's extensions by [`RequestId`].
#[derive(Debug, Clone)]
pub struct RequestIdValue(pub String);

/// Access logging and request metrics.
///
/// Paths are recorded by route pattern (`/patients/{id}`), so record ids
/// never end up in logs or metric labels.
pub struct RequestAudit;

impl<S, B> Transform<S, ServiceRequest> for RequestAudit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestAuditMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestAuditMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestAuditMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestAuditMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();

        Box::pin(async move {
            let method = req.method().to_string();
            let ip = req.peer_addr().map(|addr| addr.ip().to_string());
            let request_id = req.extensions().get::<RequestIdValue>().map(|r| r.0.clone());

            let start_time = std::time::Instant::now();
            let res = svc.call(req).await;
            let elapsed = start_time.elapsed();

            match &res {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let endpoint = response
                        .request()
                        .match_pattern()
                        .unwrap_or_else(|| "unmatched".to_string());

                    HTTP_REQUESTS_TOTAL
                        .with_label_values(&[&method, &endpoint, &status.to_string()])
                        .inc();
                    HTTP_REQUEST_DURATION
                        .with_label_values(&[&method, &endpoint])
                        .observe(elapsed.as_secs_f64());

                    info!(
                        method = %method,
                        endpoint = %endpoint,
                        status = status,
                        duration_ms = elapsed.as_millis() as u64,
                        ip = ?ip,
                        request_id = ?request_id,
                        "API_REQUEST"
                    );
                }
                Err(err) => {
                    warn!(
                        method = %method,
                        error = %err,
                        ip = ?ip,
                        request_id = ?request_id,
                        "REQUEST_ERROR"
                    );
                }
            }

            res
        })
    }
}

/// Request ID middleware for tracing
pub struct RequestId;

impl<S, B> Transform<S, ServiceRequest> for RequestId
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestIdMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestIdMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestIdMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestIdMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let request_id = uuid::Uuid::new_v4().to_string();
        req.extensions_mut().insert(RequestIdValue(request_id.clone()));

        let svc = self.service.clone();

        Box::pin(async move {
            let mut res = svc.call(req).await?;
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }
            Ok(res)
        })
    }
}
