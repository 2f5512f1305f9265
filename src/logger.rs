use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use log::{info, warn};
use std::rc::Rc;
use std::time::Instant;

use crate::error::{AppError, ErrorHandler};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Id `RequestLogger` assigns to a request, kept in its extensions
///
/// Handlers take it as an extractor so their logs and error bodies share
/// the id echoed in `X-Request-Id`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestId(String);

impl RequestId {
    fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequest for RequestId {
    type Error = Error;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let id = req
            .extensions()
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(RequestId::generate);
        std::future::ready(Ok(id))
    }
}

/// Request logging middleware
///
/// Tags every request with an id (taken from `X-Request-Id` when the client
/// sends one), logs start and completion, and echoes the id back in the
/// response headers. Application errors are logged and rendered under that
/// id, including the ones raised by inner middleware.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RequestLoggerService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestLoggerService<S> {
    service: Rc<S>,
}

fn request_id(req: &ServiceRequest) -> RequestId {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty() && id.len() <= 128)
        .map(|id| RequestId(id.to_string()))
        .unwrap_or_else(RequestId::generate)
}

fn render_logged(error: &AppError, request_id: &RequestId) -> actix_web::HttpResponse {
    error.log_error(request_id.as_str());
    error.render(request_id.as_str())
}

impl<S, B> Service<ServiceRequest> for RequestLoggerService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let request_id = request_id(&req);
        let method = req.method().to_string();
        // query strings can carry search terms; only the path is logged
        let path = req.path().to_string();

        info!("[{}] {} {} started", request_id.as_str(), method, path);

        req.extensions_mut().insert(request_id.clone());
        let http_request = req.request().clone();
        let service = self.service.clone();

        Box::pin(async move {
            let mut res = match service.call(req).await {
                Ok(res) => {
                    let rendered = res
                        .response()
                        .error()
                        .and_then(|e| e.as_error::<AppError>())
                        .map(|e| render_logged(e, &request_id));

                    match rendered {
                        Some(response) => res.into_response(response).map_into_right_body(),
                        None => res.map_into_left_body(),
                    }
                }
                // errors raised by middleware, e.g. a rejected bearer token
                Err(err) => match err.as_error::<AppError>() {
                    Some(e) => {
                        let response = render_logged(e, &request_id);
                        ServiceResponse::new(http_request, response).map_into_right_body()
                    }
                    None => ServiceResponse::from_err(err, http_request).map_into_right_body(),
                },
            };

            let elapsed = start_time.elapsed().as_millis();
            let status = res.status();

            if status.is_server_error() {
                warn!("[{}] {} {} -> {} ({}ms)", request_id.as_str(), method, path, status.as_u16(), elapsed);
            } else {
                info!("[{}] {} {} -> {} ({}ms)", request_id.as_str(), method, path, status.as_u16(), elapsed);
            }

            if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }

            Ok(res)
        })
    }
}
