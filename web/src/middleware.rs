use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::LOCATION;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{Error, HttpResponse};
use std::future::{ready, Future, Ready};
use std::pin::Pin;

/// Redirects plain-HTTP requests to HTTPS on `https_port`.
///
/// Without a port the middleware passes every request through untouched.
#[derive(Clone, Copy)]
pub struct HttpsRedirection {
    https_port: Option<u16>,
}

impl HttpsRedirection {
    pub fn new(https_port: Option<u16>) -> Self {
        Self { https_port }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HttpsRedirection
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = HttpsRedirectionMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HttpsRedirectionMiddleware {
            service,
            https_port: self.https_port,
        }))
    }
}

pub struct HttpsRedirectionMiddleware<S> {
    service: S,
    https_port: Option<u16>,
}

impl<S, B> Service<ServiceRequest> for HttpsRedirectionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(location) = self.https_location(&req) {
            let response = HttpResponse::TemporaryRedirect()
                .insert_header((LOCATION, location))
                .finish()
                .map_into_right_body::<B>();
            let res = req.into_response(response);
            return Box::pin(async move { Ok(res) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}

impl<S> HttpsRedirectionMiddleware<S> {
    fn https_location(&self, req: &ServiceRequest) -> Option<String> {
        let port = self.https_port?;
        let connection_info = req.connection_info();
        if connection_info.scheme() != "http" {
            return None;
        }

        let host = strip_port(connection_info.host());
        let path = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        Some(match port {
            443 => format!("https://{}{}", host, path),
            port => format!("https://{}:{}{}", host, port, path),
        })
    }
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port))
            if !name.is_empty() && !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) =>
        {
            name
        }
        _ => host,
    }
}

/// Replaces a server error with a redirect to the generic error page.
pub fn redirect_to_error_page<B>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>>
where
    B: MessageBody,
{
    tracing::error!(
        status = res.status().as_u16(),
        path = res.request().path(),
        "Unhandled error, redirecting to the error page"
    );
    let (req, _) = res.into_parts();
    let response = HttpResponse::Found()
        .insert_header((LOCATION, "/Home/Error"))
        .finish()
        .map_into_right_body::<B>();
    Ok(ErrorHandlerResponse::Response(ServiceResponse::new(
        req, response,
    )))
}
