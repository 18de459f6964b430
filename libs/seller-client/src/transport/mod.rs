//! HTTP exchanges with the directory and the gateways.
//!
//! [`Transport`] is the seam the dispatcher talks to; [`HttpTransport`] is
//! the production implementation on hyper + rustls behind a tower stack.

#[cfg(test)]
pub(crate) mod fake;
mod tls;

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, HeaderValue, USER_AGENT};
use http::{Method, Request, Response, Uri};
use http_body_util::{BodyExt, Full, combinators::BoxBody};
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use tower::buffer::Buffer;
use tower::timeout::TimeoutLayer;
use tower::{Service, ServiceBuilder, ServiceExt};
use tower_http::decompression::DecompressionLayer;
use tower_http::set_header::SetRequestHeaderLayer;

use crate::config::RpcConfig;
use crate::error::TransportError;

/// Bytes of a non-2xx body kept for the error message
const ERROR_BODY_PREVIEW_LIMIT: usize = 512;

type ResponseBody = BoxBody<Bytes, Box<dyn StdError + Send + Sync>>;

type ServiceFuture =
    Pin<Box<dyn Future<Output = Result<Response<ResponseBody>, TransportError>> + Send>>;

type BufferedService = Buffer<Request<Full<Bytes>>, ServiceFuture>;

/// One HTTP exchange returning the raw response body.
///
/// Any non-2xx status is a failure; callers only ever see bodies of
/// successful responses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url`.
    async fn get(&self, url: &str) -> Result<Bytes, TransportError>;

    /// POST `body` to `url` as `application/json`.
    async fn post_json(&self, url: &str, body: Bytes) -> Result<Bytes, TransportError>;
}

/// hyper-based [`Transport`].
///
/// `Clone + Send + Sync`; clones share one connection pool through a
/// `tower::buffer::Buffer` worker.
#[derive(Clone)]
pub struct HttpTransport {
    service: BufferedService,
    max_body_size: usize,
}

impl HttpTransport {
    /// Build the connection pool and middleware stack.
    ///
    /// Must be called within a Tokio runtime: the buffer worker is spawned here.
    ///
    /// # Errors
    /// Returns `TransportError::Tls` if the root store cannot be set up and
    /// `TransportError::RequestBuild` if the user agent is not a valid header.
    pub fn new(config: &RpcConfig) -> Result<Self, TransportError> {
        let timeout = config.request_timeout;
        let https = tls::https_connector(config.tls_roots)?;

        let mut client_builder = Client::builder(TokioExecutor::new());
        // pool_idle_timeout only takes effect with a pool timer
        client_builder
            .pool_timer(TokioTimer::new())
            .pool_max_idle_per_host(config.pool_max_idle_per_host);
        if let Some(idle) = config.pool_idle_timeout {
            client_builder.pool_idle_timeout(idle);
        }
        let hyper_client = client_builder.build::<_, Full<Bytes>>(https);

        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| TransportError::RequestBuild(e.into()))?;

        // Request flow: Buffer -> ErrorMapping -> Timeout -> UserAgent -> Decompression -> hyper
        let service = ServiceBuilder::new()
            .layer(TimeoutLayer::new(timeout))
            .layer(SetRequestHeaderLayer::if_not_present(USER_AGENT, user_agent))
            .layer(DecompressionLayer::new())
            .service(hyper_client)
            .map_response(box_response_body)
            .map_err(move |e: tower::BoxError| map_tower_error(e, timeout))
            .boxed_clone();

        let service: BufferedService = Buffer::new(service, config.buffer_capacity.max(1));

        Ok(Self {
            service,
            max_body_size: config.max_body_size,
        })
    }

    #[tracing::instrument(level = "debug", skip(self, body), err(level = "debug"))]
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Bytes>,
    ) -> Result<Bytes, TransportError> {
        let uri = parse_url(url)?;
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(ACCEPT, "application/json");
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let request = builder.body(Full::new(body.unwrap_or_default()))?;

        let mut service = self.service.clone();
        service.ready().await.map_err(map_buffer_error)?;
        let response = service.call(request).await.map_err(map_buffer_error)?;

        let status = response.status();
        if !status.is_success() {
            let preview_limit = self.max_body_size.min(ERROR_BODY_PREVIEW_LIMIT);
            let body_preview = match read_body_limited(response, preview_limit).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(TransportError::BodyTooLarge { .. }) => {
                    "<body too large for preview>".to_owned()
                }
                Err(e) => return Err(e),
            };
            return Err(TransportError::HttpStatus {
                status,
                body_preview,
            });
        }

        read_body_limited(response, self.max_body_size).await
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Bytes, TransportError> {
        self.send(Method::GET, url, None).await
    }

    async fn post_json(&self, url: &str, body: Bytes) -> Result<Bytes, TransportError> {
        self.send(Method::POST, url, Some(body)).await
    }
}

/// Absolute `http`/`https` URL with a host.
fn parse_url(url: &str) -> Result<Uri, TransportError> {
    let invalid = |reason: String| TransportError::InvalidUri {
        url: url.to_owned(),
        reason,
    };

    let uri: Uri = url.parse().map_err(|e: http::uri::InvalidUri| invalid(e.to_string()))?;
    if uri.authority().is_none() {
        return Err(invalid("missing host/authority".to_owned()));
    }
    match uri.scheme_str() {
        Some("http" | "https") => Ok(uri),
        Some(other) => Err(invalid(format!("unsupported scheme '{other}'"))),
        None => Err(invalid("missing scheme".to_owned())),
    }
}

/// Collect the (decompressed) body, failing once it exceeds `limit` bytes.
async fn read_body_limited(
    response: Response<ResponseBody>,
    limit: usize,
) -> Result<Bytes, TransportError> {
    let mut body = std::pin::pin!(response.into_body());
    let mut collected = Vec::new();

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(TransportError::Transport)?;
        if let Some(chunk) = frame.data_ref() {
            let actual = collected.len() + chunk.len();
            if actual > limit {
                return Err(TransportError::BodyTooLarge { limit, actual });
            }
            collected.extend_from_slice(chunk);
        }
    }

    Ok(Bytes::from(collected))
}

fn box_response_body<B>(response: Response<B>) -> Response<ResponseBody>
where
    B: hyper::body::Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, body.map_err(Into::into).boxed())
}

/// `Elapsed` becomes `Timeout` with the configured duration; typed errors pass through.
fn map_tower_error(err: tower::BoxError, timeout: Duration) -> TransportError {
    if err.is::<tower::timeout::error::Elapsed>() {
        return TransportError::Timeout(timeout);
    }
    match err.downcast::<TransportError>() {
        Ok(err) => *err,
        Err(other) => TransportError::Transport(other),
    }
}

fn map_buffer_error(err: tower::BoxError) -> TransportError {
    match err.downcast::<TransportError>() {
        Ok(err) => *err,
        Err(err) => {
            tracing::error!(error = %err, "transport worker closed unexpectedly");
            TransportError::ServiceClosed
        }
    }
}
