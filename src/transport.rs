//! The seam between request completion and the wire.
//!
//! A [`Transport`] turns a fully configured [`Request`] into a [`Response`].
//! Completion semantics (the legacy callback, abort, timeouts and the ok
//! policy) live in [`RequestBuilder`](crate::RequestBuilder), so a transport
//! only has to move bytes.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::{TokioExecutor, TokioTimer};

use crate::into_url::try_uri;
use crate::{Body, Request, Response};

/// The boxed future a [`Transport`] returns.
pub type ResponseFuture = Pin<Box<dyn Future<Output = crate::Result<Response>> + Send>>;

/// Sends requests and receives their responses.
///
/// Every call to `execute` must start one independent exchange. Returning
/// `Ok` for any received response is expected; deciding which statuses are
/// failures is up to the request's ok policy.
pub trait Transport: Send + Sync + 'static {
    /// Send `request`, resolving once the full response has been received.
    fn execute(&self, request: Request) -> ResponseFuture;
}

/// The default [`Transport`]: HTTP/1.1 over plain TCP with connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    hyper: HyperClient<HttpConnector, Full<Bytes>>,
}

impl HttpTransport {
    /// Constructs a transport with default settings.
    pub fn new() -> HttpTransport {
        HttpTransport::with_settings(None, Some(Duration::from_secs(90)), usize::MAX, true)
    }

    pub(crate) fn with_settings(
        connect_timeout: Option<Duration>,
        pool_idle_timeout: Option<Duration>,
        pool_max_idle_per_host: usize,
        nodelay: bool,
    ) -> HttpTransport {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(connect_timeout);
        connector.set_nodelay(nodelay);

        let hyper = HyperClient::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(pool_idle_timeout)
            .pool_max_idle_per_host(pool_max_idle_per_host)
            .build(connector);

        HttpTransport { hyper }
    }
}

impl Default for HttpTransport {
    fn default() -> HttpTransport {
        HttpTransport::new()
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: Request) -> ResponseFuture {
        let (method, url, headers, body, _timeout) = request.pieces();

        let uri = match try_uri(&url) {
            Some(uri) => uri,
            None => return Box::pin(futures_util::future::ready(Err(crate::error::url_invalid_uri(url)))),
        };

        let mut req = match http::Request::builder()
            .method(method)
            .uri(uri)
            .body(body.unwrap_or_else(Body::empty).into_full())
        {
            Ok(req) => req,
            Err(err) => {
                return Box::pin(futures_util::future::ready(Err(
                    crate::error::builder(err).with_url(url)
                )))
            }
        };
        *req.headers_mut() = headers;

        let in_flight = self.hyper.request(req);

        Box::pin(async move {
            let res = in_flight
                .await
                .map_err(|e| crate::error::request(e).with_url(url.clone()))?;

            let (parts, incoming) = res.into_parts();
            let body = incoming
                .collect()
                .await
                .map_err(|e| crate::error::body(e).with_url(url.clone()))?
                .to_bytes();

            debug!("response '{}' for {}", parts.status, url);
            Ok(Response::new(parts, body, url))
        })
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("HttpTransport").finish()
    }
}
