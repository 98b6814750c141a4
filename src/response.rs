use std::fmt;

use bytes::Bytes;
use http::response::Parts;
use serde::de::DeserializeOwned;
use url::Url;

use crate::header::{HeaderMap, CONTENT_LENGTH};
use crate::{Body, StatusCode, Version};

/// A Response to a completed `Request`.
///
/// The body is buffered before the request settles, so every accessor is
/// synchronous and the response can be inspected from an
/// [`Error`](crate::Error) as easily as from a resolved request.
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    url: Url,
    body: Bytes,
}

impl Response {
    pub(crate) fn new(parts: Parts, body: Bytes, url: Url) -> Response {
        Response {
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            url,
            body,
        }
    }

    /// Get the `StatusCode` of this `Response`.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the HTTP `Version` of this `Response`.
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Get the `Headers` of this `Response`.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a mutable reference to the `Headers` of this `Response`.
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Get the final `Url` of this `Response`.
    #[inline]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the content-length of the response.
    ///
    /// Responses to `HEAD` requests carry no body, so the advertised
    /// `content-length` header is reported when present.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .or(Some(self.body.len() as u64))
    }

    /// Get the buffered body.
    #[inline]
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Consumes the response, returning the buffered body.
    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// Get the body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// This method fails if the body is not valid UTF-8.
    pub fn text(&self) -> crate::Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| crate::error::decode(e).with_url(self.url.clone()))
    }

    /// Try to deserialize the response body as JSON.
    ///
    /// # Errors
    ///
    /// This method fails whenever the response body is not in JSON format,
    /// or it cannot be properly deserialized to target type `T`. For more
    /// details please see [`serde_json::from_slice`].
    pub fn json<T: DeserializeOwned>(&self) -> crate::Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| crate::error::decode(e).with_url(self.url.clone()))
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Response")
            .field("url", &self.url().as_str())
            .field("status", &self.status())
            .field("headers", self.headers())
            .finish()
    }
}

/// A `Response` can be obtained from a `http::Response`, which lets custom
/// transports hand back responses they built themselves.
///
/// The url is taken from [`ResponseBuilderExt::url`], falling back to
/// `http://no.url.provided.local`.
impl<T: Into<Body>> From<http::Response<T>> for Response {
    fn from(r: http::Response<T>) -> Response {
        let (mut parts, body) = r.into_parts();
        let url = parts
            .extensions
            .remove::<ResponseUrl>()
            .map(|ResponseUrl(url)| url)
            .unwrap_or_else(|| {
                Url::parse("http://no.url.provided.local").expect("a static url is valid")
            });
        Response::new(parts, body.into().into_bytes(), url)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ResponseUrl(Url);

/// Extension trait for http::response::Builder objects
///
/// Allows the user to add a `Url` to the http::Response
pub trait ResponseBuilderExt {
    /// A builder method for the `http::response::Builder` type that allows the user to add a `Url`
    /// to the `http::Response`
    fn url(self, url: Url) -> Self;
}

impl ResponseBuilderExt for http::response::Builder {
    fn url(self, url: Url) -> Self {
        self.extension(ResponseUrl(url))
    }
}
