use std::fmt;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{self, Either};
use serde::Serialize;

use crate::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use crate::{Abort, Agent, Body, Error, Method, Pending, Response, Url};

/// A request which can be handed to a [`Transport`](crate::Transport).
#[derive(Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Body>,
    timeout: Option<Duration>,
}

/// The augmented request: a builder whose completion is a future.
///
/// Every configuration method mirrors the familiar request-builder surface.
/// Only completion differs: [`end`](RequestBuilder::end),
/// [`end_with`](RequestBuilder::end_with), [`then`](RequestBuilder::then)
/// and `.await` all return a deferred value that resolves with the
/// [`Response`] or rejects with an [`Error`] carrying whatever response was
/// received.
///
/// ```no_run
/// # async fn run() -> Result<(), request_promise::Error> {
/// let res = request_promise::get("http://localhost:3000/items")
///     .query(&[("page", 2)])
///     .await?;
/// println!("{}", res.text()?);
/// # Ok(())
/// # }
/// ```
#[must_use = "RequestBuilder does nothing until completed"]
pub struct RequestBuilder {
    agent: Agent,
    request: crate::Result<Request>,
    abort: Abort,
    ok: Option<OkPolicy>,
}

type OkPolicy = Arc<dyn Fn(&Response) -> bool + Send + Sync>;

type Callback = Box<dyn FnOnce(&crate::Result<Response>) + Send>;

impl Request {
    /// Constructs a new request.
    #[inline]
    pub fn new(method: Method, url: Url) -> Self {
        Request {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Get the method.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get a mutable reference to the method.
    #[inline]
    pub fn method_mut(&mut self) -> &mut Method {
        &mut self.method
    }

    /// Get the url.
    #[inline]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get a mutable reference to the url.
    #[inline]
    pub fn url_mut(&mut self) -> &mut Url {
        &mut self.url
    }

    /// Get the headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a mutable reference to the headers.
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Get the body.
    #[inline]
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Get a mutable reference to the body.
    #[inline]
    pub fn body_mut(&mut self) -> &mut Option<Body> {
        &mut self.body
    }

    /// Get the timeout.
    #[inline]
    pub fn timeout(&self) -> Option<&Duration> {
        self.timeout.as_ref()
    }

    /// Get a mutable reference to the timeout.
    #[inline]
    pub fn timeout_mut(&mut self) -> &mut Option<Duration> {
        &mut self.timeout
    }

    pub(crate) fn pieces(self) -> (Method, Url, HeaderMap, Option<Body>, Option<Duration>) {
        (self.method, self.url, self.headers, self.body, self.timeout)
    }
}

impl RequestBuilder {
    pub(crate) fn new(agent: Agent, request: crate::Result<Request>) -> RequestBuilder {
        let mut builder = RequestBuilder {
            agent,
            request,
            abort: Abort::new(),
            ok: None,
        };

        let auth = builder
            .request
            .as_mut()
            .ok()
            .and_then(|req| extract_authority(&mut req.url));

        if let Some((username, password)) = auth {
            builder.basic_auth(username, password)
        } else {
            builder
        }
    }

    /// Add a `Header` to this Request.
    pub fn header<K, V>(self, key: K, value: V) -> RequestBuilder
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.header_sensitive(key, value, false)
    }

    /// Add a `Header` to this Request with ability to define if `header_value` is sensitive.
    fn header_sensitive<K, V>(mut self, key: K, value: V, sensitive: bool) -> RequestBuilder
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        let mut error = None;
        if let Ok(ref mut req) = self.request {
            match <HeaderName as TryFrom<K>>::try_from(key) {
                Ok(key) => match <HeaderValue as TryFrom<V>>::try_from(value) {
                    Ok(mut value) => {
                        // We want to potentially make an non-sensitive header
                        // to be sensitive, not the reverse. So, don't turn off
                        // a previously sensitive header.
                        if sensitive {
                            value.set_sensitive(true);
                        }
                        req.headers_mut().append(key, value);
                    }
                    Err(e) => error = Some(crate::error::builder(e.into())),
                },
                Err(e) => error = Some(crate::error::builder(e.into())),
            };
        }
        if let Some(err) = error {
            self.request = Err(err);
        }
        self
    }

    /// Add a set of Headers to the existing ones on this Request.
    ///
    /// The headers will be merged in to any already set.
    pub fn headers(mut self, headers: HeaderMap) -> RequestBuilder {
        if let Ok(ref mut req) = self.request {
            crate::util::replace_headers(req.headers_mut(), headers);
        }
        self
    }

    /// Enable HTTP basic authentication.
    ///
    /// ```rust
    /// let req = request_promise::delete("http://httpbin.org/delete")
    ///     .basic_auth("admin", Some("good password"));
    /// ```
    pub fn basic_auth<U, P>(self, username: U, password: Option<P>) -> RequestBuilder
    where
        U: fmt::Display,
        P: fmt::Display,
    {
        let header_value = crate::util::basic_auth(username, password);
        self.header_sensitive(AUTHORIZATION, header_value, true)
    }

    /// Enable HTTP bearer authentication.
    pub fn bearer_auth<T>(self, token: T) -> RequestBuilder
    where
        T: fmt::Display,
    {
        let header_value = format!("Bearer {token}");
        self.header_sensitive(AUTHORIZATION, header_value, true)
    }

    /// Set the request body.
    pub fn body<T: Into<Body>>(mut self, body: T) -> RequestBuilder {
        if let Ok(ref mut req) = self.request {
            *req.body_mut() = Some(body.into());
        }
        self
    }

    /// Enables a request timeout.
    ///
    /// The timeout is applied from when the request starts connecting until
    /// the response body has finished. It overrides the timeout configured
    /// on the [`Agent`].
    pub fn timeout(mut self, timeout: Duration) -> RequestBuilder {
        if let Ok(ref mut req) = self.request {
            *req.timeout_mut() = Some(timeout);
        }
        self
    }

    /// Modify the query string of the URL.
    ///
    /// Modifies the URL of this request, adding the parameters provided.
    /// This method appends and does not overwrite. This means that it can
    /// be called multiple times and that existing query parameters are not
    /// overwritten if the same key is used. The key will simply show up
    /// twice in the query string.
    /// Calling `.query(&[("foo", "a"), ("foo", "b")])` gives `"foo=a&foo=b"`.
    ///
    /// # Note
    /// This method does not support serializing a single key-value
    /// pair. Instead of using `.query(("key", "val"))`, use a sequence, such
    /// as `.query(&[("key", "val")])`. It's also possible to serialize structs
    /// and maps into a key-value pair.
    ///
    /// # Errors
    /// This method will fail if the object you provide cannot be serialized
    /// into a query string.
    pub fn query<T: Serialize + ?Sized>(mut self, query: &T) -> RequestBuilder {
        let mut error = None;
        if let Ok(ref mut req) = self.request {
            let url = req.url_mut();
            let mut pairs = url.query_pairs_mut();
            let serializer = serde_urlencoded::Serializer::new(&mut pairs);

            if let Err(err) = query.serialize(serializer) {
                error = Some(crate::error::builder(err));
            }
        }
        if let Ok(ref mut req) = self.request {
            if let Some("") = req.url().query() {
                req.url_mut().set_query(None);
            }
        }
        if let Some(err) = error {
            self.request = Err(err);
        }
        self
    }

    /// Send a form body.
    ///
    /// Sets the body to the url encoded serialization of the passed value,
    /// and also sets the `Content-Type: application/x-www-form-urlencoded`
    /// header.
    ///
    /// # Errors
    ///
    /// This method fails if the passed value cannot be serialized into
    /// url encoded format
    pub fn form<T: Serialize + ?Sized>(mut self, form: &T) -> RequestBuilder {
        let mut error = None;
        if let Ok(ref mut req) = self.request {
            match serde_urlencoded::to_string(form) {
                Ok(body) => {
                    req.headers_mut()
                        .entry(CONTENT_TYPE)
                        .or_insert(HeaderValue::from_static(
                            "application/x-www-form-urlencoded",
                        ));
                    *req.body_mut() = Some(body.into());
                }
                Err(err) => error = Some(crate::error::builder(err)),
            }
        }
        if let Some(err) = error {
            self.request = Err(err);
        }
        self
    }

    /// Send a JSON body.
    ///
    /// # Errors
    ///
    /// Serialization can fail if `T`'s implementation of `Serialize` decides to
    /// fail, or if `T` contains a map with non-string keys.
    pub fn json<T: Serialize + ?Sized>(mut self, json: &T) -> RequestBuilder {
        let mut error = None;
        if let Ok(ref mut req) = self.request {
            match serde_json::to_vec(json) {
                Ok(body) => {
                    if !req.headers().contains_key(CONTENT_TYPE) {
                        req.headers_mut()
                            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                    }
                    *req.body_mut() = Some(body.into());
                }
                Err(err) => error = Some(crate::error::builder(err)),
            }
        }
        if let Some(err) = error {
            self.request = Err(err);
        }
        self
    }

    /// Replace the policy deciding which responses resolve the request.
    ///
    /// By default only `2xx` responses resolve; anything else rejects with a
    /// status error carrying the response.
    ///
    /// ```rust
    /// // treat "not found" as an answer, not a failure
    /// let req = request_promise::get("http://localhost:3000/items/1")
    ///     .ok(|res| res.status().is_success() || res.status() == 404);
    /// ```
    pub fn ok<F>(mut self, policy: F) -> RequestBuilder
    where
        F: Fn(&Response) -> bool + Send + Sync + 'static,
    {
        self.ok = Some(Arc::new(policy));
        self
    }

    /// Abort the request.
    ///
    /// Equivalent to calling [`Abort::abort`] on this request's handle.
    pub fn abort(&self) {
        self.abort.abort();
    }

    /// A detached handle that aborts this request, usable after the builder
    /// has been consumed.
    pub fn abort_handle(&self) -> Abort {
        self.abort.clone()
    }

    /// Build a `Request`, which can be inspected, modified and executed with
    /// a [`Transport`](crate::Transport).
    ///
    /// The agent's default headers are not part of the built `Request`; they
    /// are filled in at completion for every name the request left unset.
    pub fn build(self) -> crate::Result<Request> {
        self.request
    }

    /// Attempt to clone the RequestBuilder.
    ///
    /// `None` is returned if the builder holds a configuration error.
    ///
    /// The clone shares this request's abort handle, so completing both
    /// triggers the transport twice while one `abort()` stops both.
    pub fn try_clone(&self) -> Option<RequestBuilder> {
        self.request.as_ref().ok().map(|req| RequestBuilder {
            agent: self.agent.clone(),
            request: Ok(req.clone()),
            abort: self.abort.clone(),
            ok: self.ok.clone(),
        })
    }

    /// Completes the request, returning a future of its `Response`.
    ///
    /// # Errors
    ///
    /// The future rejects if the request was misconfigured, the transport
    /// failed, the timeout elapsed, the request was aborted, or the
    /// response did not pass the ok policy. In the last case the response
    /// is available through [`Error::response`].
    pub fn end(self) -> Pending {
        self.complete(None)
    }

    /// Completes the request, also reporting the outcome to `callback`.
    ///
    /// The callback runs exactly once, with the same outcome the returned
    /// future settles with, before the future settles.
    ///
    /// ```no_run
    /// # async fn run() {
    /// let res = request_promise::get("http://localhost:3000/items")
    ///     .end_with(|outcome| match outcome {
    ///         Ok(res) => println!("got {}", res.status()),
    ///         Err(err) => println!("failed: {err}"),
    ///     })
    ///     .await;
    /// # drop(res);
    /// # }
    /// ```
    pub fn end_with<F>(self, callback: F) -> Pending
    where
        F: FnOnce(&crate::Result<Response>) + Send + 'static,
    {
        self.complete(Some(Box::new(callback)))
    }

    /// Completes the request and maps its outcome through one of two handlers.
    ///
    /// `on_resolve` receives the response when the request succeeds,
    /// `on_reject` receives the error otherwise.
    pub fn then<T, R, E>(self, on_resolve: R, on_reject: E) -> impl Future<Output = T> + Send
    where
        R: FnOnce(Response) -> T + Send + 'static,
        E: FnOnce(Error) -> T + Send + 'static,
        T: Send + 'static,
    {
        let pending = self.end();
        async move {
            match pending.await {
                Ok(res) => on_resolve(res),
                Err(err) => on_reject(err),
            }
        }
    }

    fn complete(self, callback: Option<Callback>) -> Pending {
        let RequestBuilder {
            agent,
            request,
            abort,
            ok,
        } = self;

        Pending::new(async move {
            let outcome = match request {
                Ok(req) => settle(agent, req, abort, ok).await,
                Err(err) => Err(err),
            };

            if let Some(callback) = callback {
                callback(&outcome);
            }

            outcome
        })
    }
}

async fn settle(
    agent: Agent,
    mut req: Request,
    abort: Abort,
    ok: Option<OkPolicy>,
) -> crate::Result<Response> {
    let url = req.url().clone();

    if abort.is_aborted() {
        trace!("{} {} aborted before start", req.method(), url);
        return Err(crate::error::aborted(url));
    }

    debug!("{} {}", req.method(), url);

    agent.apply_default_headers(req.headers_mut());

    let timeout = req.timeout().copied().or(agent.timeout());
    let in_flight = agent.transport().execute(req);
    let transfer = async move {
        match timeout {
            Some(timeout) => match tokio::time::timeout(timeout, in_flight).await {
                Ok(res) => res,
                Err(_elapsed) => Err(crate::error::request(crate::error::TimedOut)),
            },
            None => in_flight.await,
        }
    };

    let aborted = abort.aborted();
    futures_util::pin_mut!(transfer);
    futures_util::pin_mut!(aborted);

    let res = match future::select(aborted, transfer).await {
        Either::Left(((), _)) => {
            trace!("{} aborted in flight", url);
            return Err(crate::error::aborted(url));
        }
        Either::Right((res, _)) => res.map_err(|err| {
            if err.url().is_some() {
                err
            } else {
                err.with_url(url.clone())
            }
        })?,
    };

    let accepted = match ok {
        Some(policy) => policy(&res),
        None => res.status().is_success(),
    };

    if accepted {
        Ok(res)
    } else {
        trace!("response '{}' for {} rejected by ok policy", res.status(), url);
        Err(crate::error::status_code(res))
    }
}

impl IntoFuture for RequestBuilder {
    type Output = crate::Result<Response>;
    type IntoFuture = Pending;

    fn into_future(self) -> Self::IntoFuture {
        self.end()
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt_request_fields(&mut f.debug_struct("Request"), self).finish()
    }
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.request {
            Ok(ref req) => fmt_request_fields(&mut f.debug_struct("RequestBuilder"), req).finish(),
            Err(ref err) => f.debug_struct("RequestBuilder").field("error", err).finish(),
        }
    }
}

fn fmt_request_fields<'a, 'b>(
    f: &'a mut fmt::DebugStruct<'a, 'b>,
    req: &Request,
) -> &'a mut fmt::DebugStruct<'a, 'b> {
    f.field("method", &req.method)
        .field("url", &req.url.as_str())
        .field("headers", &req.headers)
}

/// Check the request URL for a "username:password" type authority, and if
/// found, remove it from the URL and return it.
pub(crate) fn extract_authority(url: &mut Url) -> Option<(String, Option<String>)> {
    use percent_encoding::percent_decode;

    if url.has_authority() {
        let username: String = percent_decode(url.username().as_bytes())
            .decode_utf8()
            .ok()?
            .into();
        let password = url.password().and_then(|pass| {
            percent_decode(pass.as_bytes())
                .decode_utf8()
                .ok()
                .map(String::from)
        });
        if !username.is_empty() || password.is_some() {
            url.set_username("")
                .expect("has_authority means set_username shouldn't fail");
            url.set_password(None)
                .expect("has_authority means set_password shouldn't fail");
            return Some((username, password));
        }
    }

    None
}
