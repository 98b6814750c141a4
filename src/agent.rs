use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use crate::into_url::resolve;
use crate::transport::HttpTransport;
use crate::{Abort, IntoUrl, Method, Request, RequestBuilder, Transport, Url};

static DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The entry point for building requests.
///
/// An `Agent` plays the role of the request factory: [`request`](Agent::request)
/// builds a [`RequestBuilder`] for any method, and the per-verb helpers build
/// one for a fixed method. It carries the defaults applied to every request
/// (base URL, headers, timeout) and the [`Transport`] that completes them.
/// A header set on the request replaces the default of the same name.
///
/// The `Agent` holds a connection pool internally, so it is advised that
/// you create one and **reuse** it. Cloning is cheap.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentRef>,
}

struct AgentRef {
    base_url: Option<Url>,
    headers: HeaderMap,
    timeout: Option<Duration>,
    transport: Arc<dyn Transport>,
}

/// A `AgentBuilder` can be used to create an `Agent` with custom configuration.
#[must_use]
pub struct AgentBuilder {
    config: Config,
}

struct Config {
    // NOTE: When adding a new field, update `fmt::Debug for AgentBuilder`
    error: Option<crate::Error>,
    base_url: Option<Url>,
    headers: HeaderMap,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_idle_timeout: Option<Duration>,
    pool_max_idle_per_host: usize,
    nodelay: bool,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    /// Constructs a new `AgentBuilder`.
    ///
    /// This is the same as `Agent::builder()`.
    pub fn new() -> AgentBuilder {
        let mut headers: HeaderMap<HeaderValue> = HeaderMap::with_capacity(2);
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        AgentBuilder {
            config: Config {
                error: None,
                base_url: None,
                headers,
                timeout: None,
                connect_timeout: None,
                pool_idle_timeout: Some(Duration::from_secs(90)),
                pool_max_idle_per_host: usize::MAX,
                nodelay: true,
                transport: None,
            },
        }
    }

    /// Returns an `Agent` that uses this `AgentBuilder` configuration.
    ///
    /// # Errors
    ///
    /// This method fails if one of the configuration calls was given an
    /// invalid value (for example a `user_agent` that is not a valid header
    /// value).
    pub fn build(self) -> crate::Result<Agent> {
        let config = self.config;

        if let Some(err) = config.error {
            return Err(err);
        }

        let transport = match config.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::with_settings(
                config.connect_timeout,
                config.pool_idle_timeout,
                config.pool_max_idle_per_host,
                config.nodelay,
            )),
        };

        Ok(Agent {
            inner: Arc::new(AgentRef {
                base_url: config.base_url,
                headers: config.headers,
                timeout: config.timeout,
                transport,
            }),
        })
    }

    /// Resolve relative request URLs against `base`.
    ///
    /// ```rust
    /// # fn run() -> Result<(), request_promise::Error> {
    /// let agent = request_promise::Agent::builder()
    ///     .base_url("http://localhost:3000/api/".parse().unwrap())
    ///     .build()?;
    /// let req = agent.get("items").build()?;
    /// assert_eq!(req.url().as_str(), "http://localhost:3000/api/items");
    /// # Ok(())
    /// # }
    /// ```
    pub fn base_url(mut self, base: Url) -> AgentBuilder {
        self.config.base_url = Some(base);
        self
    }

    /// Sets the `User-Agent` header to be used by this agent.
    pub fn user_agent<V>(mut self, value: V) -> AgentBuilder
    where
        V: TryInto<HeaderValue>,
        V::Error: Into<http::Error>,
    {
        match value.try_into() {
            Ok(value) => {
                self.config.headers.insert(USER_AGENT, value);
            }
            Err(e) => {
                self.config.error = Some(crate::error::builder(e.into()));
            }
        };
        self
    }

    /// Sets the default headers for every request.
    ///
    /// Headers set on a request replace these defaults.
    pub fn default_headers(mut self, headers: HeaderMap) -> AgentBuilder {
        crate::util::replace_headers(&mut self.config.headers, headers);
        self
    }

    /// Enables a total request timeout.
    ///
    /// The timeout is applied from when the request starts connecting until
    /// the response body has finished. Also considered a total deadline.
    ///
    /// Default is no timeout.
    pub fn timeout(mut self, timeout: Duration) -> AgentBuilder {
        self.config.timeout = Some(timeout);
        self
    }

    /// Set a timeout for only the connect phase of the bundled HTTP transport.
    ///
    /// Default is `None`.
    pub fn connect_timeout(mut self, timeout: Duration) -> AgentBuilder {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Set an optional timeout for idle sockets being kept-alive.
    ///
    /// Pass `None` to disable timeout.
    ///
    /// Default is 90 seconds.
    pub fn pool_idle_timeout<D>(mut self, val: D) -> AgentBuilder
    where
        D: Into<Option<Duration>>,
    {
        self.config.pool_idle_timeout = val.into();
        self
    }

    /// Sets the maximum idle connection per host allowed in the pool.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> AgentBuilder {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Set whether sockets have `TCP_NODELAY` enabled.
    ///
    /// Default is `true`.
    pub fn tcp_nodelay(mut self, enabled: bool) -> AgentBuilder {
        self.config.nodelay = enabled;
        self
    }

    /// Complete requests with a custom [`Transport`] instead of the bundled
    /// HTTP one.
    ///
    /// The connection settings of this builder only apply to the bundled
    /// transport and are ignored once a custom one is set.
    pub fn transport<T: Transport>(mut self, transport: T) -> AgentBuilder {
        self.config.transport = Some(Arc::new(transport));
        self
    }
}

impl Agent {
    /// Constructs a new `Agent`.
    ///
    /// # Panics
    ///
    /// This method panics if the default configuration fails to build.
    /// Use `Agent::builder()` if you wish to handle the failure as an
    /// `Error` instead of panicking.
    pub fn new() -> Agent {
        AgentBuilder::new().build().expect("Agent::new()")
    }

    /// Creates an `AgentBuilder` to configure an `Agent`.
    ///
    /// This is the same as `AgentBuilder::new()`.
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Start building a `Request` with the `Method` and `Url`.
    ///
    /// Returns a `RequestBuilder`, which will allow setting headers and
    /// the request body before completing the `Request`.
    ///
    /// # Errors
    ///
    /// A `Url` that cannot be parsed (or a relative one when no base URL is
    /// configured) is reported when the request is completed.
    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        let req = resolve(url, self.inner.base_url.as_ref()).map(move |url| Request::new(method, url));
        RequestBuilder::new(self.clone(), req)
    }

    /// Convenience method to make a `GET` request to a URL.
    pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Convenience method to make a `POST` request to a URL.
    pub fn post<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Convenience method to make a `PUT` request to a URL.
    pub fn put<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    /// Convenience method to make a `PATCH` request to a URL.
    pub fn patch<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }

    /// Convenience method to make a `DELETE` request to a URL.
    pub fn delete<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    /// Alias of [`delete`](Agent::delete).
    pub fn del<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.delete(url)
    }

    /// Convenience method to make a `HEAD` request to a URL.
    pub fn head<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::HEAD, url)
    }

    /// Convenience method to make an `OPTIONS` request to a URL.
    pub fn options<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::OPTIONS, url)
    }

    /// `GET` with optional query parameters and an abort callback.
    ///
    /// `abort_cb` is called before this method returns, with the handle that
    /// aborts the new request.
    ///
    /// ```rust
    /// let agent = request_promise::Agent::new();
    /// let mut abort = None;
    /// let req = agent.get_with(
    ///     "http://localhost:3000/items",
    ///     Some(&[("page", 2)]),
    ///     Some(|handle| abort = Some(handle)),
    /// );
    /// assert!(abort.is_some());
    /// # drop(req);
    /// ```
    pub fn get_with<U, T, F>(&self, url: U, query: Option<&T>, abort_cb: Option<F>) -> RequestBuilder
    where
        U: IntoUrl,
        T: Serialize + ?Sized,
        F: FnOnce(Abort),
    {
        self.verb(Method::GET, url, query, abort_cb)
    }

    /// `HEAD` with optional query parameters and an abort callback.
    pub fn head_with<U, T, F>(&self, url: U, query: Option<&T>, abort_cb: Option<F>) -> RequestBuilder
    where
        U: IntoUrl,
        T: Serialize + ?Sized,
        F: FnOnce(Abort),
    {
        self.verb(Method::HEAD, url, query, abort_cb)
    }

    /// `POST` with an optional JSON body and an abort callback.
    pub fn post_with<U, T, F>(&self, url: U, data: Option<&T>, abort_cb: Option<F>) -> RequestBuilder
    where
        U: IntoUrl,
        T: Serialize + ?Sized,
        F: FnOnce(Abort),
    {
        self.verb(Method::POST, url, data, abort_cb)
    }

    /// `PUT` with an optional JSON body and an abort callback.
    pub fn put_with<U, T, F>(&self, url: U, data: Option<&T>, abort_cb: Option<F>) -> RequestBuilder
    where
        U: IntoUrl,
        T: Serialize + ?Sized,
        F: FnOnce(Abort),
    {
        self.verb(Method::PUT, url, data, abort_cb)
    }

    /// `PATCH` with an optional JSON body and an abort callback.
    pub fn patch_with<U, T, F>(&self, url: U, data: Option<&T>, abort_cb: Option<F>) -> RequestBuilder
    where
        U: IntoUrl,
        T: Serialize + ?Sized,
        F: FnOnce(Abort),
    {
        self.verb(Method::PATCH, url, data, abort_cb)
    }

    /// `DELETE` with an optional JSON body and an abort callback.
    pub fn delete_with<U, T, F>(&self, url: U, data: Option<&T>, abort_cb: Option<F>) -> RequestBuilder
    where
        U: IntoUrl,
        T: Serialize + ?Sized,
        F: FnOnce(Abort),
    {
        self.verb(Method::DELETE, url, data, abort_cb)
    }

    /// Alias of [`delete_with`](Agent::delete_with).
    pub fn del_with<U, T, F>(&self, url: U, data: Option<&T>, abort_cb: Option<F>) -> RequestBuilder
    where
        U: IntoUrl,
        T: Serialize + ?Sized,
        F: FnOnce(Abort),
    {
        self.delete_with(url, data, abort_cb)
    }

    /// `OPTIONS` with an abort callback.
    pub fn options_with<U, F>(&self, url: U, abort_cb: Option<F>) -> RequestBuilder
    where
        U: IntoUrl,
        F: FnOnce(Abort),
    {
        self.verb::<U, (), F>(Method::OPTIONS, url, None, abort_cb)
    }

    fn verb<U, T, F>(&self, method: Method, url: U, data: Option<&T>, abort_cb: Option<F>) -> RequestBuilder
    where
        U: IntoUrl,
        T: Serialize + ?Sized,
        F: FnOnce(Abort),
    {
        let as_query = method == Method::GET || method == Method::HEAD;
        let mut req = self.request(method, url);

        if let Some(data) = data {
            req = if as_query { req.query(data) } else { req.json(data) };
        }
        if let Some(abort_cb) = abort_cb {
            abort_cb(req.abort_handle());
        }
        req
    }

    // Fills in every default header the request did not set itself. A name
    // set on the request replaces all of that name's default values.
    pub(crate) fn apply_default_headers(&self, headers: &mut HeaderMap) {
        for name in self.inner.headers.keys() {
            if headers.contains_key(name) {
                continue;
            }
            for value in self.inner.headers.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }
    }

    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.inner.timeout
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        &*self.inner.transport
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut builder = f.debug_struct("Agent");
        if let Some(ref base) = self.inner.base_url {
            builder.field("base_url", &base.as_str());
        }
        builder.field("default_headers", &self.inner.headers);
        if let Some(ref d) = self.inner.timeout {
            builder.field("timeout", d);
        }
        builder.finish()
    }
}

impl fmt::Debug for AgentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut builder = f.debug_struct("AgentBuilder");
        if let Some(ref base) = self.config.base_url {
            builder.field("base_url", &base.as_str());
        }
        builder.field("default_headers", &self.config.headers);
        if let Some(ref d) = self.config.timeout {
            builder.field("timeout", d);
        }
        if let Some(ref d) = self.config.connect_timeout {
            builder.field("connect_timeout", d);
        }
        builder
            .field("pool_idle_timeout", &self.config.pool_idle_timeout)
            .field("pool_max_idle_per_host", &self.config.pool_max_idle_per_host)
            .field("tcp_nodelay", &self.config.nodelay)
            .field("custom_transport", &self.config.transport.is_some());
        if let Some(ref err) = self.config.error {
            builder.field("error", err);
        }
        builder.finish()
    }
}
