#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

//! # request-promise
//!
//! A request builder whose completion is a future.
//!
//! Requests are configured the usual way (headers, query, JSON or form
//! bodies, auth, timeouts) and then completed. Completion hands back a
//! deferred value, [`Pending`], that resolves with the [`Response`] or
//! rejects with an [`Error`]. When the failure happened after a response was
//! received, for example a `404`, the response travels with the error.
//!
//! - Every configuration call behaves like a plain request builder
//! - `end`, `end_with` (legacy callback), `then` and `.await` complete it
//! - A detachable [`Abort`] handle can be captured before completion
//!
//! ## Making a GET request
//!
//! For a single request, you can use the [`get`] shortcut method.
//!
//! ```no_run
//! # async fn run() -> Result<(), request_promise::Error> {
//! let body = request_promise::get("https://www.rust-lang.org")
//!     .await?
//!     .text()?;
//!
//! println!("body = {body:?}");
//! # Ok(())
//! # }
//! ```
//!
//! If you plan to perform multiple requests, it is best to create an
//! [`Agent`] and reuse it, taking advantage of keep-alive connection
//! pooling and shared defaults such as a base URL.
//!
//! ## Per-verb helpers
//!
//! The `*_with` helpers on [`Agent`] take an optional payload and an
//! optional callback that receives the request's abort handle right away:
//!
//! ```no_run
//! # async fn run() -> Result<(), request_promise::Error> {
//! let agent = request_promise::Agent::builder()
//!     .base_url("http://localhost:3000".parse().unwrap())
//!     .build()?;
//!
//! let mut abort = None;
//! let pending = agent
//!     .get_with("/items", Some(&[("page", 2)]), Some(|a| abort = Some(a)))
//!     .end();
//!
//! // `abort` can now cancel the request from anywhere.
//! let res = pending.await?;
//! # drop((res, abort));
//! # Ok(())
//! # }
//! ```
//!
//! ## Rejections carry the response
//!
//! By default only `2xx` responses resolve. Anything else rejects with a
//! status error that still exposes the response:
//!
//! ```no_run
//! # async fn run() {
//! let err = request_promise::del("http://localhost:3000/items/1")
//!     .await
//!     .unwrap_err();
//!
//! if let Some(res) = err.response() {
//!     println!("server said {}: {}", res.status(), res.text().unwrap_or_default());
//! }
//! # }
//! ```

#[macro_use]
extern crate log;

pub use http::header;
pub use http::Method;
pub use http::{StatusCode, Version};
pub use url::Url;

pub use self::abort::Abort;
pub use self::agent::{Agent, AgentBuilder};
pub use self::body::Body;
pub use self::error::{Error, Result};
pub use self::into_url::IntoUrl;
pub use self::pending::Pending;
pub use self::request::{Request, RequestBuilder};
pub use self::response::{Response, ResponseBuilderExt};
pub use self::transport::{HttpTransport, ResponseFuture, Transport};

mod abort;
mod agent;
mod body;
mod error;
mod into_url;
mod pending;
mod request;
mod response;
mod transport;
mod util;

/// Start building a request with the given method and URL, using a default
/// [`Agent`].
///
/// The URL must be absolute; use [`Agent::builder`] with a base URL for
/// relative ones.
pub fn request<U: IntoUrl>(method: Method, url: U) -> RequestBuilder {
    Agent::new().request(method, url)
}

/// Shortcut method to quickly make a `GET` request.
///
/// **NOTE**: This function creates a new internal `Agent` on each call,
/// and so should not be used if making many requests. Create an
/// [`Agent`](./struct.Agent.html) instead.
///
/// # Examples
///
/// ```rust
/// # async fn run() -> Result<(), request_promise::Error> {
/// let body = request_promise::get("https://www.rust-lang.org").await?
///     .text()?;
/// # Ok(())
/// # }
/// ```
pub fn get<U: IntoUrl>(url: U) -> RequestBuilder {
    Agent::new().get(url)
}

/// Shortcut method to quickly make a `POST` request.
pub fn post<U: IntoUrl>(url: U) -> RequestBuilder {
    Agent::new().post(url)
}

/// Shortcut method to quickly make a `PUT` request.
pub fn put<U: IntoUrl>(url: U) -> RequestBuilder {
    Agent::new().put(url)
}

/// Shortcut method to quickly make a `PATCH` request.
pub fn patch<U: IntoUrl>(url: U) -> RequestBuilder {
    Agent::new().patch(url)
}

/// Shortcut method to quickly make a `DELETE` request.
pub fn delete<U: IntoUrl>(url: U) -> RequestBuilder {
    Agent::new().delete(url)
}

/// Alias of [`delete`].
pub fn del<U: IntoUrl>(url: U) -> RequestBuilder {
    Agent::new().del(url)
}

/// Shortcut method to quickly make a `HEAD` request.
pub fn head<U: IntoUrl>(url: U) -> RequestBuilder {
    Agent::new().head(url)
}

/// Shortcut method to quickly make an `OPTIONS` request.
pub fn options<U: IntoUrl>(url: U) -> RequestBuilder {
    Agent::new().options(url)
}

#[cfg(test)]
mod tests {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn test_types_are_send_sync() {
        assert_send::<crate::Agent>();
        assert_sync::<crate::Agent>();
        assert_send::<crate::RequestBuilder>();
        assert_send::<crate::Pending>();
        assert_send::<crate::Abort>();
        assert_sync::<crate::Abort>();
        assert_send::<crate::Response>();
        assert_sync::<crate::Response>();
        assert_send::<crate::HttpTransport>();
        assert_sync::<crate::HttpTransport>();
        assert_send::<crate::ResponseFuture>();
    }

    #[test]
    fn custom_transport_plugs_in_from_root() {
        struct Refuse;

        impl crate::Transport for Refuse {
            fn execute(&self, request: crate::Request) -> crate::ResponseFuture {
                let err = crate::Error::transport(std::io::Error::from(
                    std::io::ErrorKind::ConnectionRefused,
                ))
                .with_url(request.url().clone());
                Box::pin(futures_util::future::ready(Err(err)))
            }
        }

        let agent = crate::Agent::builder().transport(Refuse).build().unwrap();
        let pending = agent.get("http://localhost/x").end();
        let err = futures_util::FutureExt::now_or_never(pending)
            .expect("ready transport settles on first poll")
            .unwrap_err();
        assert!(err.is_request());
    }

    #[test]
    fn shortcuts_pick_methods() {
        use crate::Method;

        let url = "http://localhost/x";
        assert_eq!(crate::request(Method::TRACE, url).build().unwrap().method(), &Method::TRACE);
        assert_eq!(crate::get(url).build().unwrap().method(), &Method::GET);
        assert_eq!(crate::post(url).build().unwrap().method(), &Method::POST);
        assert_eq!(crate::put(url).build().unwrap().method(), &Method::PUT);
        assert_eq!(crate::patch(url).build().unwrap().method(), &Method::PATCH);
        assert_eq!(crate::delete(url).build().unwrap().method(), &Method::DELETE);
        assert_eq!(crate::del(url).build().unwrap().method(), &Method::DELETE);
        assert_eq!(crate::head(url).build().unwrap().method(), &Method::HEAD);
        assert_eq!(crate::options(url).build().unwrap().method(), &Method::OPTIONS);
    }
}
