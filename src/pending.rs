use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::Response;

/// The deferred value returned by [`RequestBuilder::end`](crate::RequestBuilder::end).
///
/// Resolves with the `Response`, or rejects with an `Error` that carries the
/// response when one was received. The transport is started on first poll.
#[must_use = "futures do nothing unless polled"]
pub struct Pending {
    inner: Pin<Box<dyn Future<Output = crate::Result<Response>> + Send>>,
}

impl Pending {
    pub(crate) fn new<F>(fut: F) -> Pending
    where
        F: Future<Output = crate::Result<Response>> + Send + 'static,
    {
        Pending {
            inner: Box::pin(fut),
        }
    }
}

impl Future for Pending {
    type Output = crate::Result<Response>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Pending").finish()
    }
}
