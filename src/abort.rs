use std::fmt;

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// A detached handle that aborts the request it was taken from.
///
/// The handle does not borrow the request: it can be handed to a callback
/// right after the request is built, moved to another task, and used after
/// the request itself has been consumed by [`end`](crate::RequestBuilder::end).
///
/// Aborting is sticky. A completion that is in flight rejects with an
/// abort error, and completions started afterwards reject without reaching
/// the transport. Aborting a request that already settled does nothing.
///
/// ```
/// # async fn run() {
/// let mut abort = None;
/// let pending = request_promise::Agent::new()
///     .get_with("http://localhost:3000/slow", None::<&()>, Some(|a| abort = Some(a)))
///     .end();
///
/// if let Some(abort) = abort {
///     abort.abort();
/// }
/// assert!(pending.await.unwrap_err().is_abort());
/// # }
/// ```
#[derive(Clone, Default)]
pub struct Abort {
    token: CancellationToken,
}

impl Abort {
    pub(crate) fn new() -> Abort {
        Abort::default()
    }

    /// Requests that the owning request stop.
    pub fn abort(&self) {
        if !self.token.is_cancelled() {
            trace!("abort requested");
        }
        self.token.cancel();
    }

    /// Returns `true` once [`abort`](Abort::abort) has been called on this
    /// handle or any of its clones.
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Converts the handle into a plain closure.
    pub fn into_fn(self) -> impl Fn() + Send + Sync + 'static {
        move || self.abort()
    }

    pub(crate) fn aborted(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

impl fmt::Debug for Abort {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Abort")
            .field("aborted", &self.is_aborted())
            .finish()
    }
}
