use std::fmt;

use bytes::Bytes;
use http_body_util::Full;

/// A request body.
///
/// Bodies are fully buffered and cheap to clone, so a request can be
/// completed again (see [`RequestBuilder::try_clone`](crate::RequestBuilder::try_clone))
/// without re-serializing its payload.
#[derive(Clone, Default)]
pub struct Body {
    inner: Bytes,
}

impl Body {
    /// Returns a reference to the internal data of the `Body`.
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Returns the length of the body in bytes.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the body holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub(crate) fn empty() -> Body {
        Body::default()
    }

    pub(crate) fn into_bytes(self) -> Bytes {
        self.inner
    }

    pub(crate) fn into_full(self) -> Full<Bytes> {
        Full::new(self.inner)
    }
}

impl From<Bytes> for Body {
    #[inline]
    fn from(bytes: Bytes) -> Body {
        Body { inner: bytes }
    }
}

impl From<Vec<u8>> for Body {
    #[inline]
    fn from(vec: Vec<u8>) -> Body {
        Bytes::from(vec).into()
    }
}

impl From<&'static [u8]> for Body {
    #[inline]
    fn from(s: &'static [u8]) -> Body {
        Bytes::from_static(s).into()
    }
}

impl From<String> for Body {
    #[inline]
    fn from(s: String) -> Body {
        Bytes::from(s).into()
    }
}

impl From<&'static str> for Body {
    #[inline]
    fn from(s: &'static str) -> Body {
        s.as_bytes().into()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Body")
            .field("len", &self.inner.len())
            .finish()
    }
}
