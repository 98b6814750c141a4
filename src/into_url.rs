use url::Url;

/// A trait to try to convert some type into a `Url`.
///
/// This trait is "sealed", such that only types within request-promise can
/// implement it.
pub trait IntoUrl: IntoUrlSealed {}

impl IntoUrl for Url {}
impl IntoUrl for String {}
impl<'a> IntoUrl for &'a str {}
impl<'a> IntoUrl for &'a String {}

pub trait IntoUrlSealed {
    // Besides parsing as a valid `Url`, the `Url` must be a valid
    // `http::Uri`, in that it makes sense to use in a network request.
    fn into_url(self) -> crate::Result<Url>;

    fn as_str(&self) -> &str;
}

impl IntoUrlSealed for Url {
    fn into_url(self) -> crate::Result<Url> {
        if self.has_host() {
            Ok(self)
        } else {
            Err(crate::error::url_bad_scheme(self))
        }
    }

    fn as_str(&self) -> &str {
        self.as_ref()
    }
}

impl<'a> IntoUrlSealed for &'a str {
    fn into_url(self) -> crate::Result<Url> {
        Url::parse(self).map_err(crate::error::builder)?.into_url()
    }

    fn as_str(&self) -> &str {
        self
    }
}

impl<'a> IntoUrlSealed for &'a String {
    fn into_url(self) -> crate::Result<Url> {
        (&**self).into_url()
    }

    fn as_str(&self) -> &str {
        self.as_ref()
    }
}

impl IntoUrlSealed for String {
    fn into_url(self) -> crate::Result<Url> {
        (&*self).into_url()
    }

    fn as_str(&self) -> &str {
        self.as_ref()
    }
}

/// Resolves `url` against an optional base. Absolute inputs ignore the base.
pub(crate) fn resolve<U: IntoUrl>(url: U, base: Option<&Url>) -> crate::Result<Url> {
    match base {
        Some(base) => base
            .join(url.as_str())
            .map_err(crate::error::builder)?
            .into_url(),
        None => url.into_url(),
    }
}

pub(crate) fn try_uri(url: &Url) -> Option<http::Uri> {
    url.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_url_file_scheme() {
        let err = "file:///etc/hosts".into_url().unwrap_err();
        assert_eq!(
            err.to_string(),
            "builder error for url (file:///etc/hosts)"
        );
        assert!(err.is_builder());
    }

    #[test]
    fn relative_without_base_is_builder_error() {
        let err = resolve("/items", None).unwrap_err();
        assert!(err.is_builder());
        assert!(err.url().is_none());
    }

    #[test]
    fn relative_joins_base() {
        let base = Url::parse("http://localhost:3000/api/").unwrap();
        let url = resolve("items?page=2", Some(&base)).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/items?page=2");

        let url = resolve("/items/1", Some(&base)).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/items/1");
    }

    #[test]
    fn absolute_ignores_base() {
        let base = Url::parse("http://localhost:3000/").unwrap();
        let url = resolve("http://example.com/x", Some(&base)).unwrap();
        assert_eq!(url.as_str(), "http://example.com/x");
    }

    #[test]
    fn try_uri_keeps_path_and_query() {
        let url = "http://localhost:3000/items?page=2".into_url().unwrap();
        let uri = try_uri(&url).expect("valid uri");
        assert_eq!(uri.path_and_query().map(|pq| pq.as_str()), Some("/items?page=2"));
    }
}
