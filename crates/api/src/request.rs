//! Request handling module that provides access to HTTP request information and path parameters.
//!
//! This module contains the core types for working with HTTP requests in the pipeline:
//! - `RequestContext`: Provides access to the request head, path parameters and raw body
//! - `PathParams`: Holds the variable segments captured by the matched route pattern

use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Uri};
use mime::Mime;
use percent_encoding::percent_decode_str;

/// Represents the raw, immutable side of one request: its head, the path parameters captured by
/// the matched route, and the body bytes.
///
/// The mutable per-request state (dependency cache, pending teardowns) lives in
/// [`RequestScope`](crate::dependency::RequestScope).
#[derive(Debug)]
pub struct RequestContext<'req> {
    head: &'req Parts,
    path_params: PathParams,
    body: Bytes,
}

impl<'req> RequestContext<'req> {
    /// Creates a new RequestContext from the request head, the matched path parameters and the body
    pub fn new(head: &'req Parts, path_params: PathParams, body: Bytes) -> Self {
        Self { head, path_params, body }
    }

    /// Returns the HTTP method of the request
    pub fn method(&self) -> &Method {
        &self.head.method
    }

    /// Returns the URI of the request
    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    /// Returns the raw query string, without the leading `?`
    pub fn query(&self) -> Option<&str> {
        self.head.uri.query()
    }

    /// Returns the HTTP headers of the request
    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// Returns the parsed `content-type` header, if present and well formed
    pub fn content_type(&self) -> Option<Mime> {
        self.head.headers.get(http::header::CONTENT_TYPE)?.to_str().ok()?.parse().ok()
    }

    /// Returns a reference to the path parameters extracted from the request URL
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    /// Returns the raw request body
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Represents path parameters extracted from the URL path of an HTTP request.
///
/// Path parameters are named segments in the URL path that can be extracted and accessed
/// by name. For example, in the path "/users/{id}", "id" is a path parameter.
///
/// Values are percent-decoded. A value that is not UTF-8 once decoded is kept in its raw form and
/// reported by [`PathParams::is_undecodable`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: Vec<(String, String)>,
    undecodable: Vec<String>,
}

impl PathParams {
    pub(crate) fn new(params: Vec<(String, String)>) -> Self {
        Self { params, undecodable: Vec::new() }
    }

    /// Builds the parameters from raw matched segments, percent-decoding each value.
    pub(crate) fn decode<'a>(raw: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut decoded = Self::default();
        for (name, value) in raw {
            match percent_decode_str(value).decode_utf8() {
                Ok(value) => decoded.params.push((name.to_owned(), value.into_owned())),
                Err(_) => {
                    decoded.undecodable.push(name.to_owned());
                    decoded.params.push((name.to_owned(), value.to_owned()));
                }
            }
        }
        decoded
    }

    /// Creates an empty PathParams instance with no parameters
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if there are no path parameters
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns the number of path parameters
    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Gets the value of a path parameter by its name
    /// Returns None if the parameter doesn't exist
    #[inline]
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.params.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
    }

    /// True when the value of `key` is not valid UTF-8 after percent-decoding.
    pub fn is_undecodable(&self, key: impl AsRef<str>) -> bool {
        let key = key.as_ref();
        self.undecodable.iter().any(|name| name == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    #[test]
    fn exposes_head_and_params() {
        let (head, ()) = Request::builder()
            .method(Method::POST)
            .uri("/mixed/123?token=abc")
            .header(http::header::CONTENT_TYPE, "application/json; charset=utf-8")
            .body(())
            .unwrap()
            .into_parts();
        let params = PathParams::new(vec![("user_id".to_owned(), "123".to_owned())]);
        let ctx = RequestContext::new(&head, params, Bytes::from_static(b"{}"));

        assert_eq!(ctx.method(), Method::POST);
        assert_eq!(ctx.query(), Some("token=abc"));
        assert_eq!(ctx.path_params().get("user_id"), Some("123"));
        assert_eq!(ctx.path_params().get("missing"), None);
        assert_eq!(ctx.content_type().map(|m| m.essence_str().to_owned()), Some("application/json".to_owned()));
        assert_eq!(ctx.body().as_ref(), b"{}");
    }

    #[test]
    fn decodes_percent_encoded_values() {
        let params = PathParams::decode([("username", "john%20doe"), ("city", "S%C3%A3o%20Paulo"), ("raw", "%FF")]);
        assert_eq!(params.get("username"), Some("john doe"));
        assert_eq!(params.get("city"), Some("São Paulo"));
        assert!(!params.is_undecodable("username"));
        assert!(params.is_undecodable("raw"));
        assert_eq!(params.get("raw"), Some("%FF"));
    }

    #[test]
    fn empty_params() {
        let params = PathParams::empty();
        assert!(params.is_empty());
        assert_eq!(params.len(), 0);
        assert_eq!(params.iter().count(), 0);
    }
}
