//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::request::Parts;
use http::Method;

/// An incoming HTTP request with its body fully collected and its path
/// parameters resolved by the router.
pub struct Request {
    parts: Parts,
    body: Bytes,
    params: HashMap<String, String>,
    request_id: String,
}

impl Request {
    pub(crate) fn new(
        parts: Parts,
        body: Bytes,
        params: HashMap<String, String>,
        request_id: String,
    ) -> Self {
        Self { parts, body, params, request_id }
    }

    pub fn method(&self) -> &Method { &self.parts.method }
    pub fn path(&self) -> &str { self.parts.uri.path() }
    pub fn body(&self) -> &[u8] { &self.body }

    /// The id the request is logged under (see [`crate::middleware`]).
    pub fn request_id(&self) -> &str { &self.request_id }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

#[cfg(test)]
impl Request {
    /// Builds a request as the router would hand it to a handler.
    pub(crate) fn for_test(method: Method, path: &str, body: &str, params: &[(&str, &str)]) -> Self {
        let (parts, ()) = http::Request::builder()
            .method(method)
            .uri(path)
            .body(())
            .unwrap()
            .into_parts();
        let params = params
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Self::new(parts, Bytes::copy_from_slice(body.as_bytes()), params, "test".to_owned())
    }
}
