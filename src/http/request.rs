use std::collections::HashMap;

use crate::http::headers::HttpHeaders;

/// A parsed request head.
///
/// Built once per connection by [`RequestParser`](crate::http::parser::RequestParser).
/// The body is never read off the wire, so `body` stays empty even when the
/// client announces a `Content-Length`.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    /// Upper-cased method token, e.g. `GET`.
    pub method: String,
    /// Target exactly as it appeared on the request line.
    pub target: String,
    /// Percent-decoded path component of the target.
    pub path: String,
    pub query_params: HashMap<String, String>,
    /// Protocol version, verbatim.
    pub version: String,

    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Adds a header using the table's merge semantics.
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.set(name, value);
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.exists(name)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    pub fn has_query_param(&self, name: &str) -> bool {
        self.query_params.contains_key(name)
    }

    pub fn is_method(&self, method: &str) -> bool {
        self.method.eq_ignore_ascii_case(method)
    }

    /// Announced body length; 0 when the header is missing or not a number.
    pub fn content_length(&self) -> usize {
        self.header("content-length")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0)
    }
}
