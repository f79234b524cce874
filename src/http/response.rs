use std::io;

use crate::http::headers::HttpHeaders;
use crate::http::status::HttpStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub code: u16,
    pub text: String,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::with_status(HttpStatus::Ok)
    }
}

impl HttpResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(status: HttpStatus) -> Self {
        Self {
            code: status.code(),
            text: status.reason().to_string(),
            headers: HttpHeaders::new(),
            body: Vec::new(),
        }
    }

    pub fn set_status(&mut self, code: u16, text: &str) {
        self.code = code;
        self.text = text.to_string();
    }

    /// Sets a header with merge semantics. `Content-Length` written here is
    /// not checked against the body.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.set(name, value);
    }

    /// Stores the body and rewrites `Content-Length` to match it.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
        self.headers
            .replace("Content-Length", &self.body.len().to_string());
    }

    pub fn build_head(&self) -> String {
        // HTTP/1.1 <code> <text>\r\n
        // <header_name>: <header_value>\r\n
        // ...
        // \r\n
        format!(
            "HTTP/1.1 {} {}\r\n{}\r\n",
            self.code,
            self.text,
            self.headers.stringify(),
        )
    }

    /// Head followed by the raw body, with no framing beyond `Content-Length`.
    pub fn serialize(&self) -> Vec<u8> {
        let head = self.build_head();
        let mut out = Vec::with_capacity(head.len() + self.body.len());
        out.extend_from_slice(head.as_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

/// What a [`Handler`](crate::net::server::Handler) writes its answer through.
///
/// It owns a fresh [`HttpResponse`] for the handler to fill in and a buffer of
/// outbound bytes. Only bytes written to it reach the client: the server never
/// serializes the response on the handler's behalf.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    response: HttpResponse,
    out: Vec<u8>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&mut self) -> &mut HttpHeaders {
        &mut self.response.headers
    }

    pub fn response(&mut self) -> &mut HttpResponse {
        &mut self.response
    }

    /// Serializes the owned response and writes it out.
    pub fn send(&mut self) -> io::Result<usize> {
        let bytes = self.response.serialize();
        self.out.extend_from_slice(&bytes);
        Ok(bytes.len())
    }

    pub fn written(&self) -> &[u8] {
        &self.out
    }

    pub fn into_written(self) -> Vec<u8> {
        self.out
    }
}

impl io::Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
