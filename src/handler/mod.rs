pub mod responses;

use std::io::Write;
use tracing::warn;

use crate::http::request::HttpRequest;
use crate::http::response::ResponseWriter;
use crate::http::status::HttpStatus;
use crate::net::server::Handler;

/// Handler used by the `rustyhttp` binary: greets `GET` and `HEAD`
/// requests and refuses every other method.
pub struct DemoHandler {
    server_name: String,
}

impl DemoHandler {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
        }
    }
}

impl Handler for DemoHandler {
    fn handle(&self, w: &mut ResponseWriter, req: &mut HttpRequest) {
        let mut res = if req.is_method("GET") || req.is_method("HEAD") {
            responses::welcome(&self.server_name)
        } else {
            let mut res = responses::error_page(HttpStatus::MethodNotAllowed);
            res.set_header("Allow", "GET, HEAD");
            res
        };

        if req.is_method("HEAD") {
            // Keep the Content-Length of the GET answer, drop the bytes.
            res.body.clear();
        }

        if let Err(err) = w.write_all(&res.serialize()) {
            warn!(%err, "error writing response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(method: &str) -> String {
        let mut req = HttpRequest {
            method: method.to_string(),
            path: "/".to_string(),
            ..HttpRequest::new()
        };
        let mut w = ResponseWriter::new();
        DemoHandler::new("test-server").handle(&mut w, &mut req);
        String::from_utf8(w.into_written()).unwrap()
    }

    #[test]
    fn greets_get() {
        let out = run("GET");
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(out.contains("server: test-server\r\n"));
        assert!(out.ends_with("<h1>Welcome to test-server!</h1>"));
    }

    #[test]
    fn head_has_no_body() {
        let out = run("HEAD");
        let expected_len = "<h1>Welcome to test-server!</h1>".len();
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(out.contains(&format!("content-length: {expected_len}\r\n")));
        assert!(out.ends_with("\r\n\r\n"));
    }

    #[test]
    fn refuses_other_methods() {
        let out = run("DELETE");
        assert!(out.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
        assert!(out.contains("allow: GET, HEAD\r\n"));
    }
}
