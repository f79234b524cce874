use std::time::SystemTime;

use crate::http::response::HttpResponse;
use crate::http::status::HttpStatus;

pub fn welcome(server_name: &str) -> HttpResponse {
    let mut res = HttpResponse::with_status(HttpStatus::Ok);
    let body = format!("<h1>Welcome to {}!</h1>", server_name);

    res.set_header("Content-Type", "text/html; charset=utf-8");
    res.set_header("Cache-Control", "no-cache, no-store, must-revalidate");
    res.set_header("Server", server_name);
    res.set_header("Connection", "close");
    res.set_header("Date", &httpdate::fmt_http_date(SystemTime::now()));

    res.set_body(body);
    res
}

/// Small HTML page for any error status.
pub fn error_page(status: HttpStatus) -> HttpResponse {
    let mut res = HttpResponse::with_status(status);
    let body = format!("<h1>{} {}</h1>", status.code(), status.reason());

    res.set_header("Content-Type", "text/html; charset=utf-8");
    res.set_header("Connection", "close");

    res.set_body(body);
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_page_headers() {
        let res = welcome("rustyhttp/0.1");

        assert_eq!(res.code, 200);
        assert_eq!(res.headers.get("server"), Some("rustyhttp/0.1"));
        assert_eq!(res.headers.get("connection"), Some("close"));
        assert_eq!(
            res.headers.get("content-length"),
            Some(res.body.len().to_string().as_str())
        );

        let date = res.headers.get("date").unwrap();
        assert!(httpdate::parse_http_date(date).is_ok());
    }

    #[test]
    fn error_page_uses_status_line() {
        let res = error_page(HttpStatus::BadRequest);

        assert_eq!(res.code, 400);
        assert_eq!(res.text, "Bad Request");
        assert_eq!(res.body, b"<h1>400 Bad Request</h1>".to_vec());
        assert_eq!(res.headers.get("content-length"), Some("24"));
    }
}
