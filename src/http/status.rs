/// Statuses the server and its demo handler emit on their own.
///
/// Handlers are free to use any code through
/// [`HttpResponse::set_status`](crate::http::response::HttpResponse::set_status);
/// this enum only carries the canonical reason phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,

    BadRequest = 400,
    MethodNotAllowed = 405,
    RequestTimeout = 408,
}

impl HttpStatus {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn reason(self) -> &'static str {
        match self {
            HttpStatus::Ok => "OK",                               // 200
            HttpStatus::BadRequest => "Bad Request",              // 400
            HttpStatus::MethodNotAllowed => "Method Not Allowed", // 405
            HttpStatus::RequestTimeout => "Request Timeout",      // 408
        }
    }
}
