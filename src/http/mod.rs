pub mod error;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod status;

pub use error::ParseError;
pub use headers::HttpHeaders;
pub use parser::RequestParser;
pub use request::HttpRequest;
pub use response::{HttpResponse, ResponseWriter};
pub use status::HttpStatus;
