//! Request head parser.
//!
//! Reads a request line and the header block that follows it from any
//! buffered async stream. The body, if any, is left unread on the stream.

use async_std::io::BufRead;
use std::collections::HashMap;
use url::{Url, form_urlencoded};

use crate::http::error::ParseError;
use crate::http::headers::read_line;
use crate::http::request::HttpRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestParserState {
    RequestLine,
    Headers,
    Done,
}

pub struct RequestParser<'a, R> {
    reader: &'a mut R,
    state: RequestParserState,
    req: HttpRequest,
}

impl<'a, R> RequestParser<'a, R>
where
    R: BufRead + Unpin,
{
    pub fn new(reader: &'a mut R) -> Self {
        Self {
            reader,
            state: RequestParserState::RequestLine,
            req: HttpRequest::new(),
        }
    }

    /// Consumes the request line and the header block.
    ///
    /// On success the stream is positioned at the first byte after the
    /// blank line that ends the head.
    pub async fn parse(mut self) -> Result<HttpRequest, ParseError> {
        loop {
            match self.state {
                RequestParserState::RequestLine => {
                    self.parse_request_line().await?;
                    self.state = RequestParserState::Headers;
                }
                RequestParserState::Headers => {
                    self.req.headers.parse_block(&mut *self.reader).await?;
                    self.state = RequestParserState::Done;
                }
                RequestParserState::Done => return Ok(self.req),
            }
        }
    }

    // Request line: METHOD TARGET VERSION
    async fn parse_request_line(&mut self) -> Result<(), ParseError> {
        let mut raw = Vec::new();
        read_line(&mut *self.reader, &mut raw).await?;

        let line = String::from_utf8_lossy(&raw);
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [method, target, version] = fields.as_slice() else {
            return Err(ParseError::MalformedRequestLine(format!(
                "expected 3 fields, got {}",
                fields.len()
            )));
        };

        let (path, query_params) = parse_target(target)?;

        self.req.method = method.to_uppercase();
        self.req.target = target.to_string();
        self.req.path = path;
        self.req.query_params = query_params;
        self.req.version = version.to_string();
        Ok(())
    }
}

/// Splits a request target into its decoded path and query parameters.
///
/// Only absolute-form targets go through `url`; origin-form, `*` and other
/// relative targets keep their path exactly as written, dot segments
/// included. Repeated query keys keep the last value.
fn parse_target(target: &str) -> Result<(String, HashMap<String, String>), ParseError> {
    let malformed = |reason: &str| {
        ParseError::MalformedRequestLine(format!("failed to parse url {target}: {reason}"))
    };

    if target.chars().any(|c| c.is_ascii_control()) {
        return Err(malformed("invalid control character"));
    }

    let (raw_path, raw_query) = split_path_query(target);
    if has_invalid_escape(raw_path) {
        return Err(malformed("invalid percent escape"));
    }

    let absolute;
    let (raw_path, raw_query) = match Url::parse(target) {
        Ok(url) => {
            absolute = url;
            // Opaque targets such as `host:port` have no path.
            let path = if absolute.cannot_be_a_base() {
                ""
            } else {
                absolute.path()
            };
            (path, absolute.query())
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => (raw_path, raw_query),
        Err(e) => return Err(malformed(&e.to_string())),
    };

    let decoded = urlencoding::decode_binary(raw_path.as_bytes());
    let path = String::from_utf8_lossy(&decoded).into_owned();

    let query_params = form_urlencoded::parse(raw_query.unwrap_or_default().as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    Ok((path, query_params))
}

fn split_path_query(target: &str) -> (&str, Option<&str>) {
    let target = target.split('#').next().unwrap_or_default();
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

fn has_invalid_escape(s: &str) -> bool {
    s.split('%').skip(1).any(|chunk| {
        let b = chunk.as_bytes();
        b.len() < 2 || !b[0].is_ascii_hexdigit() || !b[1].is_ascii_hexdigit()
    })
}
