//! HTTP headers abstraction for [`HttpRequest`](crate::http::request::HttpRequest) and
//! [`HttpResponse`](crate::http::response::HttpResponse)
//!
//! Names are stored lower-cased and every lookup lower-cases its key, so the
//! table is case-insensitive on the way in and on the way out. Setting a name
//! that is already present appends the new value with a `", "` separator, the
//! way HTTP combines repeated list-valued fields. No distinction is made
//! between single-valued and list-valued headers.
//!
//! Headers are stored in an ordered map, so serialization emits them in the
//! order they were first set.
//!
//! The read side lives here too: [`HttpHeaders::parse_block`] consumes a
//! header block from a buffered stream and rejects names outside the HTTP
//! token grammar.

use async_std::io::{BufRead, BufReadExt};
use indexmap::IndexMap;
use std::io;

use crate::http::error::ParseError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    headers: IndexMap<String, String>,
}

impl HttpHeaders {
    pub fn new() -> Self {
        Self {
            headers: IndexMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Inserts `value`, or appends it to the existing value as `old, value`.
    pub fn set(&mut self, name: &str, value: &str) {
        let name = name.to_lowercase();
        match self.headers.get_mut(&name) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => {
                self.headers.insert(name, value.to_string());
            }
        }
    }

    /// Overwrites whatever is stored under `name`, bypassing the merge.
    pub fn replace(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_lowercase(), value.to_string());
    }

    pub fn exists(&self, name: &str) -> bool {
        self.headers.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn stringify(&self) -> String {
        let mut result = String::new();
        for (name, value) in &self.headers {
            result.push_str(&format!("{}: {}\r\n", name, value));
        }
        result
    }

    /// Reads header lines until the blank line that ends the block.
    ///
    /// On success the reader is positioned right after that blank line. A
    /// malformed line aborts the whole block; headers parsed before it stay
    /// in the table but the caller is expected to drop it.
    pub async fn parse_block<R>(&mut self, reader: &mut R) -> Result<(), ParseError>
    where
        R: BufRead + Unpin,
    {
        let mut line = Vec::new();
        loop {
            line.clear();
            read_line(reader, &mut line).await?;

            let trimmed = trim_line_end(&line);
            if trimmed.is_empty() {
                return Ok(());
            }

            let (name, value) = split_header_line(trimmed)?;
            self.set(&name, &value);
        }
    }
}

/// Reads one line, terminator included, into `buf`.
///
/// Hitting EOF before a `\n` is an error: a request can never legitimately
/// end in the middle of its head.
pub(crate) async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> Result<(), ParseError>
where
    R: BufRead + Unpin,
{
    reader.read_until(b'\n', buf).await?;
    if buf.last() != Some(&b'\n') {
        return Err(ParseError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "stream closed before end of line",
        )));
    }
    Ok(())
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && matches!(line[end - 1], b'\r' | b'\n') {
        end -= 1;
    }
    &line[..end]
}

fn split_header_line(line: &[u8]) -> Result<(String, String), ParseError> {
    let malformed = || ParseError::MalformedHeaderName(String::from_utf8_lossy(line).into_owned());

    let colon = line.iter().position(|&b| b == b':').ok_or_else(malformed)?;
    let (name, value) = (&line[..colon], &line[colon + 1..]);

    if name.last().is_some_and(u8::is_ascii_whitespace) {
        return Err(malformed());
    }
    if !is_valid_token(name) {
        return Err(malformed());
    }

    let value = String::from_utf8_lossy(value).trim().to_string();
    // Token bytes are ASCII, so the name converts losslessly.
    let name = String::from_utf8_lossy(name).into_owned();
    Ok((name, value))
}

/// Whether `chars` is a non-empty HTTP token (RFC 9110 `tchar`s only).
pub fn is_valid_token(chars: &[u8]) -> bool {
    !chars.is_empty() && chars.iter().all(|&ch| is_tchar(ch))
}

fn is_tchar(ch: u8) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}
