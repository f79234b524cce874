use std::io;

use thiserror::Error;

/// Errors raised while reading a request off the wire.
///
/// Every variant is fatal to the connection it came from and to nothing else.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Wrong number of fields on the request line, or an unusable target.
    #[error("malformed request line: {0}")]
    MalformedRequestLine(String),

    /// Header line without a colon, or a name outside the token grammar.
    #[error("malformed header: {0}")]
    MalformedHeaderName(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ParseError {
    /// True when the read deadline fired before the request was complete.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ParseError::Io(err) if err.kind() == io::ErrorKind::TimedOut)
    }
}
