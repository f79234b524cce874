//! A minimal HTTP/1.1 server.
//!
//! One request head is parsed per connection, handed to a single
//! [`Handler`](net::server::Handler), and the connection is closed once the
//! handler returns. Request bodies are never read.

pub mod config;
pub mod handler;
pub mod http;
pub mod logging;
pub mod net;
