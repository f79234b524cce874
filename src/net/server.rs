//! Core HTTP server implementation.
//!
//! This module implements the low-level HTTP server runtime. It is
//! responsible only for networking concerns:
//! - binding the listener and accepting TCP connections,
//! - bounding how long a client may take to send its request head,
//! - handing the parsed request to the registered [`Handler`],
//! - flushing whatever the handler wrote and closing the socket.
//!
//! Request parsing is delegated to [`RequestParser`]; what goes on the wire
//! in reply is entirely up to the handler.
//!
//! ## Connection lifecycle
//!
//! Every connection moves through [`ConnectionState`]:
//!
//! 1. `Accepted`: the read deadline is armed
//! 2. `Parsing`: the request line and headers are read
//! 3. `Dispatched`: the handler runs with a fresh [`ResponseWriter`]
//! 4. `Closed`: the socket is dropped
//!
//! A parse failure, deadline expiry included, jumps straight to `Closed`.
//! It is logged and, unless
//! [`reply_on_parse_error`](crate::config::ServerConfig::reply_on_parse_error)
//! is set, nothing is written back. Failures never leave their connection.

use async_std::channel;
use async_std::future;
use async_std::io::{BufRead, BufReader};
use async_std::net::{TcpListener, TcpStream};
use async_std::prelude::*;
use async_std::task;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, Instrument, debug, info, info_span, trace, warn};

use crate::config::{ConcurrencyPolicy, ServerConfig};
use crate::handler::responses;
use crate::http::error::ParseError;
use crate::http::parser::RequestParser;
use crate::http::request::HttpRequest;
use crate::http::response::ResponseWriter;
use crate::http::status::HttpStatus;

/// Application callback invoked once per successfully parsed request.
///
/// It runs synchronously on the connection's task and is responsible for
/// writing the complete response through `w`.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, w: &mut ResponseWriter, req: &mut HttpRequest);
}

impl<F> Handler for F
where
    F: Fn(&mut ResponseWriter, &mut HttpRequest) + Send + Sync + 'static,
{
    fn handle(&self, w: &mut ResponseWriter, req: &mut HttpRequest) {
        self(w, req)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Accepted,
    Parsing,
    Dispatched,
    Closed,
}

struct Shared<H> {
    config: ServerConfig,
    handler: H,
}

pub struct Server<H> {
    listener: TcpListener,
    shared: Arc<Shared<H>>,
    log: Dispatch,
}

impl<H: Handler> Server<H> {
    /// Binds the listener on the configured address and port.
    ///
    /// An invalid config or a failed bind are the only errors that stop the
    /// server.
    pub async fn bind(config: ServerConfig, handler: H, log: Dispatch) -> io::Result<Self> {
        config
            .validate()
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        let listener = TcpListener::bind((config.address, config.port)).await?;
        Ok(Self {
            listener,
            shared: Arc::new(Shared { config, handler }),
            log,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until the process exits.
    ///
    /// Accept errors are logged and skipped. With a bounded policy this only
    /// returns if every worker has gone away.
    pub async fn run(self) -> io::Result<()> {
        let log = self.log.clone();
        self.accept_loop().with_subscriber(log).await
    }

    async fn accept_loop(self) -> io::Result<()> {
        info!(
            addr = %self.local_addr()?,
            concurrency = ?self.shared.config.concurrency,
            "server listening"
        );

        match self.shared.config.concurrency {
            ConcurrencyPolicy::Unbounded => loop {
                let Some((stream, peer)) = self.accept().await else {
                    continue;
                };
                let shared = Arc::clone(&self.shared);
                task::spawn(
                    async move { handle_connection(stream, peer, &shared).await }
                        .with_subscriber(self.log.clone()),
                );
            },
            ConcurrencyPolicy::Bounded { workers } => {
                let (tx, rx) = channel::bounded::<(TcpStream, SocketAddr)>(workers);
                for worker in 0..workers {
                    let rx = rx.clone();
                    let shared = Arc::clone(&self.shared);
                    task::spawn(
                        async move {
                            while let Ok((stream, peer)) = rx.recv().await {
                                handle_connection(stream, peer, &shared).await;
                            }
                            debug!(worker, "worker stopped");
                        }
                        .with_subscriber(self.log.clone()),
                    );
                }
                drop(rx);

                loop {
                    let Some(conn) = self.accept().await else {
                        continue;
                    };
                    if tx.send(conn).await.is_err() {
                        return Err(io::Error::other("connection worker pool closed"));
                    }
                }
            }
        }
    }

    async fn accept(&self) -> Option<(TcpStream, SocketAddr)> {
        match self.listener.accept().await {
            Ok(conn) => Some(conn),
            Err(err) => {
                warn!(%err, "error accepting connection");
                None
            }
        }
    }
}

async fn handle_connection<H: Handler>(stream: TcpStream, peer: SocketAddr, shared: &Shared<H>) {
    let span = info_span!("conn", %peer);
    Connection::new(stream).serve(shared).instrument(span).await
}

/// Reads one request head, failing with a `TimedOut` I/O error once
/// `deadline` has passed.
pub async fn read_request<R>(reader: &mut R, deadline: Duration) -> Result<HttpRequest, ParseError>
where
    R: BufRead + Unpin,
{
    match future::timeout(deadline, RequestParser::new(reader).parse()).await {
        Ok(parsed) => parsed,
        Err(_) => Err(ParseError::Io(io::Error::new(
            io::ErrorKind::TimedOut,
            "read deadline exceeded",
        ))),
    }
}

struct Connection {
    stream: TcpStream,
    state: ConnectionState,
}

impl Connection {
    fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            state: ConnectionState::Accepted,
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        trace!(from = ?self.state, to = ?next, "connection state");
        self.state = next;
    }

    async fn serve<H: Handler>(mut self, shared: &Shared<H>) {
        info!("new connection");
        let config = &shared.config;

        self.transition(ConnectionState::Parsing);
        let parsed = {
            let mut reader = BufReader::with_capacity(config.buffer_size, &self.stream);
            read_request(&mut reader, config.read_timeout).await
        };

        let mut req = match parsed {
            Ok(req) => req,
            Err(err) => {
                warn!(%err, "error parsing request");
                if config.reply_on_parse_error {
                    self.reply_with_error(&err).await;
                }
                self.transition(ConnectionState::Closed);
                return;
            }
        };
        debug!(method = %req.method, path = %req.path, version = %req.version, "request parsed");

        self.transition(ConnectionState::Dispatched);
        let mut writer = ResponseWriter::new();
        shared.handler.handle(&mut writer, &mut req);

        let out = writer.into_written();
        if !out.is_empty() {
            let mut stream = &self.stream;
            if let Err(err) = stream.write_all(&out).await {
                warn!(%err, "error writing response");
            }
        }

        self.transition(ConnectionState::Closed);
    }

    async fn reply_with_error(&self, err: &ParseError) {
        let status = if err.is_timeout() {
            HttpStatus::RequestTimeout
        } else {
            HttpStatus::BadRequest
        };
        let res = responses::error_page(status);

        let mut stream = &self.stream;
        if let Err(err) = stream.write_all(&res.serialize()).await {
            warn!(%err, "error writing error response");
        }
    }
}
