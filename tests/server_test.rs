//! End-to-end tests: a real `Server` on an ephemeral loopback port, driven
//! over plain TCP.

use async_std::io;
use async_std::net::{SocketAddr, TcpStream};
use async_std::prelude::*;
use async_std::task;
use std::io::Write as _;
use std::time::{Duration, Instant};
use tracing::Dispatch;

use rustyhttp::config::{ConcurrencyPolicy, ServerConfig};
use rustyhttp::http::{HttpRequest, ResponseWriter};
use rustyhttp::net::server::{Handler, Server};

fn test_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        ..ServerConfig::default()
    }
}

async fn start<H: Handler>(config: ServerConfig, handler: H) -> SocketAddr {
    let server = Server::bind(config, handler, Dispatch::none())
        .await
        .expect("bind test server");
    let addr = server.local_addr().expect("local addr");
    task::spawn(server.run());
    addr
}

/// Sends `raw` and reads until the server closes the connection.
async fn exchange(addr: SocketAddr, raw: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream.write_all(raw).await.expect("send request");

    let mut out = Vec::new();
    io::timeout(Duration::from_secs(5), stream.read_to_end(&mut out))
        .await
        .expect("server closes the connection");
    String::from_utf8(out).expect("utf-8 response")
}

fn echo(w: &mut ResponseWriter, req: &mut HttpRequest) {
    let body = format!(
        "{} {} image={} ua={}",
        req.method,
        req.path,
        req.query_param("image").unwrap_or("-"),
        req.header("user-agent").unwrap_or("-"),
    );
    w.header().set("Content-Type", "text/plain");
    w.response().set_body(body);
    w.send().expect("buffered write");
}

#[async_std::test]
async fn parses_and_dispatches_request() {
    let addr = start(test_config(), echo).await;

    let out = exchange(
        addr,
        b"post /order/123?image=69 HTTP/1.1\r\nHost: localhost:8080\r\n\
          User-Agent: X\r\nAccept: */*\r\n\r\n",
    )
    .await;

    assert!(out.starts_with("HTTP/1.1 200 OK\r\n"), "got {out:?}");
    assert!(out.contains("content-type: text/plain\r\n"));
    assert!(out.contains("content-length: 29\r\n"));
    assert!(out.ends_with("\r\n\r\nPOST /order/123 image=69 ua=X"));
}

#[async_std::test]
async fn malformed_request_line_closes_silently() {
    let addr = start(test_config(), echo).await;

    let out = exchange(addr, b"GET /\r\n\r\n").await;

    assert!(out.is_empty(), "expected no response, got {out:?}");
}

#[async_std::test]
async fn malformed_header_closes_silently() {
    let addr = start(test_config(), echo).await;

    let out = exchange(addr, b"GET / HTTP/1.1\r\nBad Name: v\r\n\r\n").await;

    assert!(out.is_empty(), "expected no response, got {out:?}");
}

#[async_std::test]
async fn parse_errors_can_be_answered() {
    let config = ServerConfig {
        reply_on_parse_error: true,
        ..test_config()
    };
    let addr = start(config, echo).await;

    let out = exchange(addr, b"GET / HTTP/1.1 extra\r\n\r\n").await;

    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"), "got {out:?}");
    assert!(out.ends_with("<h1>400 Bad Request</h1>"));
}

#[async_std::test]
async fn handler_that_writes_nothing_sends_nothing() {
    let addr = start(test_config(), |w: &mut ResponseWriter, _req: &mut HttpRequest| {
        w.response().set_body("never sent");
    })
    .await;

    let out = exchange(addr, b"GET / HTTP/1.1\r\n\r\n").await;

    assert!(out.is_empty(), "got {out:?}");
}

#[async_std::test]
async fn handler_can_write_raw_bytes() {
    let addr = start(test_config(), |w: &mut ResponseWriter, req: &mut HttpRequest| {
        req.add_header("X-Seen", "yes");
        let seen = req.header("x-seen").unwrap_or("no").to_string();
        write!(w, "HTTP/1.1 204 No Content\r\nx-seen: {seen}\r\n\r\n").expect("buffered write");
    })
    .await;

    let out = exchange(addr, b"DELETE /item HTTP/1.1\r\n\r\n").await;

    assert_eq!(out, "HTTP/1.1 204 No Content\r\nx-seen: yes\r\n\r\n");
}

#[async_std::test]
async fn idle_client_is_dropped_after_read_deadline() {
    let config = ServerConfig {
        read_timeout: Duration::from_millis(200),
        ..test_config()
    };
    let addr = start(config, echo).await;

    let started = Instant::now();
    let out = exchange(addr, b"GET / HTTP/1.1\r\nHost: slow").await;

    assert!(out.is_empty(), "got {out:?}");
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[async_std::test]
async fn read_deadline_can_be_answered_with_408() {
    let config = ServerConfig {
        read_timeout: Duration::from_millis(100),
        reply_on_parse_error: true,
        ..test_config()
    };
    let addr = start(config, echo).await;

    let out = exchange(addr, b"GET / HTTP/1.1\r\n").await;

    assert!(out.starts_with("HTTP/1.1 408 Request Timeout\r\n"), "got {out:?}");
}

#[async_std::test]
async fn stalled_connection_does_not_block_others() {
    let addr = start(test_config(), echo).await;

    // Holds its connection open without finishing the head.
    let mut idle = TcpStream::connect(addr).await.unwrap();
    idle.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();

    let out = exchange(addr, b"GET /fast HTTP/1.1\r\n\r\n").await;
    assert!(out.ends_with("GET /fast image=- ua=-"), "got {out:?}");
}

#[async_std::test]
async fn bounded_pool_serves_every_connection() {
    let config = ServerConfig {
        concurrency: ConcurrencyPolicy::Bounded { workers: 2 },
        ..test_config()
    };
    let addr = start(config, echo).await;

    let clients: Vec<_> = (0..6)
        .map(|i| {
            task::spawn(async move {
                let raw = format!("GET /client/{i} HTTP/1.1\r\n\r\n");
                exchange(addr, raw.as_bytes()).await
            })
        })
        .collect();

    for (i, client) in clients.into_iter().enumerate() {
        let out = client.await;
        assert!(out.ends_with(&format!("GET /client/{i} image=- ua=-")), "got {out:?}");
    }
}

#[async_std::test]
async fn bind_failure_is_reported() {
    let taken = Server::bind(test_config(), echo, Dispatch::none())
        .await
        .unwrap();
    let port = taken.local_addr().unwrap().port();

    let config = ServerConfig {
        port,
        ..ServerConfig::default()
    };
    assert!(Server::bind(config, echo, Dispatch::none()).await.is_err());
}

#[async_std::test]
async fn bind_rejects_empty_worker_pool() {
    let config = ServerConfig {
        concurrency: ConcurrencyPolicy::Bounded { workers: 0 },
        ..test_config()
    };
    let err = Server::bind(config, echo, Dispatch::none())
        .await
        .err()
        .expect("zero workers is rejected");
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
}
