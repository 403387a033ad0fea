//! End-to-end tests over TCP

use nanoserve::files::{FileServer, FileServerConfig};
use nanoserve::http::connection::SessionConfig;
use nanoserve::http::handler::{FnHandler, Handler};
use nanoserve::http::request::Request;
use nanoserve::http::response::{Response, StatusCode};
use nanoserve::server::{BindError, DefaultSocketFactory, RunningServer, Server, SocketFactory};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

struct Reply {
    head: String,
    body: Vec<u8>,
}

impl Reply {
    fn status_line(&self) -> &str {
        self.head.lines().next().unwrap_or("")
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }
}

async fn start<H: Handler>(handler: H, max_upload_size: usize) -> RunningServer {
    Server::new(handler)
        .host(Some("127.0.0.1".to_string()))
        .port(0)
        .session_config(SessionConfig { max_upload_size })
        .start()
        .await
        .unwrap()
}

async fn start_files(root: &Path) -> RunningServer {
    let handler = FileServer::new(FileServerConfig {
        root: root.to_path_buf(),
        listing: true,
    });
    start(handler, 1024).await
}

async fn send(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut out = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut out))
        .await
        .expect("server did not close the connection")
        .unwrap();
    out
}

async fn request(addr: SocketAddr, raw: &[u8]) -> Reply {
    let out = send(addr, raw).await;
    let split = out
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("no header terminator in reply");
    Reply {
        head: String::from_utf8_lossy(&out[..split]).into_owned(),
        body: out[split + 4..].to_vec(),
    }
}

fn echo_params() -> FnHandler<impl Fn(&Request) -> Option<Response> + Send + Sync> {
    FnHandler(|req: &Request| {
        let pairs: Vec<String> = req.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        Some(Response::plain(StatusCode::Ok, pairs.join(";")))
    })
}

fn echo_upload() -> FnHandler<impl Fn(&Request) -> Option<Response> + Send + Sync> {
    FnHandler(|req: &Request| {
        let upload = req.upload.clone().unwrap_or_default();
        Some(Response::ok("application/octet-stream", upload.to_vec()))
    })
}

#[tokio::test]
async fn test_get_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("foo.txt"), "hello world").unwrap();
    let server = start_files(dir.path()).await;

    let reply = request(server.local_addr(), b"GET /foo.txt HTTP/1.0\r\n\r\n").await;

    assert_eq!(reply.status_line(), "HTTP/1.0 200 OK");
    assert_eq!(reply.header("Content-Type"), Some("text/plain"));
    assert_eq!(reply.header("Content-length"), Some("11"));
    assert!(reply.header("Date").unwrap().ends_with(" GMT"));
    assert_eq!(reply.body, b"hello world");
    server.abort();
}

#[tokio::test]
async fn test_get_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_files(dir.path()).await;

    let reply = request(server.local_addr(), b"GET /missing.txt HTTP/1.0\r\n\r\n").await;

    assert_eq!(reply.status_line(), "HTTP/1.0 404 Not Found");
    server.abort();
}

#[tokio::test]
async fn test_directory_redirect_then_listing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("docs").join("a.txt"), "a").unwrap();
    let server = start_files(dir.path()).await;

    let reply = request(server.local_addr(), b"GET /docs HTTP/1.0\r\n\r\n").await;
    assert_eq!(reply.status_line(), "HTTP/1.0 301 Moved Permanently");
    assert_eq!(reply.header("Location"), Some("/docs/"));

    let reply = request(server.local_addr(), b"GET /docs/ HTTP/1.0\r\n\r\n").await;
    assert_eq!(reply.status_line(), "HTTP/1.0 200 OK");
    assert_eq!(reply.header("Content-Type"), Some("text/html"));
    assert!(String::from_utf8_lossy(&reply.body).contains("<a href=\"/docs/a.txt\">a.txt</a>"));
    server.abort();
}

#[tokio::test]
async fn test_post_form_parameters() {
    let server = start(echo_params(), 1024).await;

    let reply = request(
        server.local_addr(),
        b"POST /anything HTTP/1.0\r\nContent-Length: 17\r\n\r\na=1&b=two%20words",
    )
    .await;

    assert_eq!(reply.status_line(), "HTTP/1.0 200 OK");
    assert_eq!(reply.body, b"a=1;b=two words");
    server.abort();
}

#[tokio::test]
async fn test_query_parameters_on_get() {
    let server = start(echo_params(), 1024).await;

    let reply = request(server.local_addr(), b"GET /find?q=rust+lang HTTP/1.0\r\n\r\n").await;

    assert_eq!(reply.body, b"q=rust lang");
    server.abort();
}

#[tokio::test]
async fn test_oversized_upload_is_rejected_without_reading_body() {
    let server = start(echo_upload(), 10).await;

    // The body is never sent; the server must answer from the headers alone.
    let reply = request(
        server.local_addr(),
        b"POST /up HTTP/1.0\r\nContent-Length: 11\r\n\r\n",
    )
    .await;

    assert_eq!(reply.status_line(), "HTTP/1.0 501 Not Implemented");
    server.abort();
}

#[tokio::test]
async fn test_oversized_upload_with_body_sent_is_rejected() {
    let server = start(echo_upload(), 10).await;

    let reply = request(
        server.local_addr(),
        b"POST /up HTTP/1.0\r\nContent-Length: 11\r\n\r\nhello world",
    )
    .await;

    assert_eq!(reply.status_line(), "HTTP/1.0 501 Not Implemented");
    assert!(String::from_utf8_lossy(&reply.body).starts_with("NOT IMPLEMENTED"));
    server.abort();
}

#[tokio::test]
async fn test_upload_bytes_match_exactly() {
    let server = start(echo_upload(), 4096).await;
    let payload: Vec<u8> = (0..3000u32).map(|i| (i * 7 % 256) as u8).collect();

    let mut raw = format!("POST /up HTTP/1.0\r\nContent-Length: {}\r\n\r\n", payload.len()).into_bytes();
    raw.extend_from_slice(&payload);
    let reply = request(server.local_addr(), &raw).await;

    assert_eq!(reply.status_line(), "HTTP/1.0 200 OK");
    assert_eq!(reply.body, payload);
    server.abort();
}

#[tokio::test]
async fn test_upload_at_limit_is_accepted() {
    let server = start(echo_upload(), 10).await;

    let reply = request(
        server.local_addr(),
        b"POST /up HTTP/1.0\r\nContent-Length: 10\r\n\r\n0123456789",
    )
    .await;

    assert_eq!(reply.body, b"0123456789");
    server.abort();
}

#[tokio::test]
async fn test_range_request() {
    let dir = tempfile::tempdir().unwrap();
    let content: Vec<u8> = (0..100u8).collect();
    std::fs::write(dir.path().join("foo.txt"), &content).unwrap();
    let server = start_files(dir.path()).await;

    let reply = request(
        server.local_addr(),
        b"GET /foo.txt HTTP/1.0\r\nRange: bytes=50-\r\n\r\n",
    )
    .await;

    assert_eq!(reply.status_line(), "HTTP/1.0 200 OK");
    assert_eq!(reply.header("Content-length"), Some("50"));
    assert_eq!(reply.header("Content-range"), Some("50-99/100"));
    assert_eq!(reply.body, content[50..]);
    server.abort();
}

#[tokio::test]
async fn test_truncated_upload_gets_no_response() {
    let server = start(echo_upload(), 1024).await;

    let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
    stream
        .write_all(b"POST /up HTTP/1.0\r\nContent-Length: 10\r\n\r\nabc")
        .await
        .unwrap();
    stream.shutdown().await.unwrap();

    let mut out = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut out))
        .await
        .unwrap()
        .unwrap();
    assert!(out.is_empty());
    server.abort();
}

#[tokio::test]
async fn test_listener_survives_bad_sessions() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ok.txt"), "ok").unwrap();
    let server = start_files(dir.path()).await;
    let addr = server.local_addr();

    drop(TcpStream::connect(addr).await.unwrap());
    let reply = request(addr, b"\r\n").await;
    assert_eq!(reply.status_line(), "HTTP/1.0 400 Bad Request");

    let reply = request(addr, b"GET /ok.txt HTTP/1.0\r\n\r\n").await;
    assert_eq!(reply.status_line(), "HTTP/1.0 200 OK");
    assert_eq!(reply.body, b"ok");
    server.abort();
}

#[tokio::test]
async fn test_concurrent_sessions() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ok.txt"), "ok").unwrap();
    let server = start_files(dir.path()).await;
    let addr = server.local_addr();

    // A silent client holds its session open without blocking others.
    let _idle = TcpStream::connect(addr).await.unwrap();

    let requests = (0..8).map(|_| request(addr, b"GET /ok.txt HTTP/1.0\r\n\r\n"));
    for reply in join_all(requests).await {
        assert_eq!(reply.body, b"ok");
    }
    server.abort();
}

async fn join_all<F: std::future::Future<Output = Reply> + Send + 'static>(
    futures: impl Iterator<Item = F>,
) -> Vec<Reply> {
    let handles: Vec<_> = futures.map(tokio::spawn).collect();
    let mut replies = Vec::new();
    for handle in handles {
        replies.push(handle.await.unwrap());
    }
    replies
}

#[tokio::test]
async fn test_bind_error_when_port_taken() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    let result = Server::new(echo_params())
        .host(Some("127.0.0.1".to_string()))
        .port(port)
        .start()
        .await;

    assert!(matches!(result, Err(BindError::Bind { .. })));
}

struct CountingFactory(Arc<AtomicUsize>);

impl SocketFactory for CountingFactory {
    fn bind(&self, addr: SocketAddr) -> std::io::Result<TcpListener> {
        self.0.fetch_add(1, Ordering::SeqCst);
        DefaultSocketFactory.bind(addr)
    }
}

#[tokio::test]
async fn test_custom_socket_factory_is_used() {
    let calls = Arc::new(AtomicUsize::new(0));
    let server = Server::new(echo_params())
        .host(Some("127.0.0.1".to_string()))
        .port(0)
        .socket_factory(CountingFactory(calls.clone()))
        .start()
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let reply = request(server.local_addr(), b"GET /?x=1 HTTP/1.0\r\n\r\n").await;
    assert_eq!(reply.body, b"x=1");
    server.abort();
}
