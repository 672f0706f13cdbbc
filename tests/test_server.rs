use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;

use hermod::http::request::Request;
use hermod::http::response::{StatusCode, default_headers};
use hermod::http::writer::ResponseWriter;
use hermod::server::{self, HandlerError, Server};

/// Echoes the method, target, and body back in the response.
async fn echo_handler(req: Request, mut writer: ResponseWriter<OwnedWriteHalf>) {
    let body = format!(
        "{} {} body={}",
        req.method,
        req.target,
        String::from_utf8_lossy(&req.body)
    );

    writer.write_status_line(StatusCode::OK).await.unwrap();
    writer
        .write_headers(&default_headers(body.len()))
        .await
        .unwrap();
    writer.write_body(body.as_bytes()).await.unwrap();
}

async fn start_echo_server() -> Server {
    server::serve("127.0.0.1:0", echo_handler).await.unwrap()
}

async fn read_response(stream: &mut TcpStream) -> String {
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_serve_one_request() {
    let server = start_echo_server().await;
    let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();

    stream
        .write_all(b"GET /hello HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();

    let response = read_response(&mut stream).await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.ends_with("GET /hello body="));

    server.close();
}

#[tokio::test]
async fn test_malformed_request_gets_400() {
    let server = start_echo_server().await;
    let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();

    stream.write_all(b"NOT AN HTTP REQUEST\r\n\r\n").await.unwrap();

    let response = read_response(&mut stream).await;
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));

    server.close();
}

#[tokio::test]
async fn test_connection_closes_after_one_response() {
    let server = start_echo_server().await;
    let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();

    stream
        .write_all(b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n")
        .await
        .unwrap();

    // read_to_end returning means the server closed the connection; only the
    // first request was answered.
    let response = read_response(&mut stream).await;
    assert_eq!(response.matches("HTTP/1.1 200").count(), 1);
    assert!(response.contains("GET /a"));

    server.close();
}

#[tokio::test]
async fn test_concurrent_connections_are_isolated() {
    let server = start_echo_server().await;
    let addr = server.local_addr();

    // The slow connection dribbles its request out with long pauses.
    let slow = tokio::spawn(async move {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let start = tokio::time::Instant::now();

        stream.write_all(b"GET /sl").await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        stream.write_all(b"ow HTTP/1.1\r\nHo").await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        stream.write_all(b"st: a\r\n\r\n").await.unwrap();

        let response = read_response(&mut stream).await;
        (response, start.elapsed())
    });

    // The fast connection completes while the slow one is still writing.
    let fast = tokio::spawn(async move {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let start = tokio::time::Instant::now();

        stream
            .write_all(b"GET /fast HTTP/1.1\r\nHost: b\r\n\r\n")
            .await
            .unwrap();

        let response = read_response(&mut stream).await;
        (response, start.elapsed())
    });

    let (slow_response, slow_elapsed) = slow.await.unwrap();
    let (fast_response, fast_elapsed) = fast.await.unwrap();

    assert!(slow_response.contains("GET /slow"));
    assert!(!slow_response.contains("/fast"));
    assert!(fast_response.contains("GET /fast"));
    assert!(!fast_response.contains("/slow"));
    assert!(
        fast_elapsed < slow_elapsed,
        "fast connection was held up by the slow one"
    );

    server.close();
}

#[tokio::test]
async fn test_request_body_reaches_handler() {
    let server = start_echo_server().await;
    let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();

    stream
        .write_all(b"POST /api HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello")
        .await
        .unwrap();

    let response = read_response(&mut stream).await;
    assert!(response.ends_with("POST /api body=hello"));

    server.close();
}

#[tokio::test]
async fn test_close_stops_accepting() {
    let server = start_echo_server().await;
    let addr = server.local_addr();

    server.close();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(TcpStream::connect(addr).await.is_err());
}

fn buffered_handler(req: &Request, body: &mut Vec<u8>) -> Result<(), HandlerError> {
    match req.target.as_str() {
        "/yourproblem" => Err(HandlerError {
            status: StatusCode::BAD_REQUEST,
            message: "Your problem is not my problem\n".to_string(),
        }),
        "/myproblem" => Err(HandlerError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Woopsie, my bad\n".to_string(),
        }),
        _ => {
            body.extend_from_slice(b"All good, frfr\n");
            Ok(())
        }
    }
}

#[tokio::test]
async fn test_buffered_handler_success_commits_200() {
    let server = server::serve_buffered("127.0.0.1:0", buffered_handler)
        .await
        .unwrap();
    let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();

    stream.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();

    let response = read_response(&mut stream).await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.ends_with("All good, frfr\n"));

    server.close();
}

#[tokio::test]
async fn test_buffered_handler_error_commits_its_status() {
    let server = server::serve_buffered("127.0.0.1:0", buffered_handler)
        .await
        .unwrap();

    let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
    stream
        .write_all(b"GET /yourproblem HTTP/1.1\r\n\r\n")
        .await
        .unwrap();
    let response = read_response(&mut stream).await;
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(response.ends_with("Your problem is not my problem\n"));

    let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
    stream
        .write_all(b"GET /myproblem HTTP/1.1\r\n\r\n")
        .await
        .unwrap();
    let response = read_response(&mut stream).await;
    assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));

    server.close();
}
