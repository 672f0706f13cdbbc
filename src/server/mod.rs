//! Connection dispatcher: accept loop, per-connection tasks, shutdown.
//!
//! Each accepted connection gets its own task; the accept loop never waits on
//! a connection's progress. A connection serves exactly one request and is
//! closed when its routine returns — no keep-alive. Nothing that goes wrong
//! on one connection can reach another connection or stop the accept loop.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::http::parser;
use crate::http::request::Request;
use crate::http::response::{StatusCode, default_headers};
use crate::http::writer::{ResponseWriter, WriteError};

/// A structured failure a buffered handler can return instead of driving the
/// writer itself; the dispatcher turns it into a response with this status.
#[derive(Debug, Clone)]
pub struct HandlerError {
    pub status: StatusCode,
    pub message: String,
}

/// Handle to a running server. Dropping it does not stop the accept loop;
/// call [`Server::close`] for that.
pub struct Server {
    local_addr: SocketAddr,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl Server {
    /// The address the listener actually bound (useful when binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Marks the server as intentionally shutting down and stops the accept
    /// loop. In-flight connections run to completion on their own tasks.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.shutdown.notify_one();
    }
}

/// Binds `addr` and starts accepting connections. For each parsed request the
/// handler receives the request and a writer over the connection, and is
/// responsible for driving the writer through a complete response sequence.
pub async fn serve<H, Fut>(addr: &str, handler: H) -> Result<Server>
where
    H: Fn(Request, ResponseWriter<OwnedWriteHalf>) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    let closed = Arc::new(AtomicBool::new(false));
    let shutdown = Arc::new(Notify::new());

    info!("listening on {}", local_addr);

    tokio::spawn(accept_loop(
        listener,
        handler,
        Arc::clone(&closed),
        Arc::clone(&shutdown),
    ));

    Ok(Server {
        local_addr,
        closed,
        shutdown,
    })
}

/// Like [`serve`], but with the buffered handler contract: the handler writes
/// its body into a buffer and returns either success or a [`HandlerError`].
/// The dispatcher commits a 200 with the buffered body, or an error response
/// with the handler's status, only after the handler has finished — for
/// handlers that cannot know their final status until the work is done.
pub async fn serve_buffered<H>(addr: &str, handler: H) -> Result<Server>
where
    H: Fn(&Request, &mut Vec<u8>) -> Result<(), HandlerError> + Clone + Send + 'static,
{
    serve(addr, move |req, writer| {
        let handler = handler.clone();
        async move {
            let mut body = Vec::new();
            let result = match handler(&req, &mut body) {
                Ok(()) => commit_response(writer, StatusCode::OK, &body).await,
                Err(e) => commit_response(writer, e.status, e.message.as_bytes()).await,
            };
            if let Err(e) = result {
                warn!("failed to write response: {}", e);
            }
        }
    })
    .await
}

async fn accept_loop<H, Fut>(
    listener: TcpListener,
    handler: H,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) where
    H: Fn(Request, ResponseWriter<OwnedWriteHalf>) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    loop {
        tokio::select! {
            result = listener.accept() => match result {
                Ok((stream, peer)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, handler).await {
                            warn!("connection from {} failed: {:#}", peer, e);
                        }
                    });
                }
                Err(e) => {
                    if closed.load(Ordering::SeqCst) {
                        info!("listener closed, server shutting down");
                        return;
                    }
                    error!("error accepting connection: {}", e);
                }
            },
            _ = shutdown.notified() => {
                info!("listener closed, server shutting down");
                return;
            }
        }
    }
}

/// Serves one request on one connection. The connection is closed when this
/// returns, whatever the handler did with the writer.
async fn handle_connection<H, Fut>(stream: TcpStream, handler: H) -> Result<()>
where
    H: Fn(Request, ResponseWriter<OwnedWriteHalf>) -> Fut,
    Fut: Future<Output = ()>,
{
    let (mut read_half, write_half) = stream.into_split();

    let request = match parser::parse_from(&mut read_half).await {
        Ok(request) => request,
        Err(e) => {
            warn!("failed to parse request: {}", e);
            let writer = ResponseWriter::new(write_half);
            commit_response(writer, StatusCode::BAD_REQUEST, b"Bad Request\n").await?;
            return Ok(());
        }
    };

    let writer = ResponseWriter::new(write_half);
    handler(request, writer).await;

    Ok(())
}

/// Writes a complete fixed-length response in one go.
async fn commit_response(
    mut writer: ResponseWriter<OwnedWriteHalf>,
    status: StatusCode,
    body: &[u8],
) -> Result<(), WriteError> {
    writer.write_status_line(status).await?;
    writer.write_headers(&default_headers(body.len())).await?;
    writer.write_body(body).await?;
    Ok(())
}
