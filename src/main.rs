use tokio::net::tcp::OwnedWriteHalf;

use hermod::config::Config;
use hermod::http::headers::Headers;
use hermod::http::request::Request;
use hermod::http::response::{StatusCode, default_headers};
use hermod::http::writer::{ResponseWriter, WriteError};
use hermod::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    let server = server::serve(&cfg.listen_addr, handle).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    server.close();

    Ok(())
}

async fn handle(req: Request, mut writer: ResponseWriter<OwnedWriteHalf>) {
    let result = match req.target.as_str() {
        "/stream" => stream_response(&mut writer).await,
        _ => plain_response(&mut writer, &req).await,
    };

    if let Err(e) = result {
        tracing::warn!("failed to write response: {}", e);
    }
}

async fn plain_response(
    writer: &mut ResponseWriter<OwnedWriteHalf>,
    req: &Request,
) -> Result<(), WriteError> {
    let body = format!("Hello from hermod: {} {}\n", req.method, req.target);

    writer.write_status_line(StatusCode::OK).await?;
    writer.write_headers(&default_headers(body.len())).await?;
    writer.write_body(body.as_bytes()).await?;
    Ok(())
}

/// Streams a body of unknown length with chunked transfer encoding.
async fn stream_response(writer: &mut ResponseWriter<OwnedWriteHalf>) -> Result<(), WriteError> {
    let mut headers = default_headers(0);
    headers.remove("content-length");
    headers.set("Transfer-Encoding", "chunked");

    writer.write_status_line(StatusCode::OK).await?;
    writer.write_headers(&headers).await?;
    for part in ["streamed ", "in ", "chunks\n"] {
        writer.write_chunked_body(part.as_bytes()).await?;
    }
    writer.write_chunked_body_done().await?;
    writer.write_trailers(&Headers::new()).await?;
    Ok(())
}
