use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::headers::Headers;
use crate::http::response::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// The status line has not been written yet.
    Status,
    /// Status line written; headers may be written.
    Headers,
    /// Headers written; body (plain or chunked) may be written.
    Body,
    /// Chunked body terminated; trailers may be written.
    Trailers,
}

impl std::fmt::Display for WriterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WriterState::Status => "status",
            WriterState::Headers => "headers",
            WriterState::Body => "body",
            WriterState::Trailers => "trailers",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("write called in wrong state: expected {expected}, was {actual}")]
    InvalidState {
        expected: WriterState,
        actual: WriterState,
    },
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Stateful HTTP/1.1 response writer.
///
/// Enforces the legal write ordering: status line, then headers, then body.
/// A body is either plain (`write_body`, repeatable) or chunked
/// (`write_chunked_body` repeatedly, `write_chunked_body_done`, then
/// `write_trailers`). A call made in the wrong state fails before touching
/// the sink, so an ordering bug never emits partial garbage onto the wire.
pub struct ResponseWriter<W> {
    sink: W,
    state: WriterState,
}

impl<W: AsyncWrite + Unpin> ResponseWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            state: WriterState::Status,
        }
    }

    /// Consumes the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn check_state(&self, expected: WriterState) -> Result<(), WriteError> {
        if self.state != expected {
            return Err(WriteError::InvalidState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    /// Writes `HTTP/1.1 <code> <reason>\r\n`. Must be the first call.
    pub async fn write_status_line(&mut self, code: StatusCode) -> Result<(), WriteError> {
        self.check_state(WriterState::Status)?;

        let line = format!("HTTP/1.1 {} {}\r\n", code.as_u16(), code.reason_phrase());
        self.sink.write_all(line.as_bytes()).await?;

        self.state = WriterState::Headers;
        Ok(())
    }

    /// Writes one `Key: Value\r\n` line per entry, then the blank line that
    /// separates headers from body. Entry order is whatever the table yields.
    pub async fn write_headers(&mut self, headers: &Headers) -> Result<(), WriteError> {
        self.check_state(WriterState::Headers)?;

        self.write_header_lines(headers).await?;

        self.state = WriterState::Body;
        Ok(())
    }

    /// Writes raw body bytes. Repeatable; for Content-Length framed bodies.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<(), WriteError> {
        self.check_state(WriterState::Body)?;

        self.sink.write_all(body).await?;
        Ok(())
    }

    /// Writes one chunk: `<hex length>\r\n<bytes>\r\n`. An empty input writes
    /// nothing, since an empty chunk frame would terminate the body.
    pub async fn write_chunked_body(&mut self, chunk: &[u8]) -> Result<(), WriteError> {
        self.check_state(WriterState::Body)?;

        if chunk.is_empty() {
            return Ok(());
        }

        let header = format!("{:x}\r\n", chunk.len());
        self.sink.write_all(header.as_bytes()).await?;
        self.sink.write_all(chunk).await?;
        self.sink.write_all(b"\r\n").await?;
        Ok(())
    }

    /// Writes the terminating zero-length chunk marker.
    pub async fn write_chunked_body_done(&mut self) -> Result<(), WriteError> {
        self.check_state(WriterState::Body)?;

        self.sink.write_all(b"0\r\n").await?;

        self.state = WriterState::Trailers;
        Ok(())
    }

    /// Writes trailer header lines and the final blank line, completing a
    /// chunked response.
    pub async fn write_trailers(&mut self, trailers: &Headers) -> Result<(), WriteError> {
        self.check_state(WriterState::Trailers)?;

        self.write_header_lines(trailers).await?;
        Ok(())
    }

    async fn write_header_lines(&mut self, headers: &Headers) -> Result<(), WriteError> {
        for (key, value) in headers.iter() {
            let line = format!("{}: {}\r\n", key, value);
            self.sink.write_all(line.as_bytes()).await?;
        }
        self.sink.write_all(b"\r\n").await?;
        Ok(())
    }
}
