use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::headers::Headers;
use crate::http::request::Request;

/// How much we ask the transport for on each read.
const READ_CHUNK_SIZE: usize = 1024;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid request line format: {0}")]
    InvalidRequestLine(String),
    #[error("unsupported http version: {0}")]
    UnsupportedVersion(String),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("invalid content-length: {0}")]
    InvalidContentLength(String),
    #[error("unexpected end of stream before request was complete")]
    UnexpectedEof,
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    RequestLine,
    Headers,
    Body,
    Done,
}

/// Incremental HTTP/1.1 request parser.
///
/// `parse` consumes one logical unit (request line, header line, or body
/// slice) at a time from the front of whatever bytes the caller has buffered,
/// and reports how many bytes it used. A return of `Ok(0)` means the buffer
/// does not yet hold a complete unit; the caller reads more and retries. No
/// alignment between read boundaries and protocol boundaries is assumed: a
/// unit may span many reads, and one read may hold many units.
pub struct RequestParser {
    state: ParserState,
    method: String,
    target: String,
    version: String,
    headers: Headers,
    body: Vec<u8>,
    // Declared content length; resolved when the header section ends.
    content_length: usize,
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::RequestLine,
            method: String::new(),
            target: String::new(),
            version: String::new(),
            headers: Headers::new(),
            body: Vec::new(),
            content_length: 0,
        }
    }

    /// Attempts to parse one unit from the front of `buf`; returns the number
    /// of bytes consumed. `Ok(0)` means more data is needed. Once the parser
    /// is done, every further call is a no-op returning `Ok(0)`.
    pub fn parse(&mut self, buf: &[u8]) -> Result<usize, ParseError> {
        match self.state {
            ParserState::RequestLine => self.parse_request_line(buf),
            ParserState::Headers => self.parse_header_line(buf),
            ParserState::Body => Ok(self.parse_body(buf)),
            ParserState::Done => Ok(0),
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    /// Moves the accumulated pieces into a `Request`. Only meaningful once
    /// `is_done` returns true; the read loop checks before calling.
    pub fn into_request(self) -> Request {
        Request {
            method: self.method,
            target: self.target,
            version: self.version,
            headers: self.headers,
            body: self.body,
        }
    }

    fn parse_request_line(&mut self, buf: &[u8]) -> Result<usize, ParseError> {
        let Some(idx) = buf.windows(2).position(|w| w == b"\r\n") else {
            return Ok(0);
        };

        let line = std::str::from_utf8(&buf[..idx])
            .map_err(|_| ParseError::InvalidRequestLine("not valid utf-8".into()))?;

        // Splitting on single spaces: "GET  /" is malformed, not two tokens.
        let parts: Vec<&str> = line.split(' ').collect();
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine(format!(
                "expected 3 parts, got {} in {:?}",
                parts.len(),
                line
            )));
        }

        let version = match parts[2] {
            "HTTP/1.1" => "1.1",
            "HTTP/1.0" => "1.0",
            other => return Err(ParseError::UnsupportedVersion(other.to_string())),
        };

        self.method = parts[0].to_string();
        self.target = parts[1].to_string();
        self.version = version.to_string();
        self.state = ParserState::Headers;

        Ok(idx + 2)
    }

    fn parse_header_line(&mut self, buf: &[u8]) -> Result<usize, ParseError> {
        let (consumed, done) = self.headers.parse_line(buf)?;
        if done {
            self.begin_body()?;
        }
        Ok(consumed)
    }

    /// Resolves the declared body length once the blank line after the
    /// headers has been consumed. No Content-Length means no body.
    fn begin_body(&mut self) -> Result<(), ParseError> {
        match self.headers.get("content-length") {
            None => {
                self.state = ParserState::Done;
            }
            Some(raw) => {
                let len: usize = raw
                    .parse()
                    .map_err(|_| ParseError::InvalidContentLength(raw.to_string()))?;
                if len == 0 {
                    self.state = ParserState::Done;
                } else {
                    self.content_length = len;
                    self.state = ParserState::Body;
                }
            }
        }
        Ok(())
    }

    fn parse_body(&mut self, buf: &[u8]) -> usize {
        let needed = self.content_length - self.body.len();
        let take = needed.min(buf.len());

        self.body.extend_from_slice(&buf[..take]);
        if self.body.len() == self.content_length {
            self.state = ParserState::Done;
        }

        take
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads one full request from `reader`, however the transport fragments it.
///
/// Bytes past the end of the request are left unread (or discarded with the
/// buffer); the server closes the connection after one response, so nothing
/// downstream wants them.
pub async fn parse_from<R>(reader: &mut R) -> Result<Request, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut parser = RequestParser::new();
    let mut buf = BytesMut::with_capacity(READ_CHUNK_SIZE);

    loop {
        // Drain everything parseable before going back to the transport.
        loop {
            let consumed = parser.parse(&buf)?;
            if consumed == 0 {
                break;
            }
            buf.advance(consumed);
        }

        if parser.is_done() {
            return Ok(parser.into_request());
        }

        buf.reserve(READ_CHUNK_SIZE);
        let n = reader.read_buf(&mut buf).await?;
        if n == 0 {
            // Peer closed mid-message.
            return Err(ParseError::UnexpectedEof);
        }
    }
}
