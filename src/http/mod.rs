//! HTTP/1.1 protocol implementation over raw byte streams.
//!
//! Nothing here assumes a read from the transport lines up with a protocol
//! boundary: the parser accumulates bytes and consumes one logical unit at a
//! time, however the peer fragments its writes.
//!
//! # Submodules
//!
//! - **`headers`**: case-insensitive header table with a line-at-a-time parser
//! - **`request`**: the parsed request type
//! - **`parser`**: resumable request parser (request line → headers → body)
//! - **`response`**: status codes and default response headers
//! - **`writer`**: stateful response writer (status → headers → body →
//!   trailers), with plain and chunked body framing
//!
//! # Request parse states
//!
//! ```text
//! RequestLine ──▶ Headers ──▶ Body ──▶ Done
//! ```
//!
//! Progression is forward-only; `Done` absorbs all further input. The
//! `Headers → Done` shortcut (no Content-Length, or a zero one) skips the
//! `Body` state entirely.

pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
