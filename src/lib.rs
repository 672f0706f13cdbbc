//! Hermod - HTTP/1.1 served straight off a TCP stream.
//!
//! No HTTP library underneath: the wire protocol is parsed and emitted here,
//! byte by byte, resumable across arbitrarily fragmented reads.

pub mod config;
pub mod http;
pub mod server;
