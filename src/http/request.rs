use crate::http::headers::Headers;

/// A fully parsed HTTP/1.1 request.
///
/// Produced by the parser once it has consumed the request line, the header
/// section, and any declared body. The method is kept as the raw token from
/// the wire; the parser does not restrict the method set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The method token (e.g. "GET", "POST")
    pub method: String,
    /// The request target (e.g. "/index.html", "/search?q=rust")
    pub target: String,
    /// HTTP version without the scheme prefix: "1.1" or "1.0"
    pub version: String,
    /// Parsed request headers, keys lowercased
    pub headers: Headers,
    /// Request body; empty unless a non-zero Content-Length was declared
    pub body: Vec<u8>,
}

impl Request {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}
