use crate::http::headers::Headers;

/// An HTTP response status code.
///
/// Any `u16` is representable; only the codes this server actually sends get
/// a reason phrase. Unknown codes are written with an empty phrase (the
/// separating space is still emitted).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    pub fn as_u16(self) -> u16 {
        self.0
    }

    pub fn reason_phrase(self) -> &'static str {
        match self.0 {
            200 => "OK",
            400 => "Bad Request",
            500 => "Internal Server Error",
            _ => "",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The header set used for responses the server composes itself: the 400 it
/// sends on a malformed request, and everything the buffered-handler path
/// emits. Handlers on the streaming path may use it as a starting point.
pub fn default_headers(content_len: usize) -> Headers {
    let mut headers = Headers::new();
    headers.set("Content-Type", "text/plain");
    headers.set("Connection", "close");
    headers.set("Content-Length", content_len.to_string());
    headers
}
