use std::collections::HashMap;

use crate::http::parser::ParseError;

/// Characters allowed in a header field name besides ASCII letters and digits.
const TOKEN_SPECIALS: &[u8] = b"!#$%&'*+-.^_`|~";

/// A table of HTTP header fields.
///
/// Keys parsed off the wire are lowercased before storage, so lookups are
/// case-insensitive. Repeated fields are folded into one entry with the
/// values joined by `", "`, in the order they were seen. The folding is
/// applied to every header name, even ones (like `Set-Cookie`) where joining
/// loses information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    map: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Parses at most one header line from the front of `buf`.
    ///
    /// Returns `(consumed, done)`:
    /// - `(0, false)` — no complete line in `buf` yet, feed more data
    /// - `(2, true)` — the blank line terminating the header section
    /// - `(n, false)` — one header line of `n` bytes (CRLF included) was
    ///   parsed and stored
    pub fn parse_line(&mut self, buf: &[u8]) -> Result<(usize, bool), ParseError> {
        let Some(idx) = find_crlf(buf) else {
            return Ok((0, false));
        };

        if idx == 0 {
            // the empty line
            return Ok((2, true));
        }

        let line = &buf[..idx];

        let colon = line
            .iter()
            .position(|&b| b == b':')
            .ok_or_else(|| ParseError::InvalidHeader("no colon found".into()))?;

        if colon == 0 || line[colon - 1].is_ascii_whitespace() {
            return Err(ParseError::InvalidHeader(
                String::from_utf8_lossy(line).into_owned(),
            ));
        }

        let key = line[..colon].trim_ascii();
        for &b in key {
            if !b.is_ascii_alphanumeric() && !TOKEN_SPECIALS.contains(&b) {
                return Err(ParseError::InvalidHeader(format!(
                    "invalid character {:?} in field name",
                    b as char
                )));
            }
        }

        let key = String::from_utf8_lossy(key).to_ascii_lowercase();
        let value = String::from_utf8_lossy(line[colon + 1..].trim_ascii()).into_owned();

        match self.map.get_mut(&key) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(&value);
            }
            None => {
                self.map.insert(key, value);
            }
        }

        Ok((idx + 2, false))
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(&name.to_ascii_lowercase()).map(|v| v.as_str())
    }

    /// Inserts or replaces a field. Names are normalized to lowercase here
    /// too, so the encoding direction canonicalizes the same way parsing does.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.map.insert(name.into().to_ascii_lowercase(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.map.remove(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Headers {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            map: iter
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
        }
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}
