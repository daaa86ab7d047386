//! Outbound HTTP/1.0 GET framing used by the data-fetching modes.
//!
//! Requests are HTTP/1.0 with `Connection: close`, so responses are never
//! chunked and the body is everything after the head.

use crate::http::{find_head_end, HttpError, Writer};

/// Parsed response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response<'a> {
    /// Status code, e.g. 200
    pub status: u16,
    /// Body bytes received so far
    pub body: &'a [u8],
}

impl Response<'_> {
    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Render a GET request for `path` on `host` into `buf`
///
/// Returns the number of bytes written.
pub fn build_get(host: &str, path: &str, buf: &mut [u8]) -> Result<usize, HttpError> {
    let mut w = Writer::new(buf);
    w.put(b"GET ")?;
    w.put(path.as_bytes())?;
    w.put(b" HTTP/1.0\r\nHost: ")?;
    w.put(host.as_bytes())?;
    w.put(b"\r\nUser-Agent: lcdbox\r\nAccept: application/json\r\nConnection: close\r\n\r\n")?;
    Ok(w.len())
}

/// Split a buffered response into status and body
pub fn parse_response(buf: &[u8]) -> Result<Response<'_>, HttpError> {
    let head_end = find_head_end(buf).ok_or(HttpError::Incomplete)?;
    let line_end = buf
        .iter()
        .position(|&b| b == b'\n')
        .ok_or(HttpError::Incomplete)?;
    let line = core::str::from_utf8(&buf[..line_end]).map_err(|_| HttpError::InvalidUtf8)?;

    let mut parts = line.trim_end_matches('\r').split_ascii_whitespace();
    let version = parts.next().ok_or(HttpError::InvalidStatusLine)?;
    if !version.starts_with("HTTP/") {
        return Err(HttpError::InvalidStatusLine);
    }
    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or(HttpError::InvalidStatusLine)?;

    Ok(Response {
        status,
        body: &buf[head_end..],
    })
}
