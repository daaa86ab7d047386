//! Minimal HTTP/1.x framing for the mode-switch endpoint.
//!
//! Only what the device needs: the request line of an incoming request, the
//! end of its header block, and the fixed JSON response. Headers are never
//! interpreted.

use crate::request::SwitchRequest;

/// Upper bound on a rendered mode-switch response
pub const MAX_RESPONSE_SIZE: usize = 128;

const RESPONSE_HEAD: &[u8] = b"HTTP/1.0 200 OK\r\nContent-type: application/json\r\n\r\n";

/// HTTP framing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HttpError {
    /// More bytes needed before the head is complete
    Incomplete,
    /// Request line does not have method, path and version
    MalformedRequestLine,
    /// Response status line could not be parsed
    InvalidStatusLine,
    /// Head contains bytes that are not UTF-8
    InvalidUtf8,
    /// Output buffer too small
    BufferTooSmall,
}

/// Request method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Method {
    Get,
    /// Anything else; never routed
    Other,
}

/// Parsed request line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLine<'a> {
    pub method: Method,
    pub path: &'a str,
    pub version: &'a str,
}

/// What a request asks the device to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `GET /mode/<id>`
    Mode(SwitchRequest),
    /// Any other method or path
    Unrecognized,
}

/// Outcome reported back to the HTTP client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeResult {
    Success,
    Failure,
}

impl ModeResult {
    /// JSON value for the `result` field
    pub const fn as_str(self) -> &'static str {
        match self {
            ModeResult::Success => "success",
            ModeResult::Failure => "failure",
        }
    }
}

impl From<bool> for ModeResult {
    fn from(switched: bool) -> Self {
        if switched {
            ModeResult::Success
        } else {
            ModeResult::Failure
        }
    }
}

/// Parse `METHOD SP PATH SP VERSION`
pub fn parse_request_line(line: &str) -> Result<RequestLine<'_>, HttpError> {
    let mut parts = line.split_ascii_whitespace();
    let (Some(method), Some(path), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(HttpError::MalformedRequestLine);
    };

    if !path.starts_with('/') || !version.starts_with("HTTP/") {
        return Err(HttpError::MalformedRequestLine);
    }

    let method = if method == "GET" {
        Method::Get
    } else {
        Method::Other
    };

    Ok(RequestLine {
        method,
        path,
        version,
    })
}

impl<'a> RequestLine<'a> {
    /// Parse the request line at the start of a buffered head
    ///
    /// Needs only the first line; the rest of the head may still be arriving.
    pub fn from_head(head: &'a [u8]) -> Result<Self, HttpError> {
        let end = head
            .iter()
            .position(|&b| b == b'\n')
            .ok_or(HttpError::Incomplete)?;
        let line = core::str::from_utf8(&head[..end]).map_err(|_| HttpError::InvalidUtf8)?;
        parse_request_line(line.trim_end_matches('\r'))
    }

    /// Map this request onto a device action
    pub fn route(&self) -> Route {
        if self.method != Method::Get {
            return Route::Unrecognized;
        }
        match SwitchRequest::from_path(self.path) {
            Ok(request) => Route::Mode(request),
            Err(_) => Route::Unrecognized,
        }
    }
}

/// Find the end of a header block
///
/// Returns the offset just past the blank line (`\r\n\r\n`, or a bare
/// `\n\n` from lenient clients).
pub fn find_head_end(buf: &[u8]) -> Option<usize> {
    let crlf = buf
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| pos + 4);
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|pos| pos + 2);
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Render the mode-switch response into `buf`
///
/// Returns the number of bytes written.
pub fn write_response(result: ModeResult, buf: &mut [u8]) -> Result<usize, HttpError> {
    let mut w = Writer::new(buf);
    w.put(RESPONSE_HEAD)?;
    w.put(b"{\"result\": \"")?;
    w.put(result.as_str().as_bytes())?;
    w.put(b"\"}")?;
    Ok(w.len())
}

/// Bounds-checked sequential writer over a byte slice
pub(crate) struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn put(&mut self, bytes: &[u8]) -> Result<(), HttpError> {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            return Err(HttpError::BufferTooSmall);
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_request_line() {
        let line = parse_request_line("GET /mode/idle HTTP/1.1").unwrap();
        assert_eq!(line.method, Method::Get);
        assert_eq!(line.path, "/mode/idle");
        assert_eq!(line.version, "HTTP/1.1");
    }

    #[test]
    fn test_parse_request_line_malformed() {
        assert_eq!(
            parse_request_line("GET"),
            Err(HttpError::MalformedRequestLine)
        );
        assert_eq!(
            parse_request_line("GET mode HTTP/1.1"),
            Err(HttpError::MalformedRequestLine)
        );
        assert_eq!(
            parse_request_line("GET / SPDY"),
            Err(HttpError::MalformedRequestLine)
        );
        assert_eq!(
            parse_request_line("GET / HTTP/1.1 extra"),
            Err(HttpError::MalformedRequestLine)
        );
    }

    #[test]
    fn test_from_head_needs_first_line() {
        assert_eq!(
            RequestLine::from_head(b"GET /mode/idle HT"),
            Err(HttpError::Incomplete)
        );
        let line = RequestLine::from_head(b"GET /mode/idle HTTP/1.0\r\nHost: x\r\n").unwrap();
        assert_eq!(line.path, "/mode/idle");
    }

    #[test]
    fn test_route() {
        let get = parse_request_line("GET /mode/status HTTP/1.1").unwrap();
        match get.route() {
            Route::Mode(req) => assert_eq!(req.id(), "status"),
            Route::Unrecognized => panic!("expected mode route"),
        }

        let post = parse_request_line("POST /mode/status HTTP/1.1").unwrap();
        assert_eq!(post.route(), Route::Unrecognized);

        let other = parse_request_line("GET /other/path HTTP/1.1").unwrap();
        assert_eq!(other.route(), Route::Unrecognized);
    }

    #[test]
    fn test_find_head_end() {
        let req = b"GET / HTTP/1.1\r\nHost: a\r\n\r\nbody";
        assert_eq!(find_head_end(req), Some(req.len() - 4));
        assert_eq!(find_head_end(b"GET / HTTP/1.1\r\nHost: a\r\n"), None);
        assert_eq!(find_head_end(b"GET / HTTP/1.0\n\n"), Some(16));
    }

    #[test]
    fn test_write_response() {
        let mut buf = [0u8; MAX_RESPONSE_SIZE];
        let len = write_response(ModeResult::Success, &mut buf).unwrap();
        assert_eq!(
            &buf[..len],
            b"HTTP/1.0 200 OK\r\nContent-type: application/json\r\n\r\n{\"result\": \"success\"}"
        );

        let len = write_response(ModeResult::Failure, &mut buf).unwrap();
        assert!(buf[..len].ends_with(b"{\"result\": \"failure\"}"));
    }

    #[test]
    fn test_write_response_buffer_too_small() {
        let mut buf = [0u8; 16];
        assert_eq!(
            write_response(ModeResult::Success, &mut buf),
            Err(HttpError::BufferTooSmall)
        );
    }

    #[test]
    fn test_mode_result_from_bool() {
        assert_eq!(ModeResult::from(true), ModeResult::Success);
        assert_eq!(ModeResult::from(false), ModeResult::Failure);
    }

    proptest! {
        #[test]
        fn prop_head_parsing_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = RequestLine::from_head(&bytes).map(|line| line.route());
            if let Some(end) = find_head_end(&bytes) {
                prop_assert!(end <= bytes.len());
            }
        }
    }
}
