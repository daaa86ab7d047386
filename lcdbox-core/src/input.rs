//! Input channels
//!
//! Both channels reduce a request to a mode id and hand it to
//! [`Orchestrator::switch_mode`]. Serial bytes are assembled into lines by a
//! [`SerialListener`]; an HTTP connection is served by [`serve_connection`].
//! Neither decides which ids exist.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_io_async::{Read, Write};
use lcdbox_protocol::{
    find_head_end, write_response, LineBuffer, ModeResult, RequestLine, Route, SwitchRequest,
    MAX_RESPONSE_SIZE,
};

use crate::log::{log_debug, log_info, log_warn};
use crate::orchestrator::Orchestrator;
use crate::registry::ModeFactory;

/// Turns serial bytes into mode switches
pub struct SerialListener<'a, M: RawMutex, K> {
    orchestrator: &'a Orchestrator<M, K>,
    lines: LineBuffer,
}

impl<'a, M: RawMutex, K: ModeFactory> SerialListener<'a, M, K> {
    pub fn new(orchestrator: &'a Orchestrator<M, K>) -> Self {
        Self {
            orchestrator,
            lines: LineBuffer::new(),
        }
    }

    /// Feed received bytes; every complete line is a switch request
    ///
    /// Returns the number of switches that succeeded.
    pub async fn feed(&mut self, bytes: &[u8]) -> usize {
        let mut switched = 0;
        for &byte in bytes {
            match self.lines.feed(byte) {
                Ok(Some(line)) => {
                    let Some(request) = SwitchRequest::from_line(&line) else {
                        log_debug!("Ignoring serial line '{}'", line.as_str());
                        continue;
                    };
                    log_info!("Serial request for '{}'", request.id());
                    if self.orchestrator.switch_mode(request.id()).await {
                        switched += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => log_warn!("Dropped serial line: {:?}", e),
            }
        }
        switched
    }

    /// Forget a partially received line, e.g. after the host disconnects
    pub fn reset(&mut self) {
        let pending = self.lines.pending();
        if pending > 0 {
            log_debug!("Discarding {} bytes of a partial serial line", pending);
        }
        self.lines.reset();
    }
}

/// Act on a buffered request head
pub async fn handle_http_request<M: RawMutex, K: ModeFactory>(
    orchestrator: &Orchestrator<M, K>,
    head: &[u8],
) -> ModeResult {
    let line = match RequestLine::from_head(head) {
        Ok(line) => line,
        Err(e) => {
            log_warn!("Bad HTTP request: {:?}", e);
            return ModeResult::Failure;
        }
    };
    match line.route() {
        Route::Mode(request) => {
            log_info!("HTTP request for '{}'", request.id());
            orchestrator.switch_mode(request.id()).await.into()
        }
        Route::Unrecognized => {
            log_debug!("Unrouted HTTP path '{}'", line.path);
            ModeResult::Failure
        }
    }
}

/// Serve one HTTP connection: read the head, switch, answer
///
/// Reading stops at the end of the head, at EOF, or when `buf` is full;
/// whatever arrived by then is treated as the request. The response is
/// written after the switch completes.
pub async fn serve_connection<M, K, S>(
    orchestrator: &Orchestrator<M, K>,
    socket: &mut S,
    buf: &mut [u8],
) -> Result<ModeResult, S::Error>
where
    M: RawMutex,
    K: ModeFactory,
    S: Read + Write,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = socket.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
        if find_head_end(&buf[..filled]).is_some() {
            break;
        }
    }

    let result = handle_http_request(orchestrator, &buf[..filled]).await;

    let mut response = [0u8; MAX_RESPONSE_SIZE];
    match write_response(result, &mut response) {
        Ok(len) => {
            socket.write_all(&response[..len]).await?;
            socket.flush().await?;
        }
        Err(e) => log_warn!("Response did not fit: {:?}", e),
    }
    Ok(result)
}
