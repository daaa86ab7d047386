//! Wi-Fi link handle lent to `Connected` modes
//!
//! Reads the state the connectivity task publishes and forwards power-mode
//! requests to it, waiting until the radio has applied them. Outbound requests open a fresh TCP socket on the shared
//! network stack.

use defmt::*;
use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::Stack;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Duration;
use embedded_io_async::Write;

use lcdbox_core::connectivity::LinkStatus;
use lcdbox_core::traits::{Connectivity, FetchError, LinkState, PowerMode};
use lcdbox_protocol::{build_get, parse_response, HttpError};

/// Plain HTTP only
const HTTP_PORT: u16 = 80;

const RX_BUF_SIZE: usize = 1024;
const TX_BUF_SIZE: usize = 256;
const REQUEST_BUF_SIZE: usize = 256;

/// Idle time after which a stalled socket gives up
const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WifiLink {
    stack: Stack<'static>,
    status: &'static LinkStatus<CriticalSectionRawMutex>,
}

impl WifiLink {
    pub fn new(stack: Stack<'static>, status: &'static LinkStatus<CriticalSectionRawMutex>) -> Self {
        Self { stack, status }
    }
}

impl Connectivity for WifiLink {
    fn state(&self) -> LinkState {
        self.status.state()
    }

    async fn set_power_mode(&self, mode: PowerMode) {
        debug!("Power mode {:?} requested", mode);
        self.status.request_power_mode(mode).await;
    }

    async fn http_get<'b>(
        &self,
        host: &str,
        path: &str,
        buf: &'b mut [u8],
    ) -> Result<&'b [u8], FetchError> {
        if !self.is_connected() || !self.stack.is_config_up() {
            return Err(FetchError::NotConnected);
        }

        let addrs = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|e| {
                warn!("DNS lookup for {} failed: {:?}", host, e);
                FetchError::Dns
            })?;
        let addr = *addrs.first().ok_or(FetchError::Dns)?;

        let mut rx_buf = [0u8; RX_BUF_SIZE];
        let mut tx_buf = [0u8; TX_BUF_SIZE];
        let mut socket = TcpSocket::new(self.stack, &mut rx_buf, &mut tx_buf);
        socket.set_timeout(Some(SOCKET_TIMEOUT));

        socket.connect((addr, HTTP_PORT)).await.map_err(|e| {
            warn!("Connect to {} failed: {:?}", host, e);
            FetchError::Connect
        })?;
        trace!("Connected to {}", host);

        let mut request = [0u8; REQUEST_BUF_SIZE];
        let len = build_get(host, path, &mut request).map_err(|_| FetchError::BufferTooSmall)?;
        socket
            .write_all(&request[..len])
            .await
            .map_err(|_| FetchError::Io)?;

        // HTTP/1.0 with Connection: close, the server ends the body with EOF
        let mut filled = 0;
        loop {
            if filled == buf.len() {
                socket.abort();
                return Err(FetchError::BufferTooSmall);
            }
            match socket.read(&mut buf[filled..]).await {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) => {
                    warn!("Read from {} failed: {:?}", host, e);
                    return Err(FetchError::Io);
                }
            }
        }
        socket.close();
        trace!("{} bytes from {}", filled, host);

        let (status, body_len) = match parse_response(&buf[..filled]) {
            Ok(response) => (response.status, response.body.len()),
            Err(HttpError::Incomplete) => return Err(FetchError::Io),
            Err(_) => return Err(FetchError::BadResponse),
        };
        if !(200..300).contains(&status) {
            return Err(FetchError::Status(status));
        }
        Ok(&buf[filled - body_len..filled])
    }
}
