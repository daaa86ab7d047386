//! HTTP input task
//!
//! Accepts one connection at a time on the configured port and answers
//! `GET /mode/<id>` requests.

use defmt::*;
use embassy_net::tcp::TcpSocket;
use embassy_net::Stack;
use embassy_time::Duration;
use portable_atomic::Ordering;

use lcdbox_core::input::serve_connection;
use lcdbox_protocol::ModeResult;

use crate::channels::{HTTP_REQUESTS, SWITCHES};
use crate::Orch;

const RX_BUF_SIZE: usize = 1024;
const TX_BUF_SIZE: usize = 256;
/// Request heads longer than this are cut off
const HEAD_BUF_SIZE: usize = 1024;

/// Clients that stop talking are dropped after this long
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

#[embassy_executor::task]
pub async fn http_input_task(orchestrator: &'static Orch, stack: Stack<'static>, port: u16) -> ! {
    info!("HTTP input task started");

    let mut rx_buf = [0u8; RX_BUF_SIZE];
    let mut tx_buf = [0u8; TX_BUF_SIZE];
    let mut head = [0u8; HEAD_BUF_SIZE];

    loop {
        stack.wait_config_up().await;

        let mut socket = TcpSocket::new(stack, &mut rx_buf, &mut tx_buf);
        socket.set_timeout(Some(CLIENT_TIMEOUT));

        debug!("Listening on port {}", port);
        if let Err(e) = socket.accept(port).await {
            warn!("HTTP accept failed: {:?}", e);
            continue;
        }
        debug!("HTTP connection from {:?}", socket.remote_endpoint());

        match serve_connection(orchestrator, &mut socket, &mut head).await {
            Ok(result) => {
                HTTP_REQUESTS.fetch_add(1, Ordering::Relaxed);
                if result == ModeResult::Success {
                    SWITCHES.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(e) => warn!("HTTP connection error: {:?}", e),
        }

        socket.close();
        if let Err(e) = socket.flush().await {
            debug!("HTTP close: {:?}", e);
        }
    }
}
