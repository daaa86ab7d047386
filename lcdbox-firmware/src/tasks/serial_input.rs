//! USB serial input task
//!
//! Reads mode ids, one per line, from the CDC-ACM port.

use defmt::*;
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_time::Timer;
use embassy_usb::class::cdc_acm::CdcAcmClass;
use embassy_usb::driver::EndpointError;
use portable_atomic::Ordering;

use lcdbox_core::input::SerialListener;

use crate::channels::SWITCHES;
use crate::Orch;

/// Full-speed bulk packet size
const PACKET_SIZE: usize = 64;

#[embassy_executor::task]
pub async fn serial_input_task(
    orchestrator: &'static Orch,
    mut class: CdcAcmClass<'static, Driver<'static, USB>>,
    poll_interval_ms: u32,
) -> ! {
    info!("Serial input task started");

    let mut listener = SerialListener::new(orchestrator);
    let mut packet = [0u8; PACKET_SIZE];

    loop {
        class.wait_connection().await;
        info!("USB host attached");

        loop {
            match class.read_packet(&mut packet).await {
                Ok(n) => {
                    trace!("Serial: {} bytes", n);
                    let switched = listener.feed(&packet[..n]).await;
                    if switched > 0 {
                        SWITCHES.fetch_add(switched as u32, Ordering::Relaxed);
                    }
                }
                Err(EndpointError::Disabled) => {
                    info!("USB host detached");
                    break;
                }
                Err(EndpointError::BufferOverflow) => {
                    warn!("Serial packet overflow");
                }
            }
        }

        // A half-received line from the old session is meaningless
        listener.reset();
        Timer::after_millis(u64::from(poll_interval_ms)).await;
    }
}
