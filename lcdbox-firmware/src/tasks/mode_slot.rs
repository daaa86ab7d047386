//! Exclusive mode slot task
//!
//! Runs whichever mode the orchestrator starts, one at a time, against the
//! panel, the Wi-Fi link and the board services.

use defmt::*;

use lcdbox_core::config::FetchConfig;
use lcdbox_core::modes::DeviceLauncher;

use crate::link::WifiLink;
use crate::platform::PicoPlatform;
use crate::{Orch, Screen};

#[embassy_executor::task]
pub async fn mode_slot_task(
    orchestrator: &'static Orch,
    display: Screen,
    link: &'static WifiLink,
    platform: PicoPlatform,
    fetch: FetchConfig,
) -> ! {
    info!("Mode slot task started");

    let mut launcher = DeviceLauncher::new(display, link, platform, fetch);
    orchestrator.run_slot(&mut launcher).await
}
