//! Connectivity keeper task
//!
//! Owns the CYW43 control handle. Every reconnect interval it checks the
//! link and rejoins if needed. Power-mode requests posted by modes are
//! applied and acknowledged at any point, including during a join.

use cyw43::{Control, JoinOptions, PowerManagementMode};
use defmt::*;
use embassy_futures::select::{select, select3, Either, Either3};
use embassy_net::Stack;
use embassy_time::{with_timeout, Duration, Instant, Timer};

use lcdbox_core::config::WifiConfig;
use lcdbox_core::connectivity::{Keeper, KeeperAction};
use lcdbox_core::traits::PowerMode;

use crate::channels::LINK_STATUS;

/// How one join attempt ended
enum JoinOutcome {
    /// Associated with a DHCP lease
    Up,
    /// Refused, timed out or no lease
    Failed,
    /// Abandoned to serve a power-mode request
    Interrupted,
}

#[embassy_executor::task]
pub async fn connectivity_task(mut control: Control<'static>, stack: Stack<'static>, wifi: WifiConfig) -> ! {
    info!("Connectivity task started");

    if wifi.ssid.is_empty() {
        warn!("No SSID configured, Wi-Fi stays down");
        loop {
            let mode = LINK_STATUS.next_power_request().await;
            apply_power_mode(&mut control, mode).await;
        }
    }

    let interval = Duration::from_secs(u64::from(wifi.reconnect_interval_s.max(1)));
    let mut keeper = Keeper::new();

    loop {
        match keeper.observe(stack.is_link_up() && stack.is_config_up(), &LINK_STATUS) {
            KeeperAction::Join => match join(&mut control, stack, &wifi).await {
                JoinOutcome::Up | JoinOutcome::Interrupted => continue,
                JoinOutcome::Failed => {
                    keeper.join_failed(&LINK_STATUS);
                    warn!("Join failed ({} in a row), retrying", keeper.failed_joins());
                }
            },
            KeeperAction::Announce => announce(stack),
            KeeperAction::Wait => {}
        }

        let next_check = Instant::now() + interval;
        loop {
            match select(Timer::at(next_check), LINK_STATUS.next_power_request()).await {
                Either::First(()) => break,
                Either::Second(mode) => apply_power_mode(&mut control, mode).await,
            }
        }
    }
}

/// One join attempt, including the DHCP lease
async fn join(control: &mut Control<'static>, stack: Stack<'static>, wifi: &WifiConfig) -> JoinOutcome {
    info!("Joining '{}'", wifi.ssid.as_str());
    let timeout = Duration::from_secs(u64::from(wifi.join_timeout_s.max(1)));

    let options = if wifi.password.is_empty() {
        JoinOptions::new_open()
    } else {
        JoinOptions::new(wifi.password.as_bytes())
    };

    let attempt = with_timeout(timeout, control.join(wifi.ssid.as_str(), options));
    match select(attempt, LINK_STATUS.next_power_request()).await {
        Either::First(Ok(Ok(()))) => {}
        Either::First(Ok(Err(e))) => {
            warn!("Join error: {:?}", e);
            control.leave().await;
            return JoinOutcome::Failed;
        }
        Either::First(Err(_)) => {
            warn!("Join timed out after {}s", wifi.join_timeout_s);
            control.leave().await;
            return JoinOutcome::Failed;
        }
        Either::Second(mode) => {
            // The control handle is busy for the whole join
            info!("Join abandoned for a power-mode change");
            control.leave().await;
            apply_power_mode(control, mode).await;
            return JoinOutcome::Interrupted;
        }
    }

    let deadline = Instant::now() + timeout;
    loop {
        match select3(
            stack.wait_config_up(),
            Timer::at(deadline),
            LINK_STATUS.next_power_request(),
        )
        .await
        {
            Either3::First(()) => return JoinOutcome::Up,
            Either3::Second(()) => {
                warn!("No DHCP lease after {}s", wifi.join_timeout_s);
                return JoinOutcome::Failed;
            }
            Either3::Third(mode) => apply_power_mode(control, mode).await,
        }
    }
}

fn announce(stack: Stack<'static>) {
    match stack.config_v4() {
        Some(config) => {
            let ip = config.address.address().octets();
            info!("Wi-Fi connected, address {}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]);
        }
        None => info!("Wi-Fi connected"),
    }
}

/// Apply a power mode and release the mode waiting on it
async fn apply_power_mode(control: &mut Control<'static>, mode: PowerMode) {
    info!("Radio power mode {:?}", mode);
    let pm = match mode {
        PowerMode::Performance => PowerManagementMode::Performance,
        PowerMode::PowerSave => PowerManagementMode::PowerSave,
    };
    control.set_power_management(pm).await;
    LINK_STATUS.acknowledge_power_mode(mode);
}
