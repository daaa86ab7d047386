//! Connectivity keeper state
//!
//! The keeper task owns the radio. Everything else talks to it through a
//! shared [`LinkStatus`]: the keeper publishes the association state, modes
//! post power-mode requests and wait for the keeper to acknowledge them.
//! [`Keeper`] holds the reconnect decision logic so it can be tested without
//! a radio.
//!
//! ```text
//!   mode                         LinkStatus                    keeper
//!    │ request_power_mode(m) ──► power_request ──► next_power_request()
//!    │                                                 set radio power
//!    │ ◄──────────────────────── power_applied ◄── acknowledge_power_mode(m)
//! ```

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

use crate::traits::{LinkState, PowerMode};

/// Link state and power requests shared between the keeper and modes
pub struct LinkStatus<M: RawMutex> {
    state: Mutex<M, Cell<LinkState>>,
    power_request: Signal<M, PowerMode>,
    power_applied: Signal<M, PowerMode>,
}

impl<M: RawMutex> Default for LinkStatus<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> LinkStatus<M> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(LinkState::Idle)),
            power_request: Signal::new(),
            power_applied: Signal::new(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state.lock(|s| s.get())
    }

    pub fn set_state(&self, state: LinkState) {
        self.state.lock(|s| s.set(state));
    }

    /// Ask the keeper for a power-mode change and wait until it is applied
    ///
    /// A newer request replaces one the keeper has not picked up yet.
    pub async fn request_power_mode(&self, mode: PowerMode) {
        self.power_applied.reset();
        self.power_request.signal(mode);
        while self.power_applied.wait().await != mode {}
    }

    /// Wait for the next power-mode request
    pub async fn next_power_request(&self) -> PowerMode {
        self.power_request.wait().await
    }

    /// Report that the radio now runs in `mode`
    pub fn acknowledge_power_mode(&self, mode: PowerMode) {
        self.power_applied.signal(mode);
    }
}

/// What the keeper should do after a link check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeeperAction {
    /// Link is down, (re)join
    Join,
    /// Link just came up, log the address
    Announce,
    /// Nothing to do until the next check
    Wait,
}

/// Reconnect policy
///
/// Checked every reconnect interval. A down link always triggers a join;
/// the first check that sees it up again triggers one announcement.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keeper {
    announced: bool,
    failed_joins: u32,
}

impl Keeper {
    pub const fn new() -> Self {
        Self {
            announced: false,
            failed_joins: 0,
        }
    }

    /// Decide the next action from the current link state and publish it
    pub fn observe<M: RawMutex>(&mut self, link_up: bool, status: &LinkStatus<M>) -> KeeperAction {
        if link_up {
            status.set_state(LinkState::Connected);
            if self.announced {
                KeeperAction::Wait
            } else {
                self.announced = true;
                self.failed_joins = 0;
                KeeperAction::Announce
            }
        } else {
            self.announced = false;
            status.set_state(LinkState::Connecting);
            KeeperAction::Join
        }
    }

    /// Record a failed join attempt
    pub fn join_failed<M: RawMutex>(&mut self, status: &LinkStatus<M>) {
        self.failed_joins = self.failed_joins.saturating_add(1);
        status.set_state(LinkState::Failed);
    }

    /// Consecutive failed joins since the link was last up
    pub fn failed_joins(&self) -> u32 {
        self.failed_joins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::join::join;
    use embassy_futures::{block_on, yield_now};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_keeper_joins_when_down() {
        let status = LinkStatus::<NoopRawMutex>::new();
        let mut keeper = Keeper::new();
        assert_eq!(status.state(), LinkState::Idle);

        assert_eq!(keeper.observe(false, &status), KeeperAction::Join);
        assert_eq!(status.state(), LinkState::Connecting);

        keeper.join_failed(&status);
        keeper.join_failed(&status);
        assert_eq!(status.state(), LinkState::Failed);
        assert_eq!(keeper.failed_joins(), 2);
    }

    #[test]
    fn test_keeper_announces_once() {
        let status = LinkStatus::<NoopRawMutex>::new();
        let mut keeper = Keeper::new();

        assert_eq!(keeper.observe(true, &status), KeeperAction::Announce);
        assert_eq!(status.state(), LinkState::Connected);
        assert_eq!(keeper.observe(true, &status), KeeperAction::Wait);

        // Drop and recover announces again
        assert_eq!(keeper.observe(false, &status), KeeperAction::Join);
        assert_eq!(keeper.observe(true, &status), KeeperAction::Announce);
        assert_eq!(keeper.failed_joins(), 0);
    }

    #[test]
    fn test_power_request_waits_for_ack() {
        let status = LinkStatus::<NoopRawMutex>::new();
        let applied = Cell::new(None);

        block_on(join(
            async {
                status.request_power_mode(PowerMode::PowerSave).await;
                assert_eq!(applied.get(), Some(PowerMode::PowerSave));
            },
            async {
                let mode = status.next_power_request().await;
                yield_now().await;
                applied.set(Some(mode));
                status.acknowledge_power_mode(mode);
            },
        ));
    }

    #[test]
    fn test_stale_ack_does_not_release_request() {
        let status = LinkStatus::<NoopRawMutex>::new();
        let done = Cell::new(false);

        block_on(join(
            async {
                status.request_power_mode(PowerMode::Performance).await;
                done.set(true);
            },
            async {
                assert_eq!(status.next_power_request().await, PowerMode::Performance);
                status.acknowledge_power_mode(PowerMode::PowerSave);
                yield_now().await;
                yield_now().await;
                assert!(!done.get());
                status.acknowledge_power_mode(PowerMode::Performance);
            },
        ));
        assert!(done.get());
    }
}
