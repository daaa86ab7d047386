//! Display modes
//!
//! Each mode is a type implementing [`Mode`]. [`ModeKind`] is the registry
//! tag naming every mode the device ships; [`DeviceLauncher`] turns a tag
//! into a running mode with the right collaborators.
//!
//! ```text
//!   setup ──► run ──► restore ──┬─► Ok(())          ─► Finished
//!     │                         ├─► Err(Cancelled)  ─► Cancelled
//!     │                         └─► Err(other)      ─► Finished (logged)
//!     └─ Err ─► SetupFailed (slot left empty, setup undoes its own changes)
//! ```

pub mod context;

mod currency;
mod dvd_bounce;
mod idle;
mod jokes;
mod news_ticker;
mod status;
mod test_card;
mod text_scroll;

pub use context::{ModeContext, ModeError};
pub use currency::CurrencyTracker;
pub use dvd_bounce::DvdBounce;
pub use idle::Idle;
pub use jokes::Jokes;
pub use news_ticker::NewsTicker;
pub use status::Status;
pub use test_card::TestCard;
pub use text_scroll::TextScroll;

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::cancel::CancelToken;
use crate::config::FetchConfig;
use crate::log::{log_error, log_info, log_warn};
use crate::orchestrator::{ModeExit, ModeLauncher};
use crate::registry::{Category, ModeDescriptor, ModeFactory, Registry, RegistryError};
use crate::traits::{Connectivity, Display, Platform};

/// A display mode
///
/// `setup` prepares the screen and must not suspend; when it fails it leaves
/// display power and backlight as it found them. `run` is the main loop; it
/// observes cancellation through the `Result` of every context sleep and
/// returns `Err(ModeError::Cancelled)` when it does. `restore` runs after
/// every `run`, however it ended.
#[allow(async_fn_in_trait)]
pub trait Mode: Sized {
    fn setup<M, D, C, P>(ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<Self, ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform;

    async fn run<M, D, C, P>(&mut self, ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<(), ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform;

    /// Restore whatever the mode changed outside its own screen contents
    async fn restore<M, D, C, P>(&mut self, _ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<(), ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        Ok(())
    }
}

/// Every mode the device ships
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeKind {
    CurrencyTracker,
    DvdBounce,
    Idle,
    Jokes,
    NewsTicker,
    Status,
    Test,
    TextScroll,
}

impl ModeKind {
    pub const ALL: [ModeKind; 8] = [
        ModeKind::CurrencyTracker,
        ModeKind::DvdBounce,
        ModeKind::Idle,
        ModeKind::Jokes,
        ModeKind::NewsTicker,
        ModeKind::Status,
        ModeKind::Test,
        ModeKind::TextScroll,
    ];

    /// Id used on the serial and HTTP channels
    pub const fn id(self) -> &'static str {
        match self {
            ModeKind::CurrencyTracker => "currency_tracker",
            ModeKind::DvdBounce => "dvd_bounce",
            ModeKind::Idle => "idle",
            ModeKind::Jokes => "jokes",
            ModeKind::NewsTicker => "news_ticker",
            ModeKind::Status => "status",
            ModeKind::Test => "test",
            ModeKind::TextScroll => "text_scroll",
        }
    }
}

impl ModeFactory for ModeKind {
    fn category(&self) -> Category {
        match self {
            ModeKind::DvdBounce | ModeKind::Test | ModeKind::TextScroll => Category::Exclusive,
            ModeKind::CurrencyTracker
            | ModeKind::Idle
            | ModeKind::Jokes
            | ModeKind::NewsTicker
            | ModeKind::Status => Category::Connected,
        }
    }
}

/// Registry of every shipped mode
pub fn registry() -> Result<Registry<ModeKind>, RegistryError> {
    Registry::new(&ModeKind::ALL.map(|kind| ModeDescriptor::new(kind.id(), kind)))
}

/// Runs modes against the device's display, link and platform
pub struct DeviceLauncher<'a, D, C, P> {
    display: D,
    link: &'a C,
    platform: P,
    fetch: FetchConfig,
}

impl<'a, D, C, P> DeviceLauncher<'a, D, C, P>
where
    D: Display,
    C: Connectivity,
    P: Platform,
{
    pub fn new(display: D, link: &'a C, platform: P, fetch: FetchConfig) -> Self {
        Self {
            display,
            link,
            platform,
            fetch,
        }
    }

    /// Connectivity handle a mode of `category` is given
    fn link_for(&self, category: Category) -> Option<&'a C> {
        if category.needs_connectivity() {
            Some(self.link)
        } else {
            None
        }
    }
}

impl<M, D, C, P> ModeLauncher<M, ModeKind> for DeviceLauncher<'_, D, C, P>
where
    M: RawMutex,
    D: Display,
    C: Connectivity,
    P: Platform,
{
    async fn launch(&mut self, mode: &ModeDescriptor<ModeKind>, cancel: &CancelToken<M>) -> ModeExit {
        let link = self.link_for(mode.category);
        let mut ctx = ModeContext::new(
            &mut self.display,
            &mut self.platform,
            &self.fetch,
            link,
            cancel,
        );

        match mode.factory {
            ModeKind::CurrencyTracker => drive::<CurrencyTracker, _, _, _, _>(mode.id, &mut ctx).await,
            ModeKind::DvdBounce => drive::<DvdBounce, _, _, _, _>(mode.id, &mut ctx).await,
            ModeKind::Idle => drive::<Idle, _, _, _, _>(mode.id, &mut ctx).await,
            ModeKind::Jokes => drive::<Jokes, _, _, _, _>(mode.id, &mut ctx).await,
            ModeKind::NewsTicker => drive::<NewsTicker, _, _, _, _>(mode.id, &mut ctx).await,
            ModeKind::Status => drive::<Status, _, _, _, _>(mode.id, &mut ctx).await,
            ModeKind::Test => drive::<TestCard, _, _, _, _>(mode.id, &mut ctx).await,
            ModeKind::TextScroll => drive::<TextScroll, _, _, _, _>(mode.id, &mut ctx).await,
        }
    }
}

/// Run one mode through its lifecycle
async fn drive<T, M, D, C, P>(id: &str, ctx: &mut ModeContext<'_, M, D, C, P>) -> ModeExit
where
    T: Mode,
    M: RawMutex,
    D: Display,
    C: Connectivity,
    P: Platform,
{
    let mut mode = match T::setup(ctx) {
        Ok(mode) => mode,
        Err(e) => {
            log_error!("Mode '{}' setup failed: {:?}", id, e);
            return ModeExit::SetupFailed;
        }
    };

    let outcome = mode.run(ctx).await;
    if let Err(e) = mode.restore(ctx).await {
        log_warn!("Mode '{}' restore failed: {:?}", id, e);
    }

    match outcome {
        Ok(()) => {
            log_info!("Mode '{}' finished", id);
            ModeExit::Finished
        }
        Err(ModeError::Cancelled) => ModeExit::Cancelled,
        Err(e) => {
            log_error!("Mode '{}' stopped: {:?}", id, e);
            ModeExit::Finished
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::SlotState;
    use crate::testing::{orchestrator, run_device, settle, MockDisplay, MockLink, MockPlatform};
    use crate::traits::{LinkState, PowerMode};

    #[test]
    fn test_registry_has_every_mode() {
        let registry = registry().unwrap();
        assert_eq!(registry.len(), ModeKind::ALL.len());
        for kind in ModeKind::ALL {
            let desc = registry.lookup(kind.id()).unwrap();
            assert_eq!(desc.factory, kind);
        }
        assert_eq!(
            registry.lookup("idle").unwrap().category,
            Category::Connected
        );
        assert_eq!(
            registry.lookup("dvd_bounce").unwrap().category,
            Category::Exclusive
        );
    }

    #[test]
    fn test_idle_restores_on_cancel() {
        let orch = orchestrator();
        let display = MockDisplay::new();
        let link = MockLink::new(LinkState::Connected);

        run_device(&orch, &display, &link, async {
            assert!(orch.switch_mode("idle").await);
            settle(8).await;
            {
                let screen = display.screen.borrow();
                assert!(screen.asleep);
                assert!(!screen.backlight);
            }
            assert_eq!(link.power.get(), Some(PowerMode::PowerSave));

            assert!(orch.switch_mode("test").await);
            // Radio is back in performance mode before the next mode starts
            assert_eq!(link.power.get(), Some(PowerMode::Performance));
        });

        let screen = display.screen.borrow();
        assert!(!screen.asleep);
        assert!(screen.backlight);
        assert_eq!(link.power.get(), Some(PowerMode::Performance));
    }

    #[test]
    fn test_same_id_runs_setup_again() {
        let orch = orchestrator();
        let display = MockDisplay::new();
        let link = MockLink::new(LinkState::Connected);

        run_device(&orch, &display, &link, async {
            assert!(orch.switch_mode("status").await);
            settle(4).await;
            let clears = display.screen.borrow().clears;
            assert!(orch.switch_mode("status").await);
            settle(4).await;
            assert_eq!(display.screen.borrow().clears, clears + 1);
            assert_eq!(orch.active_mode(), Some("status"));
        });
    }

    #[test]
    fn test_setup_failure_leaves_slot_empty() {
        let orch = orchestrator();
        let display = MockDisplay::new();
        let link = MockLink::new(LinkState::Connected);

        run_device(&orch, &display, &link, async {
            display.screen.borrow_mut().fail = true;
            assert!(orch.switch_mode("status").await);
            settle(2).await;
            assert_eq!(orch.slot_state(), SlotState::Empty);

            display.screen.borrow_mut().fail = false;
            assert!(orch.switch_mode("dvd_bounce").await);
            assert_eq!(orch.active_mode(), Some("dvd_bounce"));
        });
    }

    #[test]
    fn test_test_card_finishes() {
        let orch = orchestrator();
        let display = MockDisplay::new();
        let link = MockLink::new(LinkState::Idle);

        run_device(&orch, &display, &link, async {
            assert!(orch.switch_mode("test").await);
            settle(2).await;
            assert_eq!(orch.slot_state(), SlotState::Finished);
        });
        assert!(display.has_text("Once more, forever."));
    }

    #[test]
    fn test_idle_setup_failure_wakes_panel() {
        let orch = orchestrator();
        let display = MockDisplay::new();
        let link = MockLink::new(LinkState::Connected);

        run_device(&orch, &display, &link, async {
            display.screen.borrow_mut().fail_once = Some("backlight_off");
            assert!(orch.switch_mode("idle").await);
            settle(4).await;
            assert_eq!(orch.slot_state(), SlotState::Empty);

            assert!(orch.switch_mode("dvd_bounce").await);
            settle(2).await;
            assert_eq!(orch.active_mode(), Some("dvd_bounce"));
        });

        let screen = display.screen.borrow();
        assert!(!screen.asleep);
        assert!(screen.backlight);
        assert_eq!(link.power.get(), None);
    }

    #[test]
    fn test_only_connected_modes_get_link() {
        let link = MockLink::new(LinkState::Connected);
        let launcher = DeviceLauncher::new(
            MockDisplay::new(),
            &link,
            MockPlatform::new(),
            FetchConfig::default(),
        );
        let registry = registry().unwrap();

        for desc in registry.iter() {
            let connected = desc.category == Category::Connected;
            assert_eq!(launcher.link_for(desc.category).is_some(), connected, "{}", desc.id);
        }
        assert!(launcher.link_for(Category::Exclusive).is_none());
    }

    #[test]
    fn test_every_mode_starts() {
        let registry = registry().unwrap();
        for desc in registry.iter() {
            let orch = orchestrator();
            let display = MockDisplay::new();
            let link = MockLink::new(LinkState::Connected);

            run_device(&orch, &display, &link, async {
                assert!(orch.switch_mode(desc.id).await);
                settle(2).await;
                assert_ne!(orch.slot_state(), SlotState::Empty, "{} failed setup", desc.id);
            });

            if desc.category == Category::Exclusive {
                assert!(link.requests.borrow().is_empty(), "{} used the link", desc.id);
                assert_eq!(link.power.get(), None, "{} changed radio power", desc.id);
            }
        }
    }
}
