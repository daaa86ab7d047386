//! Host-side doubles for the collaborator traits.

use core::cell::{Cell, RefCell};
use core::future::{pending, Future};
use std::collections::VecDeque;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use embassy_futures::block_on;
use embassy_futures::select::{select, Either};
use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;

use crate::config::FetchConfig;
use crate::modes::{self, DeviceLauncher, ModeKind};
use crate::orchestrator::Orchestrator;
use crate::traits::{
    Color, Connectivity, Display, DisplayError, FetchError, Font, LinkState, Platform, PowerMode,
};

/// Everything drawn so far
#[derive(Debug)]
pub struct Screen {
    pub asleep: bool,
    pub backlight: bool,
    pub scroll: u16,
    pub clears: u32,
    pub fills: u32,
    /// Text drawn since the last clear: (x, y, text, fg)
    pub texts: Vec<(u16, u16, String, Color)>,
    pub fail: bool,
    /// Fail the next call of one operation: "scroll" or "backlight_off"
    pub fail_once: Option<&'static str>,
}

/// Recording display; clones share one screen
#[derive(Clone)]
pub struct MockDisplay {
    pub screen: Rc<RefCell<Screen>>,
}

impl MockDisplay {
    pub fn new() -> Self {
        Self {
            screen: Rc::new(RefCell::new(Screen {
                asleep: false,
                backlight: true,
                scroll: 0,
                clears: 0,
                fills: 0,
                texts: Vec::new(),
                fail: false,
                fail_once: None,
            })),
        }
    }

    pub fn has_text(&self, needle: &str) -> bool {
        self.screen
            .borrow()
            .texts
            .iter()
            .any(|(_, _, text, _)| text.contains(needle))
    }

    pub fn text_color(&self, needle: &str) -> Option<Color> {
        self.screen
            .borrow()
            .texts
            .iter()
            .rev()
            .find(|(_, _, text, _)| text.contains(needle))
            .map(|(_, _, _, color)| *color)
    }

    fn check(&self) -> Result<(), DisplayError> {
        if self.screen.borrow().fail {
            Err(DisplayError::Communication)
        } else {
            Ok(())
        }
    }

    fn check_once(&self, op: &str) -> Result<(), DisplayError> {
        self.check()?;
        let mut screen = self.screen.borrow_mut();
        if screen.fail_once == Some(op) {
            screen.fail_once = None;
            return Err(DisplayError::Communication);
        }
        Ok(())
    }
}

impl Display for MockDisplay {
    fn size(&self) -> (u16, u16) {
        (320, 240)
    }

    fn clear(&mut self, _color: Color) -> Result<(), DisplayError> {
        self.check()?;
        let mut screen = self.screen.borrow_mut();
        screen.clears += 1;
        screen.texts.clear();
        Ok(())
    }

    fn fill_rect(
        &mut self,
        _x: u16,
        _y: u16,
        _width: u16,
        _height: u16,
        _color: Color,
    ) -> Result<(), DisplayError> {
        self.check()?;
        self.screen.borrow_mut().fills += 1;
        Ok(())
    }

    fn draw_text(
        &mut self,
        x: u16,
        y: u16,
        text: &str,
        _font: Font,
        fg: Color,
        _bg: Color,
    ) -> Result<(), DisplayError> {
        self.check()?;
        self.screen
            .borrow_mut()
            .texts
            .push((x, y, text.to_string(), fg));
        Ok(())
    }

    fn scroll(&mut self, offset: u16) -> Result<(), DisplayError> {
        self.check_once("scroll")?;
        self.screen.borrow_mut().scroll = offset;
        Ok(())
    }

    fn set_sleep(&mut self, asleep: bool) -> Result<(), DisplayError> {
        self.check()?;
        self.screen.borrow_mut().asleep = asleep;
        Ok(())
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError> {
        if on {
            self.check()?;
        } else {
            self.check_once("backlight_off")?;
        }
        self.screen.borrow_mut().backlight = on;
        Ok(())
    }
}

/// Scripted answer to one request
pub enum MockReply {
    Body(Vec<u8>),
    Error(FetchError),
    /// Never answers
    Stall,
}

/// Turns the mock radio takes to apply a power-mode change
const POWER_CHANGE_TURNS: usize = 3;

/// Scripted wireless link
pub struct MockLink {
    pub state: Cell<LinkState>,
    /// Power mode the radio has applied
    pub power: Cell<Option<PowerMode>>,
    pub responses: RefCell<VecDeque<MockReply>>,
    /// "host path" of every request made
    pub requests: RefCell<Vec<String>>,
}

impl MockLink {
    pub fn new(state: LinkState) -> Self {
        Self {
            state: Cell::new(state),
            power: Cell::new(None),
            responses: RefCell::new(VecDeque::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn push_body(&self, body: &str) {
        self.responses
            .borrow_mut()
            .push_back(MockReply::Body(body.as_bytes().to_vec()));
    }

    pub fn push_error(&self, error: FetchError) {
        self.responses.borrow_mut().push_back(MockReply::Error(error));
    }

    pub fn push_stall(&self) {
        self.responses.borrow_mut().push_back(MockReply::Stall);
    }
}

impl Connectivity for MockLink {
    fn state(&self) -> LinkState {
        self.state.get()
    }

    async fn set_power_mode(&self, mode: PowerMode) {
        for _ in 0..POWER_CHANGE_TURNS {
            yield_now().await;
        }
        self.power.set(Some(mode));
    }

    async fn http_get<'b>(
        &self,
        host: &str,
        path: &str,
        buf: &'b mut [u8],
    ) -> Result<&'b [u8], FetchError> {
        self.requests.borrow_mut().push(format!("{host} {path}"));
        yield_now().await;
        let next = self.responses.borrow_mut().pop_front();
        match next {
            Some(MockReply::Body(body)) => {
                let len = body.len().min(buf.len());
                buf[..len].copy_from_slice(&body[..len]);
                Ok(&buf[..len])
            }
            Some(MockReply::Error(e)) => Err(e),
            Some(MockReply::Stall) => pending().await,
            None => Err(FetchError::Connect),
        }
    }
}

/// Virtual clock; every delay yields once to the executor
pub struct MockPlatform {
    pub now_ms: u64,
    pub seed: u32,
    pub temperature: Option<i16>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            seed: 0x1234_5678,
            temperature: Some(271),
        }
    }
}

impl Platform for MockPlatform {
    async fn delay_ms(&mut self, ms: u32) {
        self.now_ms += u64::from(ms);
        yield_now().await;
    }

    fn uptime_ms(&self) -> u64 {
        self.now_ms
    }

    fn random_u32(&mut self) -> u32 {
        // xorshift32
        let mut x = self.seed;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.seed = x;
        x
    }

    async fn temperature_c_x10(&mut self) -> Option<i16> {
        self.temperature
    }

    fn system_info(&self) -> &'static str {
        "test-board"
    }
}

pub type TestOrchestrator = Orchestrator<NoopRawMutex, ModeKind>;

pub fn orchestrator() -> TestOrchestrator {
    Orchestrator::new(modes::registry().unwrap())
}

/// Run `body` with the real modes driving mock hardware
pub fn run_device<F: Future>(
    orch: &TestOrchestrator,
    display: &MockDisplay,
    link: &MockLink,
    body: F,
) -> F::Output {
    let mut launcher = DeviceLauncher::new(
        display.clone(),
        link,
        MockPlatform::new(),
        FetchConfig::default(),
    );
    block_on(async {
        match select(orch.run_slot(&mut launcher), body).await {
            Either::First(_) => unreachable!(),
            Either::Second(output) => output,
        }
    })
}

/// Give the running mode `turns` scheduler turns
pub async fn settle(turns: usize) {
    for _ in 0..turns {
        yield_now().await;
    }
}
