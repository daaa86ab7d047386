//! Device status readout: uptime, core temperature, system, Wi-Fi.

use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::String;

use super::{Mode, ModeContext, ModeError};
use crate::traits::{Color, Connectivity, Display, Font, LinkState, Platform};

const FONT: Font = Font::Large;
const X_OFFSET: u16 = 15;
const Y_OFFSET: u16 = 15;
/// Distance between rows
const Y_DISTANCE: u16 = 40;
/// Values start after the longest label ("System: ")
const VALUE_X: u16 = X_OFFSET + FONT.text_width(8);
/// Fields are padded to this many characters so shorter values erase longer ones
const FIELD_CHARS: usize = 16;
const UPDATE_MS: u32 = 5_000;

const LABELS: [&str; 4] = ["Uptime:", "Temp:", "System:", "WiFi:"];
const ROW_UPTIME: u16 = 0;
const ROW_TEMP: u16 = 1;
const ROW_SYSTEM: u16 = 2;
const ROW_WIFI: u16 = 3;

type Field = String<24>;

/// Format milliseconds since boot as `[Nd ]HH:MM:SS`
pub fn format_uptime(ms: u64) -> Field {
    let secs = ms / 1000;
    let (days, h, m, s) = (secs / 86_400, secs / 3600 % 24, secs / 60 % 60, secs % 60);
    let mut out = Field::new();
    if days > 0 {
        let _ = write!(out, "{}d ", days);
    }
    let _ = write!(out, "{:02}:{:02}:{:02}", h, m, s);
    out
}

/// Format a 0.1°C reading as `27.1 C`
pub fn format_temperature(c_x10: Option<i16>) -> Field {
    let mut out = Field::new();
    match c_x10 {
        Some(t) => {
            let sign = if t < 0 { "-" } else { "" };
            let abs = t.unsigned_abs();
            let _ = write!(out, "{}{}.{} C", sign, abs / 10, abs % 10);
        }
        None => {
            let _ = out.push_str("n/a");
        }
    }
    out
}

/// Wi-Fi field text and colour for a link state
pub fn wifi_label(state: LinkState) -> (&'static str, Color) {
    match state {
        LinkState::Connected => ("Yes", Color::GREEN),
        LinkState::Connecting => ("Connecting...", Color::YELLOW),
        LinkState::Idle | LinkState::Failed => ("No", Color::RED),
    }
}

pub struct Status {
    uptime: Field,
    temperature: Option<Option<i16>>,
    wifi: Option<LinkState>,
}

impl Status {
    fn draw_field<D: Display>(display: &mut D, row: u16, text: &str, color: Color) -> Result<(), ModeError> {
        let mut padded = Field::new();
        let _ = write!(padded, "{:<width$}", text, width = FIELD_CHARS);
        display.draw_text(
            VALUE_X,
            Y_OFFSET + row * Y_DISTANCE,
            &padded,
            FONT,
            color,
            Color::BLACK,
        )?;
        Ok(())
    }
}

impl Mode for Status {
    fn setup<M, D, C, P>(ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<Self, ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        ctx.link()?;
        ctx.display.clear(Color::BLACK)?;
        for (row, label) in (0u16..).zip(LABELS) {
            ctx.display.draw_text(
                X_OFFSET,
                Y_OFFSET + row * Y_DISTANCE,
                label,
                FONT,
                Color::WHITE,
                Color::BLACK,
            )?;
        }
        let info = ctx.platform.system_info();
        Self::draw_field(&mut *ctx.display, ROW_SYSTEM, info, Color::WHITE)?;

        Ok(Status {
            uptime: Field::new(),
            temperature: None,
            wifi: None,
        })
    }

    async fn run<M, D, C, P>(&mut self, ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<(), ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        let link = ctx.link()?;
        loop {
            let uptime = format_uptime(ctx.platform.uptime_ms());
            if uptime != self.uptime {
                Self::draw_field(&mut *ctx.display, ROW_UPTIME, &uptime, Color::WHITE)?;
                self.uptime = uptime;
            }

            let temperature = ctx.platform.temperature_c_x10().await;
            if self.temperature != Some(temperature) {
                let text = format_temperature(temperature);
                Self::draw_field(&mut *ctx.display, ROW_TEMP, &text, Color::WHITE)?;
                self.temperature = Some(temperature);
            }

            let state = link.state();
            if self.wifi != Some(state) {
                let (text, color) = wifi_label(state);
                Self::draw_field(&mut *ctx.display, ROW_WIFI, text, color)?;
                self.wifi = Some(state);
            }

            ctx.sleep_ms(UPDATE_MS).await?;
        }
    }
}
