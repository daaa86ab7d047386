//! Blank screen with the panel, backlight and radio powered down.

use embassy_sync::blocking_mutex::raw::RawMutex;

use super::{Mode, ModeContext, ModeError};
use crate::traits::{Color, Connectivity, Display, Platform, PowerMode};

const WAKE_CHECK_MS: u32 = 100_000;

pub struct Idle;

impl Mode for Idle {
    fn setup<M, D, C, P>(ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<Self, ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        ctx.link()?;
        ctx.display.clear(Color::BLACK)?;
        ctx.display.set_sleep(true)?;
        if let Err(e) = ctx.display.set_backlight(false) {
            // Panel must be awake for whatever runs next
            let _ = ctx.display.set_sleep(false);
            return Err(e.into());
        }
        Ok(Idle)
    }

    async fn run<M, D, C, P>(&mut self, ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<(), ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        ctx.link()?.set_power_mode(PowerMode::PowerSave).await;
        loop {
            ctx.sleep_ms(WAKE_CHECK_MS).await?;
        }
    }

    async fn restore<M, D, C, P>(&mut self, ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<(), ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        ctx.link()?.set_power_mode(PowerMode::Performance).await;
        let woken = ctx.display.set_sleep(false);
        let lit = ctx.display.set_backlight(true);
        woken.and(lit)?;
        Ok(())
    }
}
