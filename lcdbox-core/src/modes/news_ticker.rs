//! Headline crawling across the screen using the panel's hardware scroll.

use embassy_sync::blocking_mutex::raw::RawMutex;

use super::{Mode, ModeContext, ModeError};
use crate::traits::{Color, Connectivity, Display, Font, Platform};

const HEADLINE: &str = "FLORIDA MAN";
const STEP_MS: u32 = 50;

pub struct NewsTicker {
    offset: u16,
    width: u16,
}

impl NewsTicker {
    /// Next scroll offset; counts down from the screen width and wraps
    fn advance(&mut self) -> u16 {
        self.offset -= 1;
        if self.offset == 0 {
            self.offset = self.width;
        }
        self.offset
    }
}

impl Mode for NewsTicker {
    fn setup<M, D, C, P>(ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<Self, ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        let width = ctx.display.size().0.max(1);
        ctx.display.clear(Color::BLACK)?;
        ctx.display
            .draw_text(10, 10, HEADLINE, Font::Large, Color::WHITE, Color::BLACK)?;
        Ok(NewsTicker {
            offset: width,
            width,
        })
    }

    async fn run<M, D, C, P>(&mut self, ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<(), ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        loop {
            let offset = self.advance();
            ctx.display.scroll(offset)?;
            ctx.sleep_ms(STEP_MS).await?;
        }
    }

    async fn restore<M, D, C, P>(&mut self, ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<(), ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        ctx.display.scroll(0)?;
        Ok(())
    }
}
