//! Static test card for checking fonts and colours.

use embassy_sync::blocking_mutex::raw::RawMutex;

use super::{Mode, ModeContext, ModeError};
use crate::traits::{Color, Connectivity, Display, Font, Platform};

const CAPTION: &str = "Once more, forever.";
const BARS: [Color; 8] = [
    Color::WHITE,
    Color::YELLOW,
    Color::CYAN,
    Color::GREEN,
    Color::MAGENTA,
    Color::RED,
    Color::BLUE,
    Color::BLACK,
];
const BAR_HEIGHT: u16 = 60;

pub struct TestCard;

impl Mode for TestCard {
    fn setup<M, D, C, P>(ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<Self, ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        ctx.display.clear(Color::BLACK)?;
        Ok(TestCard)
    }

    async fn run<M, D, C, P>(&mut self, ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<(), ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        let (width, height) = ctx.display.size();
        let bar_width = width / BARS.len() as u16;
        let bar_y = height.saturating_sub(BAR_HEIGHT);
        for (i, color) in (0u16..).zip(BARS) {
            ctx.display
                .fill_rect(i * bar_width, bar_y, bar_width, BAR_HEIGHT, color)?;
        }

        let mut y = 10;
        for font in [Font::Small, Font::Medium, Font::Large] {
            ctx.display
                .draw_text(10, y, "B", font, Color::WHITE, Color::BLACK)?;
            ctx.display
                .draw_text(40, y, CAPTION, font, Color::WHITE, Color::BLACK)?;
            y += font.char_size().1 + 10;
        }
        Ok(())
    }
}
