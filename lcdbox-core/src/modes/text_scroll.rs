//! Typewriter-style prose, one character at a time.

use embassy_sync::blocking_mutex::raw::RawMutex;

use super::{Mode, ModeContext, ModeError};
use crate::text::wrap;
use crate::traits::{Color, Connectivity, Display, Font, Platform};

const TEXT: &str = include_str!("passages.txt");

const FONT: Font = Font::Medium;
const CHAR_WIDTH: u16 = FONT.char_size().0;
const X_OFFSET: u16 = 8;
const Y_OFFSET: u16 = 8;
/// Distance between lines
const Y_DISTANCE: u16 = 14;
const COLUMNS: usize = ((320 - X_OFFSET * 2) / CHAR_WIDTH) as usize;
const MAX_LINES: u16 = (240 - Y_OFFSET) / Y_DISTANCE;

const CHARACTER_DELAY_MS: u32 = 100;
/// Commas, semicolons and colons
const SHORT_PAUSE_MS: u32 = 250;
/// Full stops
const LONG_PAUSE_MS: u32 = 500;
const END_PAGE_DELAY_MS: u32 = 5_000;
const NEW_PAGE_DELAY_MS: u32 = 1_000;
const END_TEXT_DELAY_MS: u32 = 5_000;

const HIGHLIGHT: &str = "Chapter";

/// Pause after typing `ch`
pub fn char_delay(ch: char) -> u32 {
    match ch {
        '.' => LONG_PAUSE_MS,
        ',' | ';' | ':' => SHORT_PAUSE_MS,
        _ => CHARACTER_DELAY_MS,
    }
}

/// Whether `word` belongs to a chapter heading given the word before it
pub fn is_heading(word: &str, previous: Option<&str>) -> bool {
    word == HIGHLIGHT || previous == Some(HIGHLIGHT)
}

fn passages() -> impl Iterator<Item = &'static str> {
    TEXT.lines().map(str::trim).filter(|p| !p.is_empty())
}

pub struct TextScroll {
    row: u16,
}

impl TextScroll {
    async fn next_page<M, D, C, P>(&mut self, ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<(), ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        ctx.sleep_ms(END_PAGE_DELAY_MS).await?;
        let (width, height) = ctx.display.size();
        ctx.display.fill_rect(
            X_OFFSET,
            Y_OFFSET,
            width.saturating_sub(2 * X_OFFSET),
            height.saturating_sub(2 * Y_OFFSET),
            Color::BLACK,
        )?;
        self.row = 0;
        ctx.sleep_ms(NEW_PAGE_DELAY_MS).await?;
        Ok(())
    }

    async fn type_line<M, D, C, P>(&mut self, ctx: &mut ModeContext<'_, M, D, C, P>, line: &str) -> Result<(), ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        let y = Y_OFFSET + self.row * Y_DISTANCE;
        let mut col: u16 = 0;
        let mut previous = None;
        for word in line.split(' ') {
            let color = if is_heading(word, previous) {
                Color::RED
            } else {
                Color::WHITE
            };
            let lead = if previous.is_some() { " " } else { "" };
            for ch in lead.chars().chain(word.chars()) {
                let mut utf8 = [0u8; 4];
                let glyph = ch.encode_utf8(&mut utf8);
                ctx.display
                    .draw_text(X_OFFSET + col * CHAR_WIDTH, y, glyph, FONT, color, Color::BLACK)?;
                col += 1;
                ctx.sleep_ms(char_delay(ch)).await?;
            }
            previous = Some(word);
        }
        self.row += 1;
        Ok(())
    }
}

impl Mode for TextScroll {
    fn setup<M, D, C, P>(ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<Self, ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        if passages().next().is_none() {
            return Err(ModeError::Setup);
        }
        ctx.display.clear(Color::BLACK)?;
        Ok(TextScroll { row: 0 })
    }

    async fn run<M, D, C, P>(&mut self, ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<(), ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        loop {
            for passage in passages() {
                let lines = wrap(passage, COLUMNS).count() as u16;
                if self.row > 0 && self.row + lines > MAX_LINES {
                    self.next_page(ctx).await?;
                }
                for line in wrap(passage, COLUMNS) {
                    if self.row >= MAX_LINES {
                        self.next_page(ctx).await?;
                    }
                    self.type_line(ctx, line).await?;
                }
                // Blank line between passages
                self.row += 1;
            }

            ctx.sleep_ms(END_TEXT_DELAY_MS).await?;
            ctx.display.clear(Color::BLACK)?;
            self.row = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{orchestrator, run_device, settle, MockDisplay, MockLink};
    use crate::traits::LinkState;

    #[test]
    fn test_layout_constants() {
        assert_eq!(COLUMNS, 38);
        assert_eq!(MAX_LINES, 16);
    }

    #[test]
    fn test_punctuation_delays() {
        assert_eq!(char_delay('a'), 100);
        assert_eq!(char_delay(','), 250);
        assert_eq!(char_delay(':'), 250);
        assert_eq!(char_delay('.'), 500);
    }

    #[test]
    fn test_heading_words() {
        assert!(is_heading("Chapter", None));
        assert!(is_heading("Two", Some("Chapter")));
        assert!(!is_heading("Two", Some("the")));
        assert!(!is_heading("chapter", None));
    }

    #[test]
    fn test_passages_fit_on_a_page() {
        for passage in passages() {
            assert!(wrap(passage, COLUMNS).count() as u16 <= MAX_LINES);
            for line in wrap(passage, COLUMNS) {
                assert!(line.chars().count() <= COLUMNS);
            }
        }
    }

    #[test]
    fn test_types_heading_in_red() {
        let orch = orchestrator();
        let display = MockDisplay::new();
        let link = MockLink::new(LinkState::Idle);

        run_device(&orch, &display, &link, async {
            assert!(orch.switch_mode("text_scroll").await);
            settle(40).await;
        });

        let screen = display.screen.borrow();
        let typed: std::string::String = screen.texts.iter().map(|(_, _, t, _)| t.as_str()).collect();
        assert!(typed.starts_with("Chapter One"));
        assert!(screen.texts[..11].iter().all(|(_, _, _, c)| *c == Color::RED));
        // Second passage starts two rows down, in white
        let first_body = &screen.texts[11];
        assert_eq!(first_body.2, "T");
        assert_eq!(first_body.1, Y_OFFSET + 2 * Y_DISTANCE);
        assert_eq!(first_body.3, Color::WHITE);
    }
}
