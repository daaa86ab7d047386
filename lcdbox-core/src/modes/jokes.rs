//! Jokes fetched from a public joke API.

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::String;
use serde::Deserialize;

use super::{Mode, ModeContext, ModeError};
use crate::log::{log_debug, log_warn};
use crate::text::wrap;
use crate::traits::{Color, Connectivity, Display, Font, LinkState, Platform};

const FONT: Font = Font::Large;
const X_OFFSET: u16 = 5;
const Y_OFFSET: u16 = 5;
/// Distance between rows
const Y_DISTANCE: u16 = 22;
const COLUMNS: usize = ((320 - X_OFFSET * 2) / FONT.char_size().0) as usize;
const ROWS: u16 = (240 - Y_OFFSET * 2) / Y_DISTANCE;

const UPDATE_MS: u32 = 15_000;
const OFFLINE_RETRY_MS: u32 = 60_000;

const BODY_CAP: usize = 2048;
/// Longest joke part kept
const TEXT_CAP: usize = 320;

type Text = String<TEXT_CAP>;

/// A joke as the API delivers it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Joke {
    Single(Text),
    TwoPart { setup: Text, delivery: Text },
}

#[derive(Deserialize)]
struct Reply {
    #[serde(rename = "type")]
    kind: String<16>,
    joke: Option<Text>,
    setup: Option<Text>,
    delivery: Option<Text>,
}

/// Parse a joke API response body
///
/// `scratch` must hold the longest string field once unescaped.
pub fn parse_joke(body: &[u8], scratch: &mut [u8]) -> Option<Joke> {
    let (reply, _): (Reply, usize) = serde_json_core::from_slice_escaped(body, scratch).ok()?;
    match reply.kind.as_str() {
        "single" => reply.joke.map(Joke::Single),
        "twopart" => Some(Joke::TwoPart {
            setup: reply.setup?,
            delivery: reply.delivery?,
        }),
        _ => None,
    }
}

/// Draw `text` word-wrapped from `row`; returns the rows used
fn write_text<D: Display>(display: &mut D, row: u16, text: &str) -> Result<u16, ModeError> {
    let mut flat = Text::new();
    for ch in text.chars() {
        let ch = if ch == '\n' { ' ' } else { ch };
        if flat.push(ch).is_err() {
            break;
        }
    }

    let mut current = row;
    for line in wrap(&flat, COLUMNS) {
        if current >= ROWS {
            break;
        }
        display.draw_text(
            X_OFFSET,
            Y_OFFSET + current * Y_DISTANCE,
            line,
            FONT,
            Color::WHITE,
            Color::BLACK,
        )?;
        current += 1;
    }
    Ok(current - row)
}

pub struct Jokes {
    /// Whether the last check found the link up
    online: bool,
}

impl Jokes {
    fn show<D: Display>(display: &mut D, joke: &Joke) -> Result<(), ModeError> {
        display.clear(Color::BLACK)?;
        match joke {
            Joke::Single(text) => {
                write_text(display, 0, text)?;
            }
            Joke::TwoPart { setup, delivery } => {
                let rows = write_text(display, 0, setup)?;
                write_text(display, rows + 2, delivery)?;
            }
        }
        Ok(())
    }
}

impl Mode for Jokes {
    fn setup<M, D, C, P>(ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<Self, ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        ctx.link()?;
        ctx.display.clear(Color::BLACK)?;
        Ok(Jokes { online: true })
    }

    async fn run<M, D, C, P>(&mut self, ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<(), ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        let link = ctx.link()?;
        let fetch = ctx.fetch;
        let mut body = [0u8; BODY_CAP];
        let mut scratch = [0u8; TEXT_CAP];

        loop {
            if link.state() != LinkState::Connected {
                if self.online {
                    ctx.display.clear(Color::BLACK)?;
                    ctx.display.draw_text(
                        X_OFFSET,
                        Y_OFFSET,
                        "WiFi not connected",
                        FONT,
                        Color::RED,
                        Color::BLACK,
                    )?;
                    self.online = false;
                }
                ctx.sleep_ms(OFFLINE_RETRY_MS).await?;
                continue;
            }

            match ctx.fetch(&fetch.jokes_host, &fetch.jokes_path, &mut body).await? {
                Ok(reply) => match parse_joke(reply, &mut scratch) {
                    Some(joke) => {
                        log_debug!("Joke received ({} bytes)", reply.len());
                        Self::show(&mut *ctx.display, &joke)?;
                    }
                    None => log_warn!("Joke response not understood"),
                },
                Err(e) => log_warn!("Joke request failed: {:?}", e),
            }

            self.online = true;
            ctx.sleep_ms(UPDATE_MS).await?;
        }
    }
}
