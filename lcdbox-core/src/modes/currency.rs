//! USD exchange rates for a handful of currencies and commodities.

use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::String;
use serde::Deserialize;

use super::{Mode, ModeContext, ModeError};
use crate::config::MAX_PATH_LEN;
use crate::log::{log_debug, log_warn};
use crate::traits::{Color, Connectivity, Display, Font, LinkState, Platform};

const FONT: Font = Font::Large;
const INFO_FONT: Font = Font::Small;
const X_OFFSET: u16 = 13;
const Y_OFFSET: u16 = 18;
/// Distance between rows
const Y_DISTANCE: u16 = 40;
const PRICE_X: u16 = X_OFFSET + FONT.text_width(4);
const PRICE_CHARS: usize = 14;
const INFO_Y: u16 = Y_OFFSET + ASSETS.len() as u16 * Y_DISTANCE;
const OFFLINE_X: u16 = X_OFFSET + INFO_FONT.text_width(INFO_TEXT.len() + 4);

const INFO_TEXT: &str = "Prices listed in USD";
const OFFLINE_TEXT: &str = "(Offline)";
const UPDATE_MS: u32 = 5 * 60 * 1000;
const BODY_CAP: usize = 1024;

/// A tracked asset: rate-API id, ticker and ticker colour
#[derive(Debug, Clone, Copy)]
pub struct Asset {
    pub id: &'static str,
    pub ticker: &'static str,
    pub color: Color,
}

pub const ASSETS: [Asset; 5] = [
    Asset {
        id: "australian-dollar",
        ticker: "AUD",
        color: Color::rgb(0, 106, 49),
    },
    Asset {
        id: "bitcoin",
        ticker: "BTC",
        color: Color::rgb(247, 147, 26),
    },
    Asset {
        id: "litecoin",
        ticker: "LTC",
        color: Color::rgb(248, 252, 254),
    },
    Asset {
        id: "gold-ounce",
        ticker: "XAU",
        color: Color::rgb(255, 255, 0),
    },
    Asset {
        id: "monero",
        ticker: "XMR",
        color: Color::rgb(242, 104, 34),
    },
];

type Price = String<24>;

#[derive(Deserialize)]
struct RateReply {
    data: Rate,
}

#[derive(Deserialize)]
struct Rate {
    #[serde(rename = "rateUsd")]
    rate_usd: String<32>,
}

/// Extract `data.rateUsd` from a rate API response and format it as `$1234.57`
pub fn parse_price(body: &[u8], scratch: &mut [u8]) -> Option<Price> {
    let (reply, _): (RateReply, usize) = serde_json_core::from_slice_escaped(body, scratch).ok()?;
    let rate: f64 = reply.data.rate_usd.trim().parse().ok()?;
    if !rate.is_finite() {
        return None;
    }
    let mut out = Price::new();
    write!(out, "${:.2}", rate).ok()?;
    Some(out)
}

pub struct CurrencyTracker {
    /// Whether the offline marker is on screen
    offline_shown: bool,
}

impl Mode for CurrencyTracker {
    fn setup<M, D, C, P>(ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<Self, ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        ctx.link()?;
        ctx.display.clear(Color::BLACK)?;
        for (row, asset) in (0u16..).zip(ASSETS.iter()) {
            ctx.display.draw_text(
                X_OFFSET,
                Y_OFFSET + row * Y_DISTANCE,
                asset.ticker,
                FONT,
                asset.color,
                Color::BLACK,
            )?;
        }
        ctx.display
            .draw_text(X_OFFSET, INFO_Y, INFO_TEXT, INFO_FONT, Color::WHITE, Color::BLACK)?;
        Ok(CurrencyTracker {
            offline_shown: false,
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
        let fetch = ctx.fetch;
        let mut body = [0u8; BODY_CAP];
        let mut scratch = [0u8; 64];

        loop {
            if link.state() != LinkState::Connected {
                if !self.offline_shown {
                    ctx.display.draw_text(
                        OFFLINE_X,
                        INFO_Y,
                        OFFLINE_TEXT,
                        INFO_FONT,
                        Color::RED,
                        Color::BLACK,
                    )?;
                    self.offline_shown = true;
                }
                ctx.sleep_ms(UPDATE_MS).await?;
                continue;
            }

            if self.offline_shown {
                let (_, height) = INFO_FONT.char_size();
                ctx.display.fill_rect(
                    OFFLINE_X,
                    INFO_Y,
                    INFO_FONT.text_width(OFFLINE_TEXT.len()),
                    height,
                    Color::BLACK,
                )?;
                self.offline_shown = false;
            }

            for (row, asset) in (0u16..).zip(ASSETS.iter()) {
                let mut path: String<{ MAX_PATH_LEN + 32 }> = String::new();
                if path.push_str(&fetch.rates_path).is_err() || path.push_str(asset.id).is_err() {
                    log_warn!("Rate path too long for '{}'", asset.id);
                    continue;
                }

                log_debug!("Requesting rate for '{}'", asset.id);
                let reply = match ctx.fetch(&fetch.rates_host, &path, &mut body).await? {
                    Ok(reply) => reply,
                    Err(e) => {
                        log_warn!("Rate request for '{}' failed: {:?}", asset.id, e);
                        continue;
                    }
                };
                let Some(price) = parse_price(reply, &mut scratch) else {
                    log_warn!("Rate response for '{}' not understood", asset.id);
                    continue;
                };

                let mut padded = Price::new();
                let _ = write!(padded, "{:<width$}", price.as_str(), width = PRICE_CHARS);
                ctx.display.draw_text(
                    PRICE_X,
                    Y_OFFSET + row * Y_DISTANCE,
                    &padded,
                    FONT,
                    Color::WHITE,
                    Color::BLACK,
                )?;
            }

            ctx.sleep_ms(UPDATE_MS).await?;
        }
    }
}
