//! Bouncing logo screensaver.

use embassy_sync::blocking_mutex::raw::RawMutex;

use super::{Mode, ModeContext, ModeError};
use crate::traits::{Color, Connectivity, Display, Font, Platform};

pub const LOGO_WIDTH: u16 = 86;
pub const LOGO_HEIGHT: u16 = 38;
const SPEED: i32 = 1;
/// ~30 frames per second
const FRAME_MS: u32 = 33;
const LABEL: &str = "DVD";
const LABEL_FONT: Font = Font::Large;

/// Logo colour cycles on every wall hit
const PALETTE: [Color; 6] = [
    Color::WHITE,
    Color::CYAN,
    Color::MAGENTA,
    Color::YELLOW,
    Color::GREEN,
    Color::rgb(255, 128, 0),
];

/// Screen-space rectangle as (x, y, width, height)
pub type Rect = (u16, u16, u16, u16);

/// Logo position and velocity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bouncer {
    x: i32,
    y: i32,
    prev_x: i32,
    prev_y: i32,
    dx: i32,
    dy: i32,
    width: i32,
    height: i32,
}

impl Bouncer {
    /// Centered logo; bits 0 and 1 of `random` pick the initial direction
    pub fn new(screen: (u16, u16), random: u32) -> Self {
        let width = i32::from(screen.0);
        let height = i32::from(screen.1);
        let x = width / 2 - i32::from(LOGO_WIDTH) / 2;
        let y = height / 2 - i32::from(LOGO_HEIGHT) / 2;
        Self {
            x,
            y,
            prev_x: x,
            prev_y: y,
            dx: if random & 1 == 0 { -SPEED } else { SPEED },
            dy: if random & 2 == 0 { -SPEED } else { SPEED },
            width,
            height,
        }
    }

    pub fn position(&self) -> (u16, u16) {
        (self.x.max(0) as u16, self.y.max(0) as u16)
    }

    /// Advance one frame; returns true if the logo hit a wall
    pub fn step(&mut self) -> bool {
        let (w, h) = (i32::from(LOGO_WIDTH), i32::from(LOGO_HEIGHT));
        let (old_dx, old_dy) = (self.dx, self.dy);

        if self.x + w + SPEED >= self.width {
            self.dx = -SPEED;
        } else if self.x - SPEED < 0 {
            self.dx = SPEED;
        }
        if self.y + h + SPEED >= self.height {
            self.dy = -SPEED;
        } else if self.y - SPEED <= 0 {
            self.dy = SPEED;
        }

        self.prev_x = self.x;
        self.prev_y = self.y;
        self.x += self.dx;
        self.y += self.dy;
        old_dx != self.dx || old_dy != self.dy
    }

    /// Strips the logo uncovered in the last step
    pub fn trail(&self) -> [Option<Rect>; 2] {
        let (w, h) = (LOGO_WIDTH, LOGO_HEIGHT);
        let speed = SPEED as u16;
        let horizontal = if self.prev_x > self.x {
            Some((clamp(self.x) + w, clamp(self.prev_y), speed, h))
        } else if self.prev_x < self.x {
            Some((clamp(self.prev_x), clamp(self.prev_y), speed, h))
        } else {
            None
        };
        let vertical = if self.prev_y > self.y {
            Some((clamp(self.prev_x), clamp(self.y) + h, w, speed))
        } else if self.prev_y < self.y {
            Some((clamp(self.prev_x), clamp(self.prev_y), w, speed))
        } else {
            None
        };
        [horizontal, vertical]
    }
}

fn clamp(v: i32) -> u16 {
    v.clamp(0, i32::from(u16::MAX)) as u16
}

pub struct DvdBounce {
    logo: Bouncer,
    color: usize,
}

impl DvdBounce {
    fn draw_logo<D: Display>(&self, display: &mut D) -> Result<(), ModeError> {
        let (x, y) = self.logo.position();
        let color = PALETTE[self.color];
        display.fill_rect(x, y, LOGO_WIDTH, LOGO_HEIGHT, color)?;
        let label_height = LABEL_FONT.char_size().1;
        let tx = x + (LOGO_WIDTH - LABEL_FONT.text_width(LABEL.len())) / 2;
        let ty = y + (LOGO_HEIGHT - label_height) / 2;
        display.draw_text(tx, ty, LABEL, LABEL_FONT, Color::BLACK, color)?;
        Ok(())
    }
}

impl Mode for DvdBounce {
    fn setup<M, D, C, P>(ctx: &mut ModeContext<'_, M, D, C, P>) -> Result<Self, ModeError>
    where
        M: RawMutex,
        D: Display,
        C: Connectivity,
        P: Platform,
    {
        ctx.display.clear(Color::BLACK)?;
        let random = ctx.platform.random_u32();
        Ok(DvdBounce {
            logo: Bouncer::new(ctx.display.size(), random),
            color: 0,
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
            if self.logo.step() {
                self.color = (self.color + 1) % PALETTE.len();
            }
            for (x, y, w, h) in self.logo.trail().into_iter().flatten() {
                ctx.display.fill_rect(x, y, w, h, Color::BLACK)?;
            }
            self.draw_logo(&mut *ctx.display)?;
            ctx.sleep_ms(FRAME_MS).await?;
        }
    }
}
