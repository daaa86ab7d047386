//! Display trait
//!
//! Defines the drawing surface handed to modes.

use embedded_graphics::mono_font::{ascii, MonoFont};

/// Display errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Communication error with display
    Communication,
    /// Invalid coordinates or dimensions
    InvalidCoordinates,
    /// Display not initialized
    NotInitialized,
}

/// RGB565 color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Color(pub u16);

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);

    /// Pack 8-bit channels into RGB565
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color((((r as u16) & 0xF8) << 8) | (((g as u16) & 0xFC) << 3) | ((b as u16) >> 3))
    }

    /// Raw RGB565 value
    pub const fn raw(self) -> u16 {
        self.0
    }
}

/// Fixed-width text fonts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Font {
    /// 6x10 cells
    Small,
    /// 8x13 cells
    Medium,
    /// 10x20 cells
    Large,
}

impl Font {
    /// Character cell size in pixels as (width, height)
    pub const fn char_size(self) -> (u16, u16) {
        match self {
            Font::Small => (6, 10),
            Font::Medium => (8, 13),
            Font::Large => (10, 20),
        }
    }

    /// Width in pixels of `chars` characters
    pub const fn text_width(self, chars: usize) -> u16 {
        self.char_size().0 * chars as u16
    }

    pub(crate) fn mono(self) -> &'static MonoFont<'static> {
        match self {
            Font::Small => &ascii::FONT_6X10,
            Font::Medium => &ascii::FONT_8X13,
            Font::Large => &ascii::FONT_10X20,
        }
    }
}

/// Drawing surface owned by the running mode
///
/// Coordinates are in pixels with the origin at the top left of the
/// current orientation.
pub trait Display {
    /// Width and height in pixels
    fn size(&self) -> (u16, u16);

    /// Fill the whole screen with `color`
    fn clear(&mut self, color: Color) -> Result<(), DisplayError>;

    /// Fill a rectangle; the area is clipped to the screen
    fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        color: Color,
    ) -> Result<(), DisplayError>;

    /// Draw text with its top-left corner at (`x`, `y`)
    ///
    /// Glyph cells are painted with `bg`, so redrawing a field overwrites it.
    fn draw_text(
        &mut self,
        x: u16,
        y: u16,
        text: &str,
        font: Font,
        fg: Color,
        bg: Color,
    ) -> Result<(), DisplayError>;

    /// Set the hardware scroll offset along the scroll axis
    fn scroll(&mut self, offset: u16) -> Result<(), DisplayError>;

    /// Put the panel to sleep or wake it
    fn set_sleep(&mut self, asleep: bool) -> Result<(), DisplayError>;

    /// Switch the backlight
    fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError>;
}
