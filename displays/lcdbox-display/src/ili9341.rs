//! ILI9341 TFT Display Driver
//!
//! Driver for 240x320 ILI9341 panels over a 4-wire SPI bus (SCK, MOSI, CS,
//! D/C) with separate reset and backlight lines. Pixels are RGB565 sent
//! big-endian. Text goes through `embedded-graphics` mono fonts.
//!
//! Hardware vertical scrolling always runs along the panel's native 320-line
//! axis, which is horizontal on screen in landscape orientation.

use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{Dimensions, OriginDimensions, Point, Size};
use embedded_graphics::mono_font::MonoTextStyleBuilder;
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::{IntoStorage, Rgb565};
use embedded_graphics::primitives::{PointsIter, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use embedded_graphics::{Drawable, Pixel};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::backend::{Color, Display, DisplayError, Font};

/// Native panel width in portrait
const NATIVE_WIDTH: u16 = 240;
/// Native panel height in portrait, also the scroll axis length
const NATIVE_HEIGHT: u16 = 320;

/// Pixel bytes buffered per SPI write
const CHUNK_SIZE: usize = 64;

/// ILI9341 commands
#[allow(dead_code)]
mod cmd {
    pub const SWRESET: u8 = 0x01;
    pub const SLPIN: u8 = 0x10;
    pub const SLPOUT: u8 = 0x11;
    pub const DISPOFF: u8 = 0x28;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const PASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const VSCRDEF: u8 = 0x33;
    pub const MADCTL: u8 = 0x36;
    pub const VSCRSADD: u8 = 0x37;
    pub const COLMOD: u8 = 0x3A;
}

/// Memory access control bits
mod madctl {
    pub const MY: u8 = 0x80;
    pub const MX: u8 = 0x40;
    pub const MV: u8 = 0x20;
    pub const BGR: u8 = 0x08;
}

/// Panel orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    Portrait,
    /// Rotated 90 degrees, 320x240
    Landscape,
    PortraitFlipped,
    LandscapeFlipped,
}

impl Orientation {
    const fn madctl(self) -> u8 {
        match self {
            Orientation::Portrait => madctl::MX | madctl::BGR,
            Orientation::Landscape => madctl::MV | madctl::BGR,
            Orientation::PortraitFlipped => madctl::MY | madctl::BGR,
            Orientation::LandscapeFlipped => madctl::MX | madctl::MY | madctl::MV | madctl::BGR,
        }
    }

    const fn is_landscape(self) -> bool {
        matches!(self, Orientation::Landscape | Orientation::LandscapeFlipped)
    }
}

fn comm<E>(_: E) -> DisplayError {
    DisplayError::Communication
}

fn to_rgb565(color: Color) -> Rgb565 {
    Rgb565::from(RawU16::new(color.raw()))
}

/// ILI9341 driver
pub struct Ili9341<SPI, DC, CS, RST, BL, D> {
    spi: SPI,
    dc: DC,
    cs: CS,
    rst: RST,
    bl: BL,
    delay: D,
    orientation: Orientation,
    initialized: bool,
}

impl<SPI, DC, CS, RST, BL, D> Ili9341<SPI, DC, CS, RST, BL, D>
where
    SPI: SpiBus<u8>,
    DC: OutputPin,
    CS: OutputPin,
    RST: OutputPin,
    BL: OutputPin,
    D: DelayNs,
{
    /// Create a new driver; call [`Ili9341::init`] before drawing
    pub fn new(spi: SPI, dc: DC, cs: CS, rst: RST, bl: BL, delay: D, orientation: Orientation) -> Self {
        Self {
            spi,
            dc,
            cs,
            rst,
            bl,
            delay,
            orientation,
            initialized: false,
        }
    }

    /// Hardware reset and power-up sequence
    ///
    /// Leaves the panel awake, in 16-bit color, with the whole 320-line
    /// axis defined as the scroll area and the backlight on.
    pub fn init(&mut self) -> Result<(), DisplayError> {
        self.cs.set_high().map_err(comm)?;
        self.rst.set_high().map_err(comm)?;
        self.delay.delay_ms(5);
        self.rst.set_low().map_err(comm)?;
        self.delay.delay_ms(20);
        self.rst.set_high().map_err(comm)?;
        self.delay.delay_ms(150);

        self.command(cmd::SWRESET, &[])?;
        self.delay.delay_ms(150);
        self.command(cmd::SLPOUT, &[])?;
        self.delay.delay_ms(120);
        self.command(cmd::COLMOD, &[0x55])?; // 16 bits per pixel
        self.command(cmd::MADCTL, &[self.orientation.madctl()])?;

        let [hi, lo] = NATIVE_HEIGHT.to_be_bytes();
        self.command(cmd::VSCRDEF, &[0, 0, hi, lo, 0, 0])?;

        self.command(cmd::DISPON, &[])?;
        self.delay.delay_ms(20);
        self.bl.set_high().map_err(comm)?;

        self.initialized = true;
        Ok(())
    }

    /// Screen size in the current orientation
    pub fn dimensions(&self) -> (u16, u16) {
        if self.orientation.is_landscape() {
            (NATIVE_HEIGHT, NATIVE_WIDTH)
        } else {
            (NATIVE_WIDTH, NATIVE_HEIGHT)
        }
    }

    /// Release the bus and pins
    pub fn release(self) -> (SPI, DC, CS, RST, BL, D) {
        (self.spi, self.dc, self.cs, self.rst, self.bl, self.delay)
    }

    fn ensure_ready(&self) -> Result<(), DisplayError> {
        if self.initialized {
            Ok(())
        } else {
            Err(DisplayError::NotInitialized)
        }
    }

    fn command(&mut self, command: u8, data: &[u8]) -> Result<(), DisplayError> {
        self.cs.set_low().map_err(comm)?;
        let result = self.transfer(command, data);
        self.cs.set_high().map_err(comm)?;
        result
    }

    fn transfer(&mut self, command: u8, data: &[u8]) -> Result<(), DisplayError> {
        self.dc.set_low().map_err(comm)?;
        self.spi.write(&[command]).map_err(comm)?;
        self.spi.flush().map_err(comm)?;
        if !data.is_empty() {
            self.dc.set_high().map_err(comm)?;
            self.spi.write(data).map_err(comm)?;
            self.spi.flush().map_err(comm)?;
        }
        Ok(())
    }

    /// Set the inclusive drawing window
    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), DisplayError> {
        let [x0h, x0l] = x0.to_be_bytes();
        let [x1h, x1l] = x1.to_be_bytes();
        let [y0h, y0l] = y0.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();
        self.command(cmd::CASET, &[x0h, x0l, x1h, x1l])?;
        self.command(cmd::PASET, &[y0h, y0l, y1h, y1l])
    }

    /// Stream pixels into the current window
    fn write_pixels<I>(&mut self, pixels: I) -> Result<(), DisplayError>
    where
        I: IntoIterator<Item = u16>,
    {
        self.cs.set_low().map_err(comm)?;
        let result = self.stream(pixels);
        self.cs.set_high().map_err(comm)?;
        result
    }

    fn stream<I>(&mut self, pixels: I) -> Result<(), DisplayError>
    where
        I: IntoIterator<Item = u16>,
    {
        self.dc.set_low().map_err(comm)?;
        self.spi.write(&[cmd::RAMWR]).map_err(comm)?;
        self.spi.flush().map_err(comm)?;
        self.dc.set_high().map_err(comm)?;

        let mut chunk = [0u8; CHUNK_SIZE];
        let mut len = 0;
        for pixel in pixels {
            chunk[len..len + 2].copy_from_slice(&pixel.to_be_bytes());
            len += 2;
            if len == CHUNK_SIZE {
                self.spi.write(&chunk).map_err(comm)?;
                len = 0;
            }
        }
        if len > 0 {
            self.spi.write(&chunk[..len]).map_err(comm)?;
        }
        self.spi.flush().map_err(comm)
    }
}

impl<SPI, DC, CS, RST, BL, D> Display for Ili9341<SPI, DC, CS, RST, BL, D>
where
    SPI: SpiBus<u8>,
    DC: OutputPin,
    CS: OutputPin,
    RST: OutputPin,
    BL: OutputPin,
    D: DelayNs,
{
    fn size(&self) -> (u16, u16) {
        self.dimensions()
    }

    fn clear(&mut self, color: Color) -> Result<(), DisplayError> {
        let (w, h) = self.dimensions();
        self.fill_rect(0, 0, w, h, color)
    }

    fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        color: Color,
    ) -> Result<(), DisplayError> {
        self.ensure_ready()?;
        let (w, h) = self.dimensions();
        if x >= w || y >= h || width == 0 || height == 0 {
            return Ok(());
        }
        let width = width.min(w - x);
        let height = height.min(h - y);

        self.set_window(x, y, x + width - 1, y + height - 1)?;
        let count = width as usize * height as usize;
        self.write_pixels(core::iter::repeat(color.raw()).take(count))
    }

    fn draw_text(
        &mut self,
        x: u16,
        y: u16,
        text: &str,
        font: Font,
        fg: Color,
        bg: Color,
    ) -> Result<(), DisplayError> {
        self.ensure_ready()?;
        let style = MonoTextStyleBuilder::new()
            .font(font.mono())
            .text_color(to_rgb565(fg))
            .background_color(to_rgb565(bg))
            .build();
        Text::with_baseline(text, Point::new(x as i32, y as i32), style, Baseline::Top)
            .draw(self)?;
        Ok(())
    }

    fn scroll(&mut self, offset: u16) -> Result<(), DisplayError> {
        self.ensure_ready()?;
        let [hi, lo] = (offset % NATIVE_HEIGHT).to_be_bytes();
        self.command(cmd::VSCRSADD, &[hi, lo])
    }

    fn set_sleep(&mut self, asleep: bool) -> Result<(), DisplayError> {
        self.ensure_ready()?;
        if asleep {
            self.command(cmd::SLPIN, &[])?;
            self.delay.delay_ms(5);
        } else {
            self.command(cmd::SLPOUT, &[])?;
            self.delay.delay_ms(120);
        }
        Ok(())
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError> {
        if on {
            self.bl.set_high().map_err(comm)
        } else {
            self.bl.set_low().map_err(comm)
        }
    }
}

impl<SPI, DC, CS, RST, BL, D> OriginDimensions for Ili9341<SPI, DC, CS, RST, BL, D>
where
    SPI: SpiBus<u8>,
    DC: OutputPin,
    CS: OutputPin,
    RST: OutputPin,
    BL: OutputPin,
    D: DelayNs,
{
    fn size(&self) -> Size {
        let (w, h) = self.dimensions();
        Size::new(w as u32, h as u32)
    }
}

impl<SPI, DC, CS, RST, BL, D> DrawTarget for Ili9341<SPI, DC, CS, RST, BL, D>
where
    SPI: SpiBus<u8>,
    DC: OutputPin,
    CS: OutputPin,
    RST: OutputPin,
    BL: OutputPin,
    D: DelayNs,
{
    type Color = Rgb565;
    type Error = DisplayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.bounding_box();
        for Pixel(point, color) in pixels {
            if !bounds.contains(point) {
                continue;
            }
            let (x, y) = (point.x as u16, point.y as u16);
            self.set_window(x, y, x, y)?;
            self.write_pixels(core::iter::once(color.into_storage()))?;
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        if area.intersection(&self.bounding_box()) != *area {
            // Partially off screen, fall back to per-pixel clipping
            return self.draw_iter(
                area.points()
                    .zip(colors)
                    .map(|(point, color)| Pixel(point, color)),
            );
        }
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };
        self.set_window(
            area.top_left.x as u16,
            area.top_left.y as u16,
            bottom_right.x as u16,
            bottom_right.y as u16,
        )?;
        self.write_pixels(colors.into_iter().map(|c| c.into_storage()))
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        if area.bottom_right().is_none() {
            return Ok(());
        }
        Display::fill_rect(
            self,
            area.top_left.x as u16,
            area.top_left.y as u16,
            area.size.width as u16,
            area.size.height as u16,
            Color(color.into_storage()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        Cmd(u8),
        Data(u8),
    }

    #[derive(Default, Clone)]
    struct Bus {
        ops: Rc<RefCell<Vec<Op>>>,
        dc_high: Rc<Cell<bool>>,
        backlight: Rc<Cell<bool>>,
    }

    impl Bus {
        fn take(&self) -> Vec<Op> {
            core::mem::take(&mut *self.ops.borrow_mut())
        }

        fn commands(ops: &[Op]) -> Vec<u8> {
            ops.iter()
                .filter_map(|op| match op {
                    Op::Cmd(c) => Some(*c),
                    Op::Data(_) => None,
                })
                .collect()
        }

        /// Data bytes following the first occurrence of `command`
        fn data_after(ops: &[Op], command: u8) -> Vec<u8> {
            ops.iter()
                .skip_while(|op| **op != Op::Cmd(command))
                .skip(1)
                .map_while(|op| match op {
                    Op::Data(d) => Some(*d),
                    Op::Cmd(_) => None,
                })
                .collect()
        }
    }

    struct MockSpi(Bus);

    impl embedded_hal::spi::ErrorType for MockSpi {
        type Error = Infallible;
    }

    impl SpiBus<u8> for MockSpi {
        fn read(&mut self, _words: &mut [u8]) -> Result<(), Infallible> {
            Ok(())
        }

        fn write(&mut self, words: &[u8]) -> Result<(), Infallible> {
            let data = self.0.dc_high.get();
            let mut ops = self.0.ops.borrow_mut();
            for &w in words {
                ops.push(if data { Op::Data(w) } else { Op::Cmd(w) });
            }
            Ok(())
        }

        fn transfer(&mut self, _read: &mut [u8], write: &[u8]) -> Result<(), Infallible> {
            self.write(write)
        }

        fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Infallible> {
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    struct FlagPin(Rc<Cell<bool>>);

    impl embedded_hal::digital::ErrorType for FlagPin {
        type Error = Infallible;
    }

    impl OutputPin for FlagPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.set(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0.set(true);
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    type TestLcd = Ili9341<MockSpi, FlagPin, FlagPin, FlagPin, FlagPin, NoDelay>;

    fn lcd(bus: &Bus) -> TestLcd {
        Ili9341::new(
            MockSpi(bus.clone()),
            FlagPin(bus.dc_high.clone()),
            FlagPin(Rc::new(Cell::new(true))),
            FlagPin(Rc::new(Cell::new(true))),
            FlagPin(bus.backlight.clone()),
            NoDelay,
            Orientation::Landscape,
        )
    }

    fn ready_lcd(bus: &Bus) -> TestLcd {
        let mut lcd = lcd(bus);
        lcd.init().unwrap();
        bus.take();
        lcd
    }

    #[test]
    fn test_init_sequence() {
        let bus = Bus::default();
        let mut lcd = lcd(&bus);
        lcd.init().unwrap();
        let ops = bus.take();

        assert_eq!(
            Bus::commands(&ops),
            [
                cmd::SWRESET,
                cmd::SLPOUT,
                cmd::COLMOD,
                cmd::MADCTL,
                cmd::VSCRDEF,
                cmd::DISPON
            ]
        );
        assert_eq!(Bus::data_after(&ops, cmd::COLMOD), [0x55]);
        assert_eq!(Bus::data_after(&ops, cmd::MADCTL), [0x28]);
        assert_eq!(Bus::data_after(&ops, cmd::VSCRDEF), [0, 0, 0x01, 0x40, 0, 0]);
        assert!(bus.backlight.get());
    }

    #[test]
    fn test_landscape_size() {
        let bus = Bus::default();
        let lcd = lcd(&bus);
        assert_eq!(Display::size(&lcd), (320, 240));
    }

    #[test]
    fn test_drawing_requires_init() {
        let bus = Bus::default();
        let mut lcd = lcd(&bus);
        assert_eq!(
            lcd.fill_rect(0, 0, 10, 10, Color::RED),
            Err(DisplayError::NotInitialized)
        );
        assert!(bus.take().is_empty());
    }

    #[test]
    fn test_fill_rect_window_and_pixels() {
        let bus = Bus::default();
        let mut lcd = ready_lcd(&bus);
        lcd.fill_rect(10, 20, 4, 3, Color::RED).unwrap();
        let ops = bus.take();

        assert_eq!(Bus::data_after(&ops, cmd::CASET), [0, 10, 0, 13]);
        assert_eq!(Bus::data_after(&ops, cmd::PASET), [0, 20, 0, 22]);
        let pixels = Bus::data_after(&ops, cmd::RAMWR);
        assert_eq!(pixels.len(), 4 * 3 * 2);
        assert!(pixels.chunks(2).all(|p| p == [0xF8, 0x00]));
    }

    #[test]
    fn test_fill_rect_clipped() {
        let bus = Bus::default();
        let mut lcd = ready_lcd(&bus);
        lcd.fill_rect(318, 239, 10, 10, Color::WHITE).unwrap();
        let ops = bus.take();
        assert_eq!(Bus::data_after(&ops, cmd::CASET), [0x01, 0x3E, 0x01, 0x3F]);
        assert_eq!(Bus::data_after(&ops, cmd::RAMWR).len(), 2 * 1 * 2);

        lcd.fill_rect(400, 0, 10, 10, Color::WHITE).unwrap();
        assert!(bus.take().is_empty());
    }

    #[test]
    fn test_clear_covers_screen() {
        let bus = Bus::default();
        let mut lcd = ready_lcd(&bus);
        Display::clear(&mut lcd, Color::BLACK).unwrap();
        let ops = bus.take();
        assert_eq!(Bus::data_after(&ops, cmd::RAMWR).len(), 320 * 240 * 2);
    }

    #[test]
    fn test_draw_text_paints_glyph_cells() {
        let bus = Bus::default();
        let mut lcd = ready_lcd(&bus);
        lcd.draw_text(0, 0, "Hi", Font::Small, Color::WHITE, Color::BLACK)
            .unwrap();
        let ops = bus.take();

        let writes = ops.iter().filter(|op| **op == Op::Cmd(cmd::RAMWR)).count();
        let data = ops.iter().filter(|op| matches!(op, Op::Data(_))).count();
        assert!(writes >= 1);
        // Two 6x10 cells plus window setup bytes
        assert!(data >= 2 * 6 * 10 * 2);
    }

    #[test]
    fn test_scroll_wraps_offset() {
        let bus = Bus::default();
        let mut lcd = ready_lcd(&bus);
        lcd.scroll(330).unwrap();
        let ops = bus.take();
        assert_eq!(Bus::data_after(&ops, cmd::VSCRSADD), [0, 10]);
    }

    #[test]
    fn test_sleep_and_backlight() {
        let bus = Bus::default();
        let mut lcd = ready_lcd(&bus);

        lcd.set_sleep(true).unwrap();
        lcd.set_backlight(false).unwrap();
        assert_eq!(Bus::commands(&bus.take()), [cmd::SLPIN]);
        assert!(!bus.backlight.get());

        lcd.set_sleep(false).unwrap();
        lcd.set_backlight(true).unwrap();
        assert_eq!(Bus::commands(&bus.take()), [cmd::SLPOUT]);
        assert!(bus.backlight.get());
    }
}
