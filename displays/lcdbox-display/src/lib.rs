//! Display abstraction and TFT driver for lcdbox
//!
//! This crate provides:
//! - `Display` trait: the drawing surface a mode owns while it runs
//! - `Color` and `Font` value types shared by every mode
//! - `Ili9341` driver for the 320x240 SPI TFT on the Pico W board
//!
//! # Architecture
//!
//! Modes only ever see `&mut impl Display`. The firmware constructs the
//! concrete driver once and lends it to whichever mode holds the exclusive
//! slot, so drawing code can be tested on the host against a mock.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod backend;
pub mod ili9341;

// Re-export key types
pub use backend::{Color, Display, DisplayError, Font};
pub use ili9341::{Ili9341, Orientation};
