//! Configuration types
//!
//! Board-agnostic device configuration. The firmware fills these from the
//! embedded `device.toml` through [`parse_config`].

pub mod toml;
pub mod types;

pub use toml::{parse_config, ParseError};
pub use types::*;
