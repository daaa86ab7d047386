//! Collaborator traits
//!
//! These traits define the interface between the modes and the
//! board-specific implementations the firmware provides.

pub mod network;
pub mod platform;

pub use lcdbox_display::{Color, Display, DisplayError, Font};
pub use network::{Connectivity, FetchError, LinkState, PowerMode};
pub use platform::Platform;
