//! Board-agnostic core logic for the lcdbox display firmware
//!
//! This crate contains everything that does not touch RP2040 peripherals:
//!
//! - Mode registry and task table
//! - Mode orchestrator (cancel-then-start switching of the exclusive slot)
//! - Serial and HTTP input adapters feeding the orchestrator
//! - Connectivity keeper state and the collaborator traits
//! - Device configuration types
//! - The display modes themselves

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod log;

pub mod cancel;
pub mod config;
pub mod connectivity;
pub mod input;
pub mod modes;
pub mod orchestrator;
pub mod registry;
pub mod table;
pub mod text;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use cancel::{CancelToken, Cancelled};
pub use orchestrator::{ModeExit, ModeLauncher, Orchestrator};
pub use registry::{Category, ModeDescriptor, ModeFactory, Registry, RegistryError};
pub use table::{PersistentTask, SlotState, TaskHandle, TaskTable};
