//! Shared state between Embassy tasks
//!
//! Statics that several tasks touch. The orchestrator itself is not here;
//! it lives in a `StaticCell` created in `main` and is passed by reference.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use portable_atomic::AtomicU32;

use lcdbox_core::connectivity::LinkStatus;

/// Wi-Fi association state and power-mode requests
///
/// Written by the connectivity task, read by `Connected` modes through
/// [`crate::link::WifiLink`].
pub static LINK_STATUS: LinkStatus<CriticalSectionRawMutex> = LinkStatus::new();

/// Mode switches completed from serial or HTTP since boot
pub static SWITCHES: AtomicU32 = AtomicU32::new(0);

/// HTTP connections served since boot
pub static HTTP_REQUESTS: AtomicU32 = AtomicU32::new(0);
