//! Embassy async tasks
//!
//! Each task runs independently. Input tasks talk to the orchestrator,
//! everything else shares state through `channels`.

pub mod connectivity;
pub mod drivers;
pub mod http_input;
pub mod mode_slot;
pub mod serial_input;

pub use connectivity::connectivity_task;
pub use drivers::{cyw43_task, net_task, usb_task};
pub use http_input::http_input_task;
pub use mode_slot::mode_slot_task;
pub use serial_input::serial_input_task;
