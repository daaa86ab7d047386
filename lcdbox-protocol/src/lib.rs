//! lcdbox Mode-Switch Protocol
//!
//! This crate defines the two ways a host tells the display which mode to run,
//! plus the small HTTP client framing the data-fetching modes use.
//!
//! # Serial
//!
//! One ASCII line per request, payload is the mode id:
//! ```text
//! ┌──────────────┬────────────┐
//! │ MODE ID      │ \n or \r\n │
//! │ 1–32B        │            │
//! └──────────────┴────────────┘
//! ```
//!
//! # HTTP
//!
//! ```text
//! GET /mode/<id> HTTP/1.x          ->  HTTP/1.0 200 OK
//! <headers, ignored>                   Content-type: application/json
//! <blank line>
//!                                      {"result": "success" | "failure"}
//! ```
//!
//! Neither channel knows which ids exist; that is decided by the mode
//! registry on the device.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod client;
pub mod http;
pub mod line;
pub mod request;

pub use client::{build_get, parse_response, Response};
pub use http::{
    find_head_end, parse_request_line, write_response, HttpError, Method, ModeResult,
    RequestLine, Route, MAX_RESPONSE_SIZE,
};
pub use line::{LineBuffer, LineError, MAX_LINE_LEN};
pub use request::{RouteError, SwitchRequest, MAX_MODE_ID_LEN};
