//! Push channel: server-sent event types, decoding and the native client
//!
//! The decoder is host independent. The client needs the `client` feature.

#[cfg(feature = "client")]
mod client;
mod events;
mod sse;

#[cfg(feature = "client")]
pub use client::{Endpoints, LiveClient};
pub use events::{
    EventKind, PatchElements, SseEvent, DEFAULT_EVENT, EXECUTE_SCRIPT_EVENT, PATCH_ELEMENTS_EVENT,
};
pub use sse::SseDecoder;
