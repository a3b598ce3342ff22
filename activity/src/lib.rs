//! Live-activity fan-out for accepted face matches.
//!
//! # Architecture
//!
//! The [`ActivityHub`] owns a registry of connected observers. Each observer
//! is the send half of a bounded channel; the transport layer (WebSocket,
//! SSE, whatever) owns the receive half and is responsible for turning
//! [`ActivityEvent`]s into wire messages and for disconnect detection.
//!
//! Delivery is best-effort and isolated per observer: a slow or dead
//! observer loses its registration, it never stalls the recognition path or
//! the other observers.

mod event;
mod hub;

pub use event::ActivityEvent;
pub use hub::{ActivityHub, ObserverId};
