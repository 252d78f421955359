//! Live video stream connections.
//!
//! [`StreamManager`] tracks one slot per camera. Each slot moves through
//! [`StreamStatus`]:
//!
//! ```text
//! Disconnected ─connect─▶ Connecting ─ready─▶ Connected
//!                             │
//!                       error/timeout
//!                             ▼
//!                           Error ─▶ Reconnecting (n/max) ─▶ Connecting ...
//! ```
//!
//! Retries back off linearly (3 s, 6 s, 9 s, ...) and stop after the
//! policy's attempt budget, leaving the slot in `Error` until reconnected
//! by hand. Actual media attachment is delegated to a [`MediaBackend`].

mod backend;
mod config;
mod manager;
mod status;
mod transport;

pub use backend::{AttachRequest, MediaBackend, Player};
pub use config::{ReconnectPolicy, StreamConfig, StreamSource};
pub use manager::StreamManager;
pub use status::{SlotReport, StatusUpdate, StreamStatus};
pub use transport::{Transport, TransportHint};
