//! CAN bus plumbing for VinScout.
//!
//! - `CanFrame` / `Batch` — the wire-level data model
//! - `CanHub` — in-process pub/sub bus with batch-granular delivery
//! - `CanSubscriber` / `CanPublisher` — the handles diagnostic code holds
//! - OBD-II addressing constants shared by the query layers
//!
//! The hub models a single shared bus: every published batch reaches every
//! subscriber. Bridging to real hardware (SocketCAN, a gateway socket) is
//! the embedding host's job — it holds a publisher for inbound traffic and
//! a subscriber for outbound frames.

pub mod channel;
pub mod error;
pub mod types;

// Re-exports for convenience.
pub use channel::{CanHub, CanPublisher, CanSubscriber};
pub use error::{BusError, BusResult};
pub use types::{Batch, CanFrame};
