//! Unix-socket node hosting a slotmux device registry.
//!
//! The node is the process-resident half of the mechanism: it owns the
//! [`slotmux_core::DeviceRegistry`] and serves it over a Unix domain
//! socket whose path plays the role of the device node. One connection is
//! one session; unrelated processes exchange messages by agreeing on the
//! socket path, a device id, and a channel id.
//!
//! # Crate Structure
//!
//! - [`socket`] — the socket endpoint (bind/accept/connect, cleanup)
//! - [`server`] — thread-per-connection serve loop driving sessions
//! - [`client`] — blocking client mirroring the five protocol operations

pub mod client;
pub mod error;
pub mod server;
pub mod socket;

pub use client::SlotClient;
pub use error::{NodeError, Result};
pub use server::SlotServer;
pub use socket::DeviceSocket;
