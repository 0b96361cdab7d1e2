//! Persistent single-slot message passing between processes.
//!
//! slotmux multiplexes many single-message channels over a small number of
//! device endpoints. Each channel holds exactly one pending message that
//! survives across sessions until the next send overwrites it.
//!
//! # Crate Structure
//!
//! - [`core`] — channels, tables, the device registry, and sessions
//! - [`wire`] — the request/reply wire codec
//! - [`node`] — socket hosting and the blocking client

/// Re-export core types.
pub mod core {
    pub use slotmux_core::*;
}

/// Re-export wire types.
pub mod wire {
    pub use slotmux_wire::*;
}

/// Re-export node types.
pub mod node {
    pub use slotmux_node::*;
}
