use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, SlotError};
use crate::slot::Slot;
use crate::table::ChannelTable;
use crate::RESERVED_CHANNEL;

/// One caller's open connection to a device.
///
/// A fresh session is unbound; [`Session::bind`] attaches it to a channel
/// and may be called again any number of times to rebind. Send and receive
/// are valid only while bound and check the binding on every call.
/// Dropping a session never affects the bound channel's stored message.
pub struct Session {
    device: u64,
    table: Arc<ChannelTable>,
    bound: Option<Arc<Slot>>,
}

impl Session {
    pub(crate) fn new(device: u64, table: Arc<ChannelTable>) -> Self {
        Self {
            device,
            table,
            bound: None,
        }
    }

    /// The device this session was opened against.
    pub fn device(&self) -> u64 {
        self.device
    }

    /// Currently bound channel id, if any.
    pub fn channel(&self) -> Option<u32> {
        self.bound.as_ref().map(|slot| slot.id())
    }

    /// Bind this session to `channel`, creating the channel on first use
    /// anywhere on this device.
    ///
    /// The reserved id 0 is rejected. A failed bind leaves the previous
    /// binding in place.
    pub fn bind(&mut self, channel: u32) -> Result<()> {
        if channel == RESERVED_CHANNEL {
            return Err(SlotError::InvalidChannel);
        }
        let slot = self.table.find_or_create(channel)?;
        debug!(device = self.device, channel, "session bound");
        self.bound = Some(slot);
        Ok(())
    }

    /// Send `payload` to the bound channel, replacing its stored message.
    pub fn send(&self, payload: &[u8]) -> Result<usize> {
        self.bound_slot()?.send(payload)
    }

    /// Copy the bound channel's stored message into a buffer of
    /// `capacity` bytes.
    pub fn receive(&self, capacity: usize) -> Result<Vec<u8>> {
        self.bound_slot()?.receive(capacity)
    }

    fn bound_slot(&self) -> Result<&Slot> {
        self.bound.as_deref().ok_or(SlotError::NotBound)
    }
}
