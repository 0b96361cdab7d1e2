use std::sync::{Mutex, PoisonError};

use crate::error::{Result, SlotError};
use crate::MAX_MESSAGE_LEN;

/// A single-message mailbox within one device.
///
/// A slot holds at most one pending message. Send fully replaces it and
/// receive copies it out without consuming it, so repeated receives return
/// the same bytes until the next send. The message outlives every session
/// that ever bound the channel.
///
/// The message is guarded by its own lock: a receive never observes a
/// half-written message and two sends never interleave.
#[derive(Debug)]
pub struct Slot {
    id: u32,
    message: Mutex<Vec<u8>>,
}

impl Slot {
    pub(crate) fn new(id: u32) -> Self {
        Self {
            id,
            message: Mutex::new(Vec::new()),
        }
    }

    /// Channel id this slot answers to. Never zero.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Replace the stored message with `payload`.
    ///
    /// The payload length must be in `1..=MAX_MESSAGE_LEN`. On failure the
    /// previous message is left intact. Returns the number of bytes
    /// accepted, always `payload.len()` on success.
    pub fn send(&self, payload: &[u8]) -> Result<usize> {
        if payload.is_empty() || payload.len() > MAX_MESSAGE_LEN {
            return Err(SlotError::InvalidMessageSize {
                len: payload.len(),
                max: MAX_MESSAGE_LEN,
            });
        }

        // Materialize the replacement before taking the lock so the stored
        // message is swapped in a single assignment, never partially built.
        let replacement = payload.to_vec();
        let mut message = self.lock_message();
        *message = replacement;
        Ok(payload.len())
    }

    /// Copy the stored message out.
    ///
    /// `capacity` is the caller's destination size. Fails with
    /// [`SlotError::EmptyChannel`] if nothing has ever been sent and with
    /// [`SlotError::BufferTooSmall`] if the stored message does not fit.
    /// The stored message is not cleared.
    pub fn receive(&self, capacity: usize) -> Result<Vec<u8>> {
        let message = self.lock_message();
        if message.is_empty() {
            return Err(SlotError::EmptyChannel { channel: self.id });
        }
        if capacity < message.len() {
            return Err(SlotError::BufferTooSmall {
                capacity,
                len: message.len(),
            });
        }
        Ok(message.clone())
    }

    /// Stored message length in bytes; 0 means nothing was ever sent.
    pub fn message_len(&self) -> usize {
        self.lock_message().len()
    }

    fn lock_message(&self) -> std::sync::MutexGuard<'_, Vec<u8>> {
        // The message is only ever replaced whole, so a poisoned lock still
        // guards a consistent value; recover it.
        self.message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_then_receive_returns_payload() {
        let slot = Slot::new(7);
        assert_eq!(slot.send(b"hi").unwrap(), 2);
        assert_eq!(slot.receive(MAX_MESSAGE_LEN).unwrap(), b"hi");
    }

    #[test]
    fn receive_is_idempotent_until_next_send() {
        let slot = Slot::new(1);
        slot.send(b"first").unwrap();
        assert_eq!(slot.receive(128).unwrap(), b"first");
        assert_eq!(slot.receive(128).unwrap(), b"first");

        slot.send(b"second").unwrap();
        assert_eq!(slot.receive(128).unwrap(), b"second");
    }

    #[test]
    fn send_replaces_rather_than_appends() {
        let slot = Slot::new(1);
        slot.send(&[0xAA; 100]).unwrap();
        slot.send(b"x").unwrap();
        assert_eq!(slot.receive(128).unwrap(), b"x");
    }

    #[test]
    fn empty_slot_receive_fails() {
        let slot = Slot::new(3);
        assert!(matches!(
            slot.receive(128),
            Err(SlotError::EmptyChannel { channel: 3 })
        ));
    }

    #[test]
    fn boundary_payload_lengths() {
        let slot = Slot::new(1);
        assert!(matches!(
            slot.send(b""),
            Err(SlotError::InvalidMessageSize { len: 0, .. })
        ));
        assert!(matches!(
            slot.send(&[0u8; 129]),
            Err(SlotError::InvalidMessageSize { len: 129, .. })
        ));
        assert_eq!(slot.send(&[0u8; 128]).unwrap(), 128);
        assert_eq!(slot.receive(128).unwrap().len(), 128);
    }

    #[test]
    fn failed_send_keeps_previous_message() {
        let slot = Slot::new(1);
        slot.send(b"keep me").unwrap();
        assert!(slot.send(&[0u8; 129]).is_err());
        assert_eq!(slot.receive(128).unwrap(), b"keep me");
    }

    #[test]
    fn receive_capacity_must_cover_stored_length() {
        let slot = Slot::new(1);
        slot.send(&[0x55; 50]).unwrap();
        assert!(matches!(
            slot.receive(49),
            Err(SlotError::BufferTooSmall {
                capacity: 49,
                len: 50
            })
        ));
        assert_eq!(slot.receive(50).unwrap().len(), 50);
    }
}
