use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::{Result, SlotError};
use crate::slot::Slot;
use crate::{MAX_CHANNELS, RESERVED_CHANNEL};

/// Per-device collection of channel slots, keyed by channel id.
///
/// Slots are created lazily the first time any session binds an unseen id
/// and are never removed before the owning registry is dropped. The table
/// enforces a hard channel ceiling; there is no eviction.
///
/// Lookups for existing channels take the shared read path, so steady-state
/// binds do not contend. Creation is serialized behind the write lock with
/// a re-check, so concurrent binds to the same unseen id converge on a
/// single slot.
pub struct ChannelTable {
    slots: RwLock<HashMap<u32, Arc<Slot>>>,
    capacity: usize,
}

impl ChannelTable {
    /// Table with the production ceiling of [`MAX_CHANNELS`].
    pub fn new() -> Self {
        Self::with_capacity(MAX_CHANNELS)
    }

    /// Create a table with an explicit channel ceiling.
    ///
    /// Production tables use [`MAX_CHANNELS`]; tests inject small ceilings
    /// to exercise the bound.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Look up `channel`, creating its slot on first use.
    ///
    /// Callers reject the reserved id before issuing this call.
    pub fn find_or_create(&self, channel: u32) -> Result<Arc<Slot>> {
        debug_assert_ne!(channel, RESERVED_CHANNEL);

        if let Some(slot) = self.read_slots().get(&channel) {
            return Ok(slot.clone());
        }

        let mut slots = self
            .slots
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Another session may have created the slot between the read and
        // write lock; re-check before counting against capacity.
        if let Some(slot) = slots.get(&channel) {
            return Ok(slot.clone());
        }
        if slots.len() >= self.capacity {
            return Err(SlotError::CapacityExceeded { max: self.capacity });
        }

        let slot = Arc::new(Slot::new(channel));
        slots.insert(channel, slot.clone());
        debug!(channel, total = slots.len(), "created channel slot");
        Ok(slot)
    }

    /// Number of live channels on this device.
    pub fn len(&self) -> usize {
        self.read_slots().len()
    }

    /// True if no channel has been created yet.
    pub fn is_empty(&self) -> bool {
        self.read_slots().is_empty()
    }

    /// The channel ceiling this table enforces.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn read_slots(&self) -> std::sync::RwLockReadGuard<'_, HashMap<u32, Arc<Slot>>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ChannelTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn find_or_create_returns_same_slot_for_same_id() {
        let table = ChannelTable::new();
        let first = table.find_or_create(42).unwrap();
        let second = table.find_or_create(42).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn capacity_is_a_hard_ceiling() {
        let table = ChannelTable::with_capacity(3);
        for id in 1..=3 {
            table.find_or_create(id).unwrap();
        }
        assert!(matches!(
            table.find_or_create(4),
            Err(SlotError::CapacityExceeded { max: 3 })
        ));
        // Existing channels stay reachable at the ceiling.
        assert_eq!(table.find_or_create(2).unwrap().id(), 2);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn default_ceiling_matches_device_limit() {
        assert_eq!(ChannelTable::new().capacity(), MAX_CHANNELS);
    }

    #[test]
    fn concurrent_creation_of_distinct_ids() {
        let table = Arc::new(ChannelTable::new());
        let mut handles = Vec::new();
        for id in 1..=8u32 {
            let table = table.clone();
            handles.push(thread::spawn(move || {
                table.find_or_create(id).expect("creation should succeed").id()
            }));
        }
        let mut ids: Vec<u32> = handles
            .into_iter()
            .map(|h| h.join().expect("thread should finish"))
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
        assert_eq!(table.len(), 8);
    }

    #[test]
    fn concurrent_creation_of_same_id_converges() {
        let table = Arc::new(ChannelTable::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let table = table.clone();
            handles.push(thread::spawn(move || {
                table.find_or_create(99).expect("creation should succeed")
            }));
        }
        let slots: Vec<Arc<Slot>> = handles
            .into_iter()
            .map(|h| h.join().expect("thread should finish"))
            .collect();
        assert!(slots.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(table.len(), 1);
    }
}
