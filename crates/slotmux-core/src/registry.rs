use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::error::{Result, SlotError};
use crate::session::Session;
use crate::table::ChannelTable;
use crate::{MAX_CHANNELS, MAX_DEVICES};

/// Process-wide map from device id to its channel table.
///
/// Tables are created on first open of a device id and persist until the
/// registry itself is dropped; no individual device is ever removed while
/// sessions might still reference its channels. Dropping the registry is
/// the teardown: every table and every slot it owns is freed with it.
pub struct DeviceRegistry {
    devices: RwLock<HashMap<u64, Arc<ChannelTable>>>,
    max_devices: usize,
    channel_capacity: usize,
}

impl DeviceRegistry {
    /// Registry with the production limits ([`MAX_DEVICES`] devices,
    /// [`MAX_CHANNELS`] channels each).
    pub fn new() -> Self {
        Self::with_limits(MAX_DEVICES, MAX_CHANNELS)
    }

    /// Registry with explicit limits; tests inject small ones.
    pub fn with_limits(max_devices: usize, channel_capacity: usize) -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
            max_devices,
            channel_capacity,
        }
    }

    /// Open a new session against `device`, creating its table on first
    /// use. Every session starts unbound.
    pub fn open(&self, device: u64) -> Result<Session> {
        let table = self.table_for(device)?;
        debug!(device, "opened session");
        Ok(Session::new(device, table))
    }

    /// Number of devices that have been opened at least once.
    pub fn device_count(&self) -> usize {
        self.read_devices().len()
    }

    fn table_for(&self, device: u64) -> Result<Arc<ChannelTable>> {
        if device >= self.max_devices as u64 {
            return Err(SlotError::ResourceExhausted {
                device,
                max: self.max_devices,
            });
        }

        if let Some(table) = self.read_devices().get(&device) {
            return Ok(table.clone());
        }

        let mut devices = self
            .devices
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(table) = devices.get(&device) {
            return Ok(table.clone());
        }

        let table = Arc::new(ChannelTable::with_capacity(self.channel_capacity));
        devices.insert(device, table.clone());
        info!(device, "registered device");
        Ok(table)
    }

    fn read_devices(&self) -> std::sync::RwLockReadGuard<'_, HashMap<u64, Arc<ChannelTable>>> {
        self.devices.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn open_creates_device_lazily() {
        let registry = DeviceRegistry::new();
        assert_eq!(registry.device_count(), 0);

        let _session = registry.open(5).unwrap();
        assert_eq!(registry.device_count(), 1);

        // Re-opening the same device does not register a second table.
        let _again = registry.open(5).unwrap();
        assert_eq!(registry.device_count(), 1);
    }

    #[test]
    fn device_id_range_is_bounded() {
        let registry = DeviceRegistry::new();
        assert!(registry.open((MAX_DEVICES as u64) - 1).is_ok());
        assert!(matches!(
            registry.open(MAX_DEVICES as u64),
            Err(SlotError::ResourceExhausted { .. })
        ));
    }

    #[test]
    fn messages_persist_across_sessions() {
        let registry = DeviceRegistry::new();

        let mut sender = registry.open(0).unwrap();
        sender.bind(7).unwrap();
        sender.send(b"hi").unwrap();
        drop(sender);

        let mut receiver = registry.open(0).unwrap();
        receiver.bind(7).unwrap();
        assert_eq!(receiver.receive(128).unwrap(), b"hi");
    }

    #[test]
    fn devices_are_isolated() {
        let registry = DeviceRegistry::new();

        let mut a = registry.open(1).unwrap();
        a.bind(9).unwrap();
        a.send(b"on device 1").unwrap();

        let mut b = registry.open(2).unwrap();
        b.bind(9).unwrap();
        assert!(matches!(
            b.receive(128),
            Err(SlotError::EmptyChannel { .. })
        ));
    }

    #[test]
    fn concurrent_opens_share_one_table() {
        let registry = Arc::new(DeviceRegistry::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            handles.push(thread::spawn(move || {
                let mut session = registry.open(3).expect("open should succeed");
                session.bind(1).expect("bind should succeed");
            }));
        }
        for handle in handles {
            handle.join().expect("thread should finish");
        }
        assert_eq!(registry.device_count(), 1);
    }
}
