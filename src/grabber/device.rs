//! Capture device enumeration.

use std::sync::Arc;

use super::backend::DeviceHost;
use super::types::{DeviceDescriptor, GrabError};

/// Resolves between positional device indices and stable unique IDs.
///
/// Every call queries the host for the live device list; nothing is
/// cached, so results always reflect the current hot-plug state. A
/// positional index is only guaranteed valid until the next call, while
/// a unique ID stays valid for the device's lifetime.
pub struct DeviceEnumerator {
    host: Arc<dyn DeviceHost>,
}

impl DeviceEnumerator {
    pub fn new(host: Arc<dyn DeviceHost>) -> Self {
        Self { host }
    }

    /// Snapshot of all connected devices with positional indices assigned.
    pub fn devices(&self) -> Result<Vec<DeviceDescriptor>, GrabError> {
        let mut devices = self.host.devices()?;
        for (index, device) in devices.iter_mut().enumerate() {
            device.index = index;
        }
        Ok(devices)
    }

    /// Number of currently connected devices.
    pub fn count(&self) -> Result<usize, GrabError> {
        Ok(self.host.devices()?.len())
    }

    /// Descriptive metadata for the device at `index`.
    pub fn describe(&self, index: usize) -> Result<DeviceDescriptor, GrabError> {
        let devices = self.devices()?;
        let count = devices.len();
        devices
            .into_iter()
            .nth(index)
            .ok_or(GrabError::OutOfRange { index, count })
    }

    /// Stable unique ID of the device at `index`.
    pub fn unique_id_for(&self, index: usize) -> Result<String, GrabError> {
        Ok(self.describe(index)?.unique_id)
    }

    /// Current positional index of the device with the given unique ID.
    ///
    /// Returns `None` for unknown IDs; device removal during normal
    /// operation is expected, not exceptional, so this never errors. A
    /// failed host query also maps to `None` for the same reason.
    pub fn index_for(&self, unique_id: &str) -> Option<usize> {
        self.host
            .devices()
            .ok()?
            .iter()
            .position(|d| d.unique_id == unique_id)
    }
}
