//! Session configuration.

use std::time::Duration;
use uuid::Uuid;

use crate::ble::transport::DeviceFilter;
use crate::ble::uuids::{LIGHT_CONTROL_CHARACTERISTIC_UUID, LIGHT_SERVICE_UUID};

/// Settings for a [`DeviceSession`](crate::DeviceSession).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Service the bulb advertises and exposes the control characteristic in.
    pub service_uuid: Uuid,
    /// Writable light control characteristic.
    pub characteristic_uuid: Uuid,
    /// Only select a bulb reporting exactly this local name.
    pub device_name: Option<String>,
    /// How long device selection may scan before giving up.
    pub scan_timeout: Duration,
}

impl SessionConfig {
    /// Default device selection timeout.
    pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

    /// Only select a bulb with the given local name.
    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = Some(name.into());
        self
    }

    /// Set the device selection timeout.
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Use a different service and characteristic pair.
    pub fn with_uuids(mut self, service_uuid: Uuid, characteristic_uuid: Uuid) -> Self {
        self.service_uuid = service_uuid;
        self.characteristic_uuid = characteristic_uuid;
        self
    }

    /// The filter passed to the transport when selecting a device.
    pub fn device_filter(&self) -> DeviceFilter {
        DeviceFilter {
            service: self.service_uuid,
            name: self.device_name.clone(),
            timeout: self.scan_timeout,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            service_uuid: LIGHT_SERVICE_UUID,
            characteristic_uuid: LIGHT_CONTROL_CHARACTERISTIC_UUID,
            device_name: None,
            scan_timeout: Self::DEFAULT_SCAN_TIMEOUT,
        }
    }
}
