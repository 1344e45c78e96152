//! Transport abstraction.
//!
//! The session talks to the bulb only through these traits: a [`Transport`]
//! selects a peripheral, a [`Link`] is the connection to it, and a
//! [`CommandChannel`] is the resolved writable characteristic. The btleplug
//! backed implementations live in [`scanner`](super::scanner) and
//! [`link`](super::link).

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::ble::explorer::{CharacteristicInfo, ServiceInfo};

/// Failure reported by a transport implementation.
#[derive(Error, Debug)]
pub enum TransportError {
    /// No matching peripheral was selected.
    #[error("No device selected")]
    NoDeviceSelected,

    /// The peripheral does not expose the requested service.
    #[error("Service not found: {0}")]
    ServiceNotFound(Uuid),

    /// The service does not contain the requested characteristic.
    #[error("Characteristic not found: {0}")]
    CharacteristicNotFound(Uuid),

    /// The characteristic accepts neither write nor write-without-response.
    #[error("Characteristic not writable: {0}")]
    CharacteristicNotWritable(Uuid),

    /// The link dropped while the operation was running.
    #[error("Link lost")]
    LinkLost,

    /// Error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Result type used at the transport boundary.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Criteria for selecting a peripheral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFilter {
    /// Service the peripheral must advertise.
    pub service: Uuid,
    /// Optional exact local name the peripheral must report.
    pub name: Option<String>,
    /// How long to look for a matching peripheral.
    pub timeout: Duration,
}

impl DeviceFilter {
    /// Check whether a peripheral with the given name and advertised services matches.
    pub fn matches(&self, local_name: Option<&str>, services: &[Uuid]) -> bool {
        if !services.contains(&self.service) {
            return false;
        }

        match &self.name {
            Some(wanted) => local_name == Some(wanted.as_str()),
            None => true,
        }
    }
}

/// Peripheral discovery capability.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Select one peripheral matching `filter`.
    async fn select_device(&self, filter: &DeviceFilter) -> TransportResult<Arc<dyn Link>>;
}

/// A connection to one selected peripheral.
#[async_trait]
pub trait Link: Send + Sync {
    /// Platform identifier of the peripheral.
    fn identifier(&self) -> String;

    /// Advertised local name, if known.
    fn name(&self) -> Option<String>;

    /// Open the link.
    async fn connect(&self) -> TransportResult<()>;

    /// Close the link.
    async fn disconnect(&self) -> TransportResult<()>;

    /// Discover the GATT services and characteristics of the peripheral.
    async fn discover_services(&self) -> TransportResult<Vec<ServiceInfo>>;

    /// Open a write channel on a resolved characteristic.
    async fn open_channel(
        &self,
        characteristic: &CharacteristicInfo,
    ) -> TransportResult<Arc<dyn CommandChannel>>;

    /// Stream that yields once for every disconnect the transport reports.
    async fn disconnections(&self) -> TransportResult<BoxStream<'static, ()>>;
}

/// A resolved writable characteristic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandChannel: Send + Sync {
    /// Write a payload. Completes on local transmission; no acknowledgement is read.
    async fn write(&self, data: &[u8]) -> TransportResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(name: Option<&str>) -> DeviceFilter {
        DeviceFilter {
            service: crate::ble::uuids::LIGHT_SERVICE_UUID,
            name: name.map(str::to_string),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_filter_requires_service() {
        let f = filter(None);
        assert!(f.matches(Some("LEDBLE"), &[crate::ble::uuids::LIGHT_SERVICE_UUID]));
        assert!(!f.matches(Some("LEDBLE"), &[]));
    }

    #[test]
    fn test_filter_by_name() {
        let f = filter(Some("LEDBLE-1234"));
        let services = [crate::ble::uuids::LIGHT_SERVICE_UUID];
        assert!(f.matches(Some("LEDBLE-1234"), &services));
        assert!(!f.matches(Some("LEDBLE-9999"), &services));
        assert!(!f.matches(None, &services));
    }
}
