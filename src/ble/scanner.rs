//! BLE scanning functionality.
//!
//! Provides the btleplug backed [`Transport`] used to find a light bulb.

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::StreamExt;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::ble::link::BleLink;
use crate::ble::transport::{DeviceFilter, Link, Transport, TransportError, TransportResult};
use crate::error::{Error, Result};

/// A peripheral that passed the device filter.
struct SelectedDevice {
    peripheral: Peripheral,
    name: Option<String>,
}

/// BLE scanner for selecting a light bulb.
pub struct BleScanner {
    /// The BLE adapter to use for scanning.
    adapter: Adapter,
}

impl BleScanner {
    /// Create a new BLE scanner on the first available adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self { adapter })
    }

    /// Create a new BLE scanner with a specific adapter.
    pub fn with_adapter(adapter: Adapter) -> Self {
        Self { adapter }
    }

    /// Get the underlying adapter.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Wait for a peripheral matching the filter.
    ///
    /// Peripherals the adapter already knows about are checked before new
    /// advertisements.
    async fn find_matching(
        &self,
        events: &mut (impl futures::Stream<Item = CentralEvent> + Unpin),
        filter: &DeviceFilter,
    ) -> Option<SelectedDevice> {
        match self.adapter.peripherals().await {
            Ok(known) => {
                for peripheral in known {
                    if let Some(selected) = Self::check_peripheral(peripheral, filter).await {
                        return Some(selected);
                    }
                }
            }
            Err(e) => debug!("Failed to list known peripherals: {}", e),
        }

        while let Some(event) = events.next().await {
            let id = match event {
                CentralEvent::DeviceDiscovered(id)
                | CentralEvent::DeviceUpdated(id)
                | CentralEvent::ServicesAdvertisement { id, .. } => id,
                _ => continue,
            };

            trace!("Checking peripheral {:?}", id);

            let peripheral = match self.adapter.peripheral(&id).await {
                Ok(p) => p,
                Err(e) => {
                    trace!("Failed to get peripheral: {}", e);
                    continue;
                }
            };

            if let Some(selected) = Self::check_peripheral(peripheral, filter).await {
                return Some(selected);
            }
        }

        None
    }

    /// Check a peripheral's advertised properties against the filter.
    async fn check_peripheral(
        peripheral: Peripheral,
        filter: &DeviceFilter,
    ) -> Option<SelectedDevice> {
        let properties = match peripheral.properties().await {
            Ok(Some(p)) => p,
            _ => return None,
        };

        if !filter.matches(properties.local_name.as_deref(), &properties.services) {
            return None;
        }

        Some(SelectedDevice {
            peripheral,
            name: properties.local_name,
        })
    }
}

#[async_trait]
impl Transport for BleScanner {
    async fn select_device(&self, filter: &DeviceFilter) -> TransportResult<Arc<dyn Link>> {
        info!("Requesting Bluetooth device with service {}", filter.service);

        let mut events = self.adapter.events().await?;

        self.adapter
            .start_scan(ScanFilter {
                services: vec![filter.service],
            })
            .await?;

        let selected =
            tokio::time::timeout(filter.timeout, self.find_matching(&mut events, filter)).await;

        if let Err(e) = self.adapter.stop_scan().await {
            warn!("Failed to stop scan: {}", e);
        }

        match selected {
            Ok(Some(device)) => {
                info!("> Found {}", device.name.as_deref().unwrap_or("unnamed device"));
                Ok(Arc::new(BleLink::new(
                    self.adapter.clone(),
                    device.peripheral,
                    device.name,
                )))
            }
            Ok(None) => Err(TransportError::NoDeviceSelected),
            Err(_) => {
                debug!("No matching device within {:?}", filter.timeout);
                Err(TransportError::NoDeviceSelected)
            }
        }
    }
}
