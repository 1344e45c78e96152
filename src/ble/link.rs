//! btleplug backed link and command channel.

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, Characteristic, Peripheral as _, WriteType};
use btleplug::platform::{Adapter, Peripheral};
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::ble::explorer::{CharacteristicInfo, ServiceInfo};
use crate::ble::transport::{CommandChannel, Link, TransportError, TransportResult};

/// Connection to a selected bulb peripheral.
pub struct BleLink {
    /// Adapter the peripheral was found on, used for disconnect events.
    adapter: Adapter,
    /// The peripheral.
    peripheral: Peripheral,
    /// Advertised local name at selection time.
    name: Option<String>,
}

impl BleLink {
    /// Create a link for a peripheral.
    pub fn new(adapter: Adapter, peripheral: Peripheral, name: Option<String>) -> Self {
        Self {
            adapter,
            peripheral,
            name,
        }
    }

    /// Get the peripheral.
    pub fn peripheral(&self) -> &Peripheral {
        &self.peripheral
    }

    /// Look up the btleplug characteristic matching a resolved one.
    fn find_characteristic(&self, info: &CharacteristicInfo) -> Option<Characteristic> {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == info.uuid && c.service_uuid == info.service_uuid)
    }
}

#[async_trait]
impl Link for BleLink {
    fn identifier(&self) -> String {
        self.peripheral.id().to_string()
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    async fn connect(&self) -> TransportResult<()> {
        if self.peripheral.is_connected().await.unwrap_or(false) {
            debug!("Peripheral already connected at BLE level");
            return Ok(());
        }

        self.peripheral.connect().await?;
        Ok(())
    }

    async fn disconnect(&self) -> TransportResult<()> {
        self.peripheral.disconnect().await?;
        Ok(())
    }

    async fn discover_services(&self) -> TransportResult<Vec<ServiceInfo>> {
        self.peripheral.discover_services().await?;

        let services: Vec<ServiceInfo> = self
            .peripheral
            .services()
            .iter()
            .map(ServiceInfo::from)
            .collect();

        debug!("Discovered {} services", services.len());

        Ok(services)
    }

    async fn open_channel(
        &self,
        characteristic: &CharacteristicInfo,
    ) -> TransportResult<Arc<dyn CommandChannel>> {
        let resolved = self
            .find_characteristic(characteristic)
            .ok_or(TransportError::CharacteristicNotFound(characteristic.uuid))?;

        let write_type = if characteristic.supports_write_without_response() {
            WriteType::WithoutResponse
        } else {
            WriteType::WithResponse
        };

        Ok(Arc::new(BleChannel {
            peripheral: self.peripheral.clone(),
            characteristic: resolved,
            write_type,
        }))
    }

    async fn disconnections(&self) -> TransportResult<BoxStream<'static, ()>> {
        let id = self.peripheral.id();
        let events = self.adapter.events().await?;

        Ok(events
            .filter_map(move |event| {
                let disconnected = matches!(
                    event,
                    CentralEvent::DeviceDisconnected(ref other) if *other == id
                );
                async move { disconnected.then_some(()) }
            })
            .boxed())
    }
}

/// Write channel on the light control characteristic.
pub struct BleChannel {
    peripheral: Peripheral,
    characteristic: Characteristic,
    write_type: WriteType,
}

#[async_trait]
impl CommandChannel for BleChannel {
    async fn write(&self, data: &[u8]) -> TransportResult<()> {
        self.peripheral
            .write(&self.characteristic, data, self.write_type)
            .await
            .map_err(|e| match e {
                btleplug::Error::NotConnected => TransportError::LinkLost,
                other => TransportError::Bluetooth(other),
            })?;

        trace!(
            "Wrote {} bytes to characteristic {}: {:02X?}",
            data.len(),
            self.characteristic.uuid,
            data
        );

        Ok(())
    }
}
