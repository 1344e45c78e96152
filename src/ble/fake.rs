//! In-memory transport for session tests.

use async_trait::async_trait;
use btleplug::api::CharPropFlags;
use futures::channel::mpsc;
use futures::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::ble::explorer::{CharacteristicInfo, ServiceInfo};
use crate::ble::transport::{
    CommandChannel, DeviceFilter, Link, Transport, TransportError, TransportResult,
};
use crate::ble::uuids::{LIGHT_CONTROL_CHARACTERISTIC_UUID, LIGHT_SERVICE_UUID};

/// A simulated bulb recording everything written to it.
pub(crate) struct FakeBulb {
    services: Vec<ServiceInfo>,
    refuse_connect: bool,
    channel: Option<Arc<dyn CommandChannel>>,
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    disconnect_txs: Mutex<Vec<mpsc::UnboundedSender<()>>>,
    disconnect_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeBulb {
    pub(crate) const NAME: &'static str = "LEDBLE-78631A2B";
    pub(crate) const IDENTIFIER: &'static str = "fake-bulb";

    fn build(services: Vec<ServiceInfo>) -> Self {
        Self {
            services,
            refuse_connect: false,
            channel: None,
            writes: Arc::new(Mutex::new(Vec::new())),
            fail_writes: Arc::new(AtomicBool::new(false)),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            disconnect_txs: Mutex::new(Vec::new()),
            disconnect_gate: Mutex::new(None),
        }
    }

    fn light_service(properties: CharPropFlags) -> ServiceInfo {
        ServiceInfo {
            uuid: LIGHT_SERVICE_UUID,
            characteristics: vec![CharacteristicInfo {
                uuid: LIGHT_CONTROL_CHARACTERISTIC_UUID,
                service_uuid: LIGHT_SERVICE_UUID,
                properties,
            }],
        }
    }

    /// A bulb exposing a writable light control characteristic.
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::build(vec![Self::light_service(
            CharPropFlags::WRITE | CharPropFlags::WRITE_WITHOUT_RESPONSE,
        )]))
    }

    /// A bulb exposing the given services.
    pub(crate) fn with_services(services: Vec<ServiceInfo>) -> Arc<Self> {
        Arc::new(Self::build(services))
    }

    /// A bulb whose light control characteristic is read-only.
    pub(crate) fn read_only() -> Arc<Self> {
        Self::with_services(vec![Self::light_service(CharPropFlags::READ)])
    }

    /// A bulb that refuses to connect.
    pub(crate) fn refusing() -> Arc<Self> {
        let mut bulb = Self::build(Vec::new());
        bulb.refuse_connect = true;
        Arc::new(bulb)
    }

    /// A bulb that hands out the given channel instead of recording writes.
    pub(crate) fn with_channel(channel: Arc<dyn CommandChannel>) -> Arc<Self> {
        let mut bulb = Self::build(vec![Self::light_service(CharPropFlags::WRITE)]);
        bulb.channel = Some(channel);
        Arc::new(bulb)
    }

    pub(crate) fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().clone()
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    /// Hold every later `disconnect` until the gate is notified.
    pub(crate) fn hold_disconnect(&self, gate: Arc<Notify>) {
        *self.disconnect_gate.lock() = Some(gate);
    }

    /// Simulate the bulb going out of range.
    pub(crate) fn drop_link(&self) {
        for tx in self.disconnect_txs.lock().iter() {
            let _ = tx.unbounded_send(());
        }
    }
}

#[async_trait]
impl Link for FakeBulb {
    fn identifier(&self) -> String {
        Self::IDENTIFIER.to_string()
    }

    fn name(&self) -> Option<String> {
        Some(Self::NAME.to_string())
    }

    async fn connect(&self) -> TransportResult<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.refuse_connect {
            return Err(TransportError::Other("connection refused".to_string()));
        }
        Ok(())
    }

    async fn disconnect(&self) -> TransportResult<()> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.disconnect_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(())
    }

    async fn discover_services(&self) -> TransportResult<Vec<ServiceInfo>> {
        Ok(self.services.clone())
    }

    async fn open_channel(
        &self,
        _characteristic: &CharacteristicInfo,
    ) -> TransportResult<Arc<dyn CommandChannel>> {
        if let Some(channel) = &self.channel {
            return Ok(channel.clone());
        }

        Ok(Arc::new(FakeChannel {
            writes: self.writes.clone(),
            fail_writes: self.fail_writes.clone(),
        }))
    }

    async fn disconnections(&self) -> TransportResult<BoxStream<'static, ()>> {
        let (tx, rx) = mpsc::unbounded();
        self.disconnect_txs.lock().push(tx);
        Ok(rx.boxed())
    }
}

struct FakeChannel {
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
}

#[async_trait]
impl CommandChannel for FakeChannel {
    async fn write(&self, data: &[u8]) -> TransportResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::LinkLost);
        }
        self.writes.lock().push(data.to_vec());
        Ok(())
    }
}

/// Transport that selects a single fake bulb, if present.
pub(crate) struct FakeTransport {
    bulb: Option<Arc<FakeBulb>>,
    gate: Option<Arc<Notify>>,
}

impl FakeTransport {
    pub(crate) fn with_bulb(bulb: Arc<FakeBulb>) -> Self {
        Self {
            bulb: Some(bulb),
            gate: None,
        }
    }

    /// A transport where no bulb is in range.
    pub(crate) fn empty() -> Self {
        Self {
            bulb: None,
            gate: None,
        }
    }

    /// Hold device selection until the gate is notified.
    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn select_device(&self, filter: &DeviceFilter) -> TransportResult<Arc<dyn Link>> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match &self.bulb {
            Some(bulb) if filter.service == LIGHT_SERVICE_UUID => {
                Ok(bulb.clone() as Arc<dyn Link>)
            }
            _ => Err(TransportError::NoDeviceSelected),
        }
    }
}
