//! Device session for a single light bulb.
//!
//! A [`DeviceSession`] owns the connection to one bulb and the writable
//! light control channel resolved on it. It runs the
//! select → connect → resolve pipeline, watches the link for disconnects,
//! and exposes the power/color command surface.

use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, StreamExt};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::ble::connection::{ConnectionEvent, ConnectionState};
use crate::ble::explorer::ServiceInfo;
use crate::ble::scanner::BleScanner;
use crate::ble::transport::{CommandChannel, Link, Transport, TransportError};
use crate::config::SessionConfig;
use crate::data::Rgb;
use crate::error::{ConnectStage, Error, Result};
use crate::protocol::Command;

/// Callback handle for unregistering callbacks.
pub struct CallbackHandle {
    id: u64,
    unregister_fn: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl CallbackHandle {
    /// Create a new callback handle.
    pub(crate) fn new(id: u64, unregister_fn: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            unregister_fn: Some(Box::new(unregister_fn)),
        }
    }

    /// Unregister this callback.
    pub fn unregister(mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }

    /// Get the callback ID.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }
}

/// Internal state for a session.
#[derive(Default)]
struct SessionState {
    /// Current connection state.
    state: ConnectionState,
    /// The open link, present only while connected.
    link: Option<Arc<dyn Link>>,
    /// The light control channel, present only while connected.
    channel: Option<Arc<dyn CommandChannel>>,
    /// Services discovered on the connected bulb.
    services: Vec<ServiceInfo>,
    /// Name reported by the connected bulb.
    device_name: Option<String>,
    /// When the current connection was established.
    connected_at: Option<DateTime<Utc>>,
    /// Last power state successfully written (or assumed on connect).
    powered_on: bool,
    /// Bumped on every connect attempt and every disconnect. A pipeline or
    /// watcher only touches the state while its captured value is current.
    attempt: u64,
}

/// State shared with the disconnect watcher task.
struct Shared {
    state: RwLock<SessionState>,
    event_tx: broadcast::Sender<ConnectionEvent>,
    watcher: RwLock<Option<JoinHandle<()>>>,
}

impl Shared {
    /// Update the connection state and emit an event.
    fn set_state(&self, session: &mut SessionState, new_state: ConnectionState) {
        let old_state = session.state;
        session.state = new_state;

        if old_state != new_state {
            debug!("Connection state changed: {} -> {}", old_state, new_state);

            let _ = self.event_tx.send(ConnectionEvent {
                identifier: session.link.as_ref().map(|link| link.identifier()),
                previous: old_state,
                state: new_state,
                timestamp: Utc::now(),
            });
        }
    }

    /// Drop the channel and link and return to `Disconnected`.
    ///
    /// No-op when already disconnected.
    fn handle_disconnection(&self) {
        self.end_connection(None);
    }

    /// Tear down the connection, but only if `attempt` (when given) is still
    /// the current one.
    fn end_connection(&self, attempt: Option<u64>) {
        {
            let mut session = self.state.write();
            if matches!(attempt, Some(attempt) if attempt != session.attempt) {
                debug!("Ignoring disconnect from a superseded connection");
                return;
            }
            if session.state == ConnectionState::Disconnected && session.channel.is_none() {
                return;
            }

            info!(
                "Disconnected from {}",
                session.device_name.as_deref().unwrap_or("bulb")
            );

            session.channel = None;
            session.services.clear();
            session.connected_at = None;
            self.set_state(&mut session, ConnectionState::Disconnected);
            session.link = None;
            session.device_name = None;
            session.attempt += 1;
        }

        if let Some(handle) = self.watcher.write().take() {
            handle.abort();
        }
    }

    /// Return a failed `Connecting` attempt to `Disconnected`.
    fn abandon_connect(&self, attempt: u64) {
        let mut session = self.state.write();
        if session.state == ConnectionState::Connecting && session.attempt == attempt {
            self.set_state(&mut session, ConnectionState::Disconnected);
        }
    }
}

/// Everything the pipeline resolved before it is committed to the session.
struct Established {
    link: Arc<dyn Link>,
    channel: Arc<dyn CommandChannel>,
    services: Vec<ServiceInfo>,
    disconnections: BoxStream<'static, ()>,
}

/// Map a transport failure to a connection error at `stage`.
fn at(stage: ConnectStage) -> impl FnOnce(TransportError) -> Error {
    move |source| Error::Connection { stage, source }
}

/// Close a link that will not be kept, logging any failure.
async fn close_quietly(link: &dyn Link) {
    if let Err(e) = link.disconnect().await {
        debug!("Failed to close link {}: {}", link.identifier(), e);
    }
}

/// A session with one light bulb.
pub struct DeviceSession {
    /// Peripheral discovery capability.
    transport: Arc<dyn Transport>,
    /// Session settings.
    config: SessionConfig,
    /// State shared with the watcher task.
    shared: Arc<Shared>,
    /// Serializes writes so at most one is in flight.
    write_lock: Mutex<()>,
    /// Callback ID counter.
    callback_counter: AtomicU64,
}

impl DeviceSession {
    /// Create a session over a transport with the default configuration.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    /// Create a session over a transport.
    pub fn with_config(transport: Arc<dyn Transport>, config: SessionConfig) -> Self {
        let (event_tx, _) = broadcast::channel(16);

        Self {
            transport,
            config,
            shared: Arc::new(Shared {
                state: RwLock::new(SessionState::default()),
                event_tx,
                watcher: RwLock::new(None),
            }),
            write_lock: Mutex::new(()),
            callback_counter: AtomicU64::new(0),
        }
    }

    /// Create a session on the system's first Bluetooth adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn with_bluetooth(config: SessionConfig) -> Result<Self> {
        let scanner = BleScanner::new().await?;
        Ok(Self::with_config(Arc::new(scanner), config))
    }

    /// Get the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // === Connection ===

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.shared.state.read().state
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Name reported by the connected bulb.
    pub fn device_name(&self) -> Option<String> {
        self.shared.state.read().device_name.clone()
    }

    /// When the current connection was established.
    pub fn connected_at(&self) -> Option<DateTime<Utc>> {
        self.shared.state.read().connected_at
    }

    /// Services discovered on the connected bulb. Empty when disconnected.
    pub fn services(&self) -> Vec<ServiceInfo> {
        self.shared.state.read().services.clone()
    }

    /// Select a bulb, connect to it, and resolve the light control channel.
    ///
    /// Succeeds immediately if already connected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionInProgress`] if another `connect` is
    /// running, or [`Error::Connection`] naming the stage that failed. On
    /// failure the session is left `Disconnected`.
    pub async fn connect(&self) -> Result<()> {
        let attempt = {
            let mut session = self.shared.state.write();
            let current_state = session.state;
            match current_state {
                ConnectionState::Connected => {
                    debug!("Already connected");
                    return Ok(());
                }
                ConnectionState::Connecting => return Err(Error::ConnectionInProgress),
                ConnectionState::Disconnected => {
                    session.attempt += 1;
                    self.shared
                        .set_state(&mut session, ConnectionState::Connecting);
                    session.attempt
                }
            }
        };

        let result = match self.establish().await {
            Ok(established) => self.commit(established, attempt).await,
            Err(e) => Err(e),
        };

        if let Err(ref e) = result {
            warn!("Connection failed: {}", e);
            self.shared.abandon_connect(attempt);
        }

        result
    }

    /// Run the select → connect → resolve pipeline.
    async fn establish(&self) -> Result<Established> {
        info!("Requesting Bluetooth device...");
        let link = self
            .transport
            .select_device(&self.config.device_filter())
            .await
            .map_err(at(ConnectStage::SelectDevice))?;

        info!("Connecting to GATT server...");
        link.connect().await.map_err(at(ConnectStage::OpenLink))?;

        match self.resolve(link.as_ref()).await {
            Ok((channel, services, disconnections)) => Ok(Established {
                link,
                channel,
                services,
                disconnections,
            }),
            Err(e) => {
                close_quietly(link.as_ref()).await;
                Err(e)
            }
        }
    }

    /// Resolve the light control service and characteristic on an open link.
    async fn resolve(
        &self,
        link: &dyn Link,
    ) -> Result<(
        Arc<dyn CommandChannel>,
        Vec<ServiceInfo>,
        BoxStream<'static, ()>,
    )> {
        let disconnections = link
            .disconnections()
            .await
            .map_err(at(ConnectStage::OpenLink))?;

        let service_uuid = self.config.service_uuid;
        let characteristic_uuid = self.config.characteristic_uuid;

        info!("Getting service {} - light control...", service_uuid);
        let services = link
            .discover_services()
            .await
            .map_err(at(ConnectStage::ResolveService))?;

        let service = services
            .iter()
            .find(|s| s.uuid == service_uuid)
            .ok_or(TransportError::ServiceNotFound(service_uuid))
            .map_err(at(ConnectStage::ResolveService))?;

        info!(
            "Getting characteristic {} - light control...",
            characteristic_uuid
        );
        let characteristic = service
            .characteristic(&characteristic_uuid)
            .ok_or(TransportError::CharacteristicNotFound(characteristic_uuid))
            .map_err(at(ConnectStage::ResolveCharacteristic))?;

        if !characteristic.is_writable() {
            return Err(Error::Connection {
                stage: ConnectStage::ResolveCharacteristic,
                source: TransportError::CharacteristicNotWritable(characteristic_uuid),
            });
        }

        let channel = link
            .open_channel(characteristic)
            .await
            .map_err(at(ConnectStage::ResolveCharacteristic))?;

        Ok((channel, services, disconnections))
    }

    /// Store a resolved pipeline and start watching for disconnects.
    ///
    /// Refuses if the session was disconnected (or reconnected) while the
    /// pipeline ran.
    async fn commit(&self, established: Established, attempt: u64) -> Result<()> {
        let Established {
            link,
            channel,
            services,
            disconnections,
        } = established;

        let committed = {
            let mut session = self.shared.state.write();
            if session.state == ConnectionState::Connecting && session.attempt == attempt {
                session.device_name = link.name();
                session.link = Some(link.clone());
                session.channel = Some(channel);
                session.services = services;
                session.connected_at = Some(Utc::now());
                session.powered_on = true;
                self.shared
                    .set_state(&mut session, ConnectionState::Connected);
                true
            } else {
                false
            }
        };

        if !committed {
            close_quietly(link.as_ref()).await;
            return Err(Error::Connection {
                stage: ConnectStage::OpenLink,
                source: TransportError::LinkLost,
            });
        }

        info!("All ready!");

        let shared = self.shared.clone();
        let mut disconnections = disconnections;
        let handle = tokio::spawn(async move {
            if disconnections.next().await.is_some() {
                shared.end_connection(Some(attempt));
            }
            debug!("Disconnect watcher stopped");
        });

        if let Some(previous) = self.shared.watcher.write().replace(handle) {
            previous.abort();
        }

        Ok(())
    }

    /// Handle a disconnect reported by the transport.
    ///
    /// Clears the channel and signals observers. Calling this while already
    /// disconnected does nothing.
    pub fn on_disconnected(&self) {
        self.shared.handle_disconnection();
    }

    /// Close the link to the bulb.
    pub async fn disconnect(&self) -> Result<()> {
        let (link, attempt) = {
            let session = self.shared.state.read();
            (session.link.clone(), session.attempt)
        };
        let Some(link) = link else {
            return Ok(());
        };

        info!("Disconnecting from {}", link.identifier());

        let result = link.disconnect().await;
        self.shared.end_connection(Some(attempt));
        result.map_err(Error::Transport)
    }

    /// Subscribe to connection state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.shared.event_tx.subscribe()
    }

    /// Register a callback for when the session becomes connected.
    pub fn on_connected<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&ConnectionEvent) + Send + Sync + 'static,
    {
        self.register(move |event| {
            if event.is_connected() {
                callback(event);
            }
        })
    }

    /// Register a callback for when an established connection is lost.
    pub fn on_connection_lost<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&ConnectionEvent) + Send + Sync + 'static,
    {
        self.register(move |event| {
            if event.is_disconnected() {
                callback(event);
            }
        })
    }

    fn register<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&ConnectionEvent) + Send + Sync + 'static,
    {
        let callback_id = self.callback_counter.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.shared.event_tx.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => callback(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Connection callback skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        CallbackHandle::new(callback_id, move || {
            handle.abort();
        })
    }

    // === Commands ===

    /// Write raw bytes to the light control channel.
    ///
    /// The write is fire-and-forget: it completes once the transport has sent
    /// the bytes, without waiting for a reply from the bulb.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] if no channel is held (no transport call is
    /// made), or [`Error::Write`] if the transport rejects the write.
    pub async fn send(&self, payload: &[u8]) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let channel = self
            .shared
            .state
            .read()
            .channel
            .clone()
            .ok_or(Error::NotConnected)?;

        channel.write(payload).await.map_err(|source| {
            warn!("Error when writing value: {}", source);
            Error::Write { source }
        })?;

        trace!("Sent {:02X?}", payload);

        Ok(())
    }

    /// Encode and send a command.
    pub async fn send_command(&self, command: Command) -> Result<()> {
        let frame = command.encode();
        self.send(&frame).await
    }

    /// Last power state written to the bulb.
    ///
    /// A freshly connected bulb is assumed to be on.
    pub fn is_powered_on(&self) -> bool {
        self.shared.state.read().powered_on
    }

    /// Switch the bulb on or off.
    pub async fn set_power(&self, on: bool) -> Result<()> {
        self.send_command(Command::Power { on }).await?;
        self.shared.state.write().powered_on = on;
        info!("Power {}", if on { "on" } else { "off" });
        Ok(())
    }

    /// Switch the bulb on.
    pub async fn power_on(&self) -> Result<()> {
        self.set_power(true).await
    }

    /// Switch the bulb off.
    pub async fn power_off(&self) -> Result<()> {
        self.set_power(false).await
    }

    /// Flip the power state. Returns the new state.
    pub async fn toggle_power(&self) -> Result<bool> {
        let on = !self.is_powered_on();
        self.set_power(on).await?;
        Ok(on)
    }

    /// Set the bulb color from its channels.
    pub async fn set_color(&self, red: u8, green: u8, blue: u8) -> Result<()> {
        self.set_rgb(Rgb::new(red, green, blue)).await
    }

    /// Set the bulb color.
    pub async fn set_rgb(&self, color: Rgb) -> Result<()> {
        self.send_command(Command::Color(color)).await?;
        info!("Color set to {}", color);
        Ok(())
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        if let Some(handle) = self.shared.watcher.write().take() {
            handle.abort();
        }
    }
}
