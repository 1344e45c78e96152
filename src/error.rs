//! Error types for the magicblue-rust-ble crate.

use thiserror::Error;

use crate::ble::transport::TransportError;

/// Stage of the connection pipeline that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectStage {
    /// Selecting a peripheral that advertises the light service.
    SelectDevice,
    /// Opening the link to the selected peripheral.
    OpenLink,
    /// Resolving the light control service.
    ResolveService,
    /// Resolving the writable light control characteristic.
    ResolveCharacteristic,
}

impl std::fmt::Display for ConnectStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelectDevice => write!(f, "selecting device"),
            Self::OpenLink => write!(f, "opening link"),
            Self::ResolveService => write!(f, "resolving service"),
            Self::ResolveCharacteristic => write!(f, "resolving characteristic"),
        }
    }
}

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// The connection pipeline failed.
    #[error("Connection failed while {stage}: {source}")]
    Connection {
        /// The pipeline stage that failed.
        stage: ConnectStage,
        /// The transport failure.
        #[source]
        source: TransportError,
    },

    /// A connection attempt is already running on this session.
    #[error("Connection already in progress")]
    ConnectionInProgress,

    /// Operation requires a connection but the bulb is not connected.
    #[error("Bulb not connected")]
    NotConnected,

    /// The transport rejected a write.
    #[error("Write failed: {source}")]
    Write {
        /// The transport failure.
        #[source]
        source: TransportError,
    },

    /// A transport call outside the connection pipeline failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// No color preset with the given name exists.
    #[error("Unknown color preset: {name}")]
    UnknownPreset {
        /// The name that was looked up.
        name: String,
    },
}

impl Error {
    /// The failed pipeline stage, if this is a connection error.
    pub fn connect_stage(&self) -> Option<ConnectStage> {
        match self {
            Self::Connection { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
