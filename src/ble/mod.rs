//! BLE communication module.
//!
//! This module provides the Bluetooth Low Energy plumbing for finding a
//! light bulb and writing to its light control characteristic.

pub mod connection;
pub mod explorer;
#[cfg(test)]
pub(crate) mod fake;
pub mod link;
pub mod scanner;
pub mod transport;
pub mod uuids;

pub use connection::{ConnectionEvent, ConnectionState};
pub use explorer::{describe_properties, format_services, CharacteristicInfo, ServiceInfo};
pub use link::{BleChannel, BleLink};
pub use scanner::BleScanner;
pub use transport::{
    CommandChannel, DeviceFilter, Link, Transport, TransportError, TransportResult,
};
pub use uuids::*;
