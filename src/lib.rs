// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # magicblue-rust-ble
//!
//! A cross-platform Rust library for controlling "Magic Blue" style RGB
//! light bulbs via Bluetooth Low Energy.
//!
//! The bulb exposes a vendor light control service (`0xFFE5`) with one
//! writable characteristic (`0xFFE9`). Power and color are set by writing
//! short fixed-format frames to it; the bulb sends nothing back.
//!
//! ## Features
//!
//! - **Device Selection**: Find a bulb advertising the light control service
//! - **Session Management**: Connect, resolve the control channel, and follow disconnects
//! - **Commands**: Power on/off, toggle, and 24-bit RGB color
//! - **Color Presets**: Named colors such as `yellow`, `pink`, and `cyan`
//! - **GATT Exploration**: List the services and characteristics a bulb exposes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use magicblue_rust_ble::{DeviceSession, Result, Rgb, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = DeviceSession::with_bluetooth(SessionConfig::default()).await?;
//!     session.connect().await?;
//!
//!     session.power_on().await?;
//!     session.set_color(255, 0, 0).await?;
//!     session.set_rgb(Rgb::preset("cyan")?).await?;
//!
//!     session.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod config;
pub mod data;
pub mod error;
pub mod protocol;
pub mod session;
pub mod sink;

// Re-exports for convenience
pub use config::SessionConfig;
pub use error::{ConnectStage, Error, Result};
pub use session::{CallbackHandle, DeviceSession};
pub use sink::CommandSink;

// Re-export commonly used types from submodules
pub use ble::connection::{ConnectionEvent, ConnectionState};
pub use ble::transport::{CommandChannel, DeviceFilter, Link, Transport, TransportError};
pub use data::Rgb;
pub use protocol::{encode_color, encode_power, Command};
