//! Command sink capability.
//!
//! Layers that trigger bulb commands (voice recognition, UI buttons,
//! schedulers) depend on [`CommandSink`] rather than on the session, so
//! they never observe connection internals.

use async_trait::async_trait;

use crate::data::Rgb;
use crate::error::Result;
use crate::session::DeviceSession;

/// Something that accepts color and power commands.
#[async_trait]
pub trait CommandSink: Send + Sync {
    /// Set the light color.
    async fn set_color(&self, color: Rgb) -> Result<()>;

    /// Switch the light on or off.
    async fn set_power(&self, on: bool) -> Result<()>;
}

#[async_trait]
impl CommandSink for DeviceSession {
    async fn set_color(&self, color: Rgb) -> Result<()> {
        self.set_rgb(color).await
    }

    async fn set_power(&self, on: bool) -> Result<()> {
        DeviceSession::set_power(self, on).await
    }
}
