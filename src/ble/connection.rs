//! Connection state tracking.

use chrono::{DateTime, Utc};

/// Connection state for a bulb session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionState {
    /// No command channel is held.
    #[default]
    Disconnected,
    /// The select/connect/resolve pipeline is running.
    Connecting,
    /// The command channel is resolved and writable.
    Connected,
}

impl ConnectionState {
    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if in a transitional state.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Connecting)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

/// Event for connection state changes.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectionEvent {
    /// Identifier of the peripheral, if one was selected.
    pub identifier: Option<String>,
    /// The state before the change.
    pub previous: ConnectionState,
    /// The new connection state.
    pub state: ConnectionState,
    /// When the change happened.
    pub timestamp: DateTime<Utc>,
}

impl ConnectionEvent {
    /// Check if this event marks a newly established connection.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Check if this event marks the loss of an established connection.
    ///
    /// A failed connection attempt (`Connecting -> Disconnected`) is not a
    /// disconnection.
    pub fn is_disconnected(&self) -> bool {
        self.previous == ConnectionState::Connected && self.state == ConnectionState::Disconnected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(previous: ConnectionState, state: ConnectionState) -> ConnectionEvent {
        ConnectionEvent {
            identifier: None,
            previous,
            state,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_connection_state() {
        assert!(!ConnectionState::Disconnected.is_connected());
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());

        assert!(ConnectionState::Connecting.is_transitioning());
        assert!(!ConnectionState::Connected.is_transitioning());
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(format!("{}", ConnectionState::Connected), "Connected");
        assert_eq!(format!("{}", ConnectionState::Connecting), "Connecting");
        assert_eq!(format!("{}", ConnectionState::Disconnected), "Disconnected");
    }

    #[test]
    fn test_failed_connect_is_not_a_disconnection() {
        use ConnectionState::*;

        assert!(event(Connected, Disconnected).is_disconnected());
        assert!(!event(Connecting, Disconnected).is_disconnected());
        assert!(event(Connecting, Connected).is_connected());
    }
}
