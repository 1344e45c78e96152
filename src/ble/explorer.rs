//! GATT service and characteristic reporting.
//!
//! Describes what a connected bulb exposes, in the same
//! `> Service` / `>> Characteristic [PROPS]` layout used when probing an
//! unknown device for its light control characteristic.

use btleplug::api::CharPropFlags;
use std::fmt;
use uuid::Uuid;

/// Property flags in the order they are reported.
const PROPERTY_NAMES: [(CharPropFlags, &str); 8] = [
    (CharPropFlags::BROADCAST, "BROADCAST"),
    (CharPropFlags::READ, "READ"),
    (CharPropFlags::WRITE_WITHOUT_RESPONSE, "WRITE_WITHOUT_RESPONSE"),
    (CharPropFlags::WRITE, "WRITE"),
    (CharPropFlags::NOTIFY, "NOTIFY"),
    (CharPropFlags::INDICATE, "INDICATE"),
    (
        CharPropFlags::AUTHENTICATED_SIGNED_WRITES,
        "AUTHENTICATED_SIGNED_WRITES",
    ),
    (CharPropFlags::EXTENDED_PROPERTIES, "EXTENDED_PROPERTIES"),
];

/// Format the set property flags as `[READ, WRITE, ...]`.
pub fn describe_properties(properties: CharPropFlags) -> String {
    let names: Vec<&str> = PROPERTY_NAMES
        .iter()
        .filter(|(flag, _)| properties.contains(*flag))
        .map(|(_, name)| *name)
        .collect();

    format!("[{}]", names.join(", "))
}

/// A discovered GATT characteristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicInfo {
    /// Characteristic UUID.
    pub uuid: Uuid,
    /// UUID of the service containing this characteristic.
    pub service_uuid: Uuid,
    /// Supported properties.
    pub properties: CharPropFlags,
}

impl CharacteristicInfo {
    /// Check whether the characteristic accepts writes of either kind.
    pub fn is_writable(&self) -> bool {
        self.properties
            .intersects(CharPropFlags::WRITE | CharPropFlags::WRITE_WITHOUT_RESPONSE)
    }

    /// Check whether writes can skip the acknowledgement round trip.
    pub fn supports_write_without_response(&self) -> bool {
        self.properties
            .contains(CharPropFlags::WRITE_WITHOUT_RESPONSE)
    }
}

impl From<&btleplug::api::Characteristic> for CharacteristicInfo {
    fn from(characteristic: &btleplug::api::Characteristic) -> Self {
        Self {
            uuid: characteristic.uuid,
            service_uuid: characteristic.service_uuid,
            properties: characteristic.properties,
        }
    }
}

impl fmt::Display for CharacteristicInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ">> Characteristic: {} {}",
            self.uuid,
            describe_properties(self.properties)
        )
    }
}

/// A discovered GATT service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Service UUID.
    pub uuid: Uuid,
    /// Characteristics within the service.
    pub characteristics: Vec<CharacteristicInfo>,
}

impl ServiceInfo {
    /// Find a characteristic in this service by UUID.
    pub fn characteristic(&self, uuid: &Uuid) -> Option<&CharacteristicInfo> {
        self.characteristics.iter().find(|c| c.uuid == *uuid)
    }
}

impl From<&btleplug::api::Service> for ServiceInfo {
    fn from(service: &btleplug::api::Service) -> Self {
        Self {
            uuid: service.uuid,
            characteristics: service
                .characteristics
                .iter()
                .map(CharacteristicInfo::from)
                .collect(),
        }
    }
}

impl fmt::Display for ServiceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "> Service: {}", self.uuid)?;
        for characteristic in &self.characteristics {
            write!(f, "\n{}", characteristic)?;
        }
        Ok(())
    }
}

/// Render a list of services, one line per service and characteristic.
pub fn format_services(services: &[ServiceInfo]) -> String {
    services
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::uuids::*;
    use pretty_assertions::assert_eq;

    fn light_service() -> ServiceInfo {
        ServiceInfo {
            uuid: LIGHT_SERVICE_UUID,
            characteristics: vec![CharacteristicInfo {
                uuid: LIGHT_CONTROL_CHARACTERISTIC_UUID,
                service_uuid: LIGHT_SERVICE_UUID,
                properties: CharPropFlags::WRITE | CharPropFlags::WRITE_WITHOUT_RESPONSE,
            }],
        }
    }

    #[test]
    fn test_describe_properties() {
        assert_eq!(describe_properties(CharPropFlags::empty()), "[]");
        assert_eq!(
            describe_properties(CharPropFlags::READ | CharPropFlags::NOTIFY),
            "[READ, NOTIFY]"
        );
        assert_eq!(
            describe_properties(CharPropFlags::WRITE | CharPropFlags::WRITE_WITHOUT_RESPONSE),
            "[WRITE_WITHOUT_RESPONSE, WRITE]"
        );
    }

    #[test]
    fn test_is_writable() {
        let mut characteristic = light_service().characteristics[0].clone();
        assert!(characteristic.is_writable());
        assert!(characteristic.supports_write_without_response());

        characteristic.properties = CharPropFlags::WRITE;
        assert!(characteristic.is_writable());
        assert!(!characteristic.supports_write_without_response());

        characteristic.properties = CharPropFlags::READ | CharPropFlags::NOTIFY;
        assert!(!characteristic.is_writable());
    }

    #[test]
    fn test_format_services() {
        let report = format_services(&[light_service()]);
        assert_eq!(
            report,
            "> Service: 0000ffe5-0000-1000-8000-00805f9b34fb\n\
             >> Characteristic: 0000ffe9-0000-1000-8000-00805f9b34fb [WRITE_WITHOUT_RESPONSE, WRITE]"
        );
    }

    #[test]
    fn test_find_characteristic() {
        let service = light_service();
        assert!(service
            .characteristic(&LIGHT_CONTROL_CHARACTERISTIC_UUID)
            .is_some());
        assert!(service.characteristic(&LIGHT_SERVICE_UUID).is_none());
    }
}
