//! BLE Service and Characteristic UUIDs.
//!
//! Contains the UUID constants used for light bulb communication.

use uuid::Uuid;

// Light Control Service (vendor, 16-bit 0xFFE5 on the Bluetooth base UUID)
/// Light control service UUID.
pub const LIGHT_SERVICE_UUID: Uuid = uuid_from_u16(0xffe5);
/// Light control characteristic UUID (Write, Write Without Response).
pub const LIGHT_CONTROL_CHARACTERISTIC_UUID: Uuid = uuid_from_u16(0xffe9);

/// Bluetooth SIG base UUID, with the 16-bit alias bits cleared.
const BLUETOOTH_BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_00805f9b34fb;

/// Expand a 16-bit assigned number to a full 128-bit UUID.
pub const fn uuid_from_u16(short: u16) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE_UUID | ((short as u128) << 96))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_format() {
        let service = LIGHT_SERVICE_UUID.to_string();
        assert_eq!(service, "0000ffe5-0000-1000-8000-00805f9b34fb");

        let characteristic = LIGHT_CONTROL_CHARACTERISTIC_UUID.to_string();
        assert_eq!(characteristic, "0000ffe9-0000-1000-8000-00805f9b34fb");
    }

    #[test]
    fn test_uuid_from_u16() {
        assert_eq!(
            uuid_from_u16(0x2a00).to_string(),
            "00002a00-0000-1000-8000-00805f9b34fb"
        );
    }
}
