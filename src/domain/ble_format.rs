//! Display helpers for discovered devices and characteristic values.

use crate::domain::models::{DiscoveredDevice, BATTERY_LEVEL_UUID};
use uuid::Uuid;

pub const NO_NAME: &str = "Unknown device";
pub const NO_ADDRESS: &str = "Unknown address";
pub const NOT_AVAILABLE: &str = "N/A";

const LABEL_BATTERY: &str = "Battery (%)";
const LABEL_UINT8: &str = "UInt8";
const LABEL_UINT16: &str = "UInt16 (LE)";
const LABEL_UINT32: &str = "UInt32 (LE)";

/// Advertised name, hidden without connect permission.
pub fn safe_device_name(device: &DiscoveredDevice, has_connect_permission: bool) -> String {
    if !has_connect_permission {
        return NO_NAME.to_string();
    }
    device
        .name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(NO_NAME)
        .to_string()
}

/// Address, hidden without connect permission.
pub fn safe_device_address(device: &DiscoveredDevice, has_connect_permission: bool) -> String {
    if !has_connect_permission {
        return NO_ADDRESS.to_string();
    }
    device.address.as_deref().unwrap_or(NO_ADDRESS).to_string()
}

/// Name to show while connecting: the name when known, else the address.
pub fn connect_display_name(device: &DiscoveredDevice, has_connect_permission: bool) -> String {
    let name = if has_connect_permission {
        device.name.as_deref().filter(|n| !n.trim().is_empty())
    } else {
        None
    };
    name.or(device.address.as_deref())
        .unwrap_or(&device.id)
        .to_string()
}

/// A characteristic value rendered in every interpretation we show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicReading {
    pub uuid: Uuid,
    pub len: usize,
    pub hex: String,
    pub ascii: String,
    pub uint8_label: &'static str,
    pub uint8: String,
    pub uint16: String,
    pub uint32: String,
}

impl CharacteristicReading {
    pub fn new(uuid: Uuid, value: &[u8]) -> Self {
        let uint8_label = if uuid == BATTERY_LEVEL_UUID {
            LABEL_BATTERY
        } else {
            LABEL_UINT8
        };

        Self {
            uuid,
            len: value.len(),
            hex: hex_string(value),
            ascii: ascii_string(value),
            uint8_label,
            uint8: value
                .first()
                .map(|b| b.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            uint16: value
                .get(..2)
                .map(|b| u16::from_le_bytes([b[0], b[1]]).to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            uint32: value
                .get(..4)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]).to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "UUID: {}\nLength: {} bytes\nHex: {}\nASCII: {}\n{}: {}\n{}: {}\n{}: {}",
            self.uuid,
            self.len,
            self.hex,
            self.ascii,
            self.uint8_label,
            self.uint8,
            LABEL_UINT16,
            self.uint16,
            LABEL_UINT32,
            self.uint32,
        )
    }
}

fn hex_string(value: &[u8]) -> String {
    if value.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    value
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn ascii_string(value: &[u8]) -> String {
    if value.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    value
        .iter()
        .map(|&b| {
            if is_letter_or_digit(b) || is_whitespace(b) || (b' '..=b'~').contains(&b) {
                // Latin-1 mapping
                b as char
            } else {
                '.'
            }
        })
        .collect()
}

/// Latin-1 letters and decimal digits. Superscripts and fractions are not digits.
fn is_letter_or_digit(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(b, 0xAA | 0xB5 | 0xBA | 0xC0..=0xD6 | 0xD8..=0xF6 | 0xF8..=0xFF)
}

/// Control whitespace, the file/group/record/unit separators and both spaces.
/// NEL (0x85) is not whitespace here.
fn is_whitespace(b: u8) -> bool {
    matches!(b, 0x09..=0x0D | 0x1C..=0x20 | 0xA0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: Option<&str>, address: Option<&str>) -> DiscoveredDevice {
        DiscoveredDevice {
            id: "hci0/dev_1".to_string(),
            address: address.map(str::to_string),
            name: name.map(str::to_string),
            signal_strength: None,
        }
    }

    #[test]
    fn names_are_hidden_without_permission() {
        let d = device(Some("Shelly Plus"), Some("AA:BB:CC:DD:EE:FF"));
        assert_eq!(safe_device_name(&d, true), "Shelly Plus");
        assert_eq!(safe_device_name(&d, false), NO_NAME);
        assert_eq!(safe_device_address(&d, true), "AA:BB:CC:DD:EE:FF");
        assert_eq!(safe_device_address(&d, false), NO_ADDRESS);
    }

    #[test]
    fn missing_fields_fall_back() {
        let d = device(None, None);
        assert_eq!(safe_device_name(&d, true), NO_NAME);
        assert_eq!(safe_device_address(&d, true), NO_ADDRESS);
        assert_eq!(connect_display_name(&d, true), "hci0/dev_1");

        let d = device(Some(""), Some("11:22:33:44:55:66"));
        assert_eq!(connect_display_name(&d, true), "11:22:33:44:55:66");
    }

    #[test]
    fn battery_level_is_labelled() {
        let reading = CharacteristicReading::new(BATTERY_LEVEL_UUID, &[0x57]);
        assert_eq!(reading.uint8_label, "Battery (%)");
        assert_eq!(reading.uint8, "87");
        assert_eq!(reading.uint16, NOT_AVAILABLE);
        assert_eq!(reading.uint32, NOT_AVAILABLE);
        assert_eq!(reading.hex, "57");
        assert_eq!(reading.ascii, "W");
    }

    #[test]
    fn multi_byte_values_are_little_endian() {
        let uuid = Uuid::from_u128(0x00002a29_0000_1000_8000_00805f9b34fb);
        let reading = CharacteristicReading::new(uuid, &[0x01, 0x02, 0x03, 0x04, 0x00]);
        assert_eq!(reading.uint8_label, "UInt8");
        assert_eq!(reading.uint8, "1");
        assert_eq!(reading.uint16, "513");
        assert_eq!(reading.uint32, "67305985");
        assert_eq!(reading.hex, "01 02 03 04 00");
        assert_eq!(reading.ascii, ".....");
        assert_eq!(reading.len, 5);
    }

    #[test]
    fn empty_value_renders_not_available() {
        let reading = CharacteristicReading::new(BATTERY_LEVEL_UUID, &[]);
        for field in [&reading.hex, &reading.ascii, &reading.uint8, &reading.uint16] {
            assert_eq!(field, NOT_AVAILABLE);
        }

        let text = reading.render();
        assert!(text.starts_with("UUID: 00002a19-0000-1000-8000-00805f9b34fb"));
        assert!(text.contains("Length: 0 bytes"));
        assert!(text.contains("Battery (%): N/A"));
        assert!(text.contains("UInt32 (LE): N/A"));
    }

    #[test]
    fn ascii_keeps_text_and_whitespace() {
        let reading = CharacteristicReading::new(Uuid::nil(), b"Hi 1\n\x7f");
        assert_eq!(reading.ascii, "Hi 1\n.");
    }

    #[test]
    fn ascii_follows_latin1_character_classes() {
        let reading = CharacteristicReading::new(Uuid::nil(), &[0x1F, 0x85, 0xB2]);
        assert_eq!(reading.ascii, "\u{1F}..");

        let reading = CharacteristicReading::new(Uuid::nil(), &[0xE9, 0xA0, 0xBC, 0xB5, 0xD7]);
        assert_eq!(reading.ascii, "\u{E9}\u{A0}.\u{B5}.");
    }
}
