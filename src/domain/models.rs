use crate::domain::permissions::BlePermissions;
use uuid::Uuid;

/// Battery Service (0x180F)
pub const BATTERY_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000180f_0000_1000_8000_00805f9b34fb);

/// Battery Level characteristic (0x2A19)
pub const BATTERY_LEVEL_UUID: Uuid = Uuid::from_u128(0x00002a19_0000_1000_8000_00805f9b34fb);

/// A BLE peripheral seen during a scan.
///
/// `address` is the deduplication key. It is `None` when the platform did not
/// hand one out for this peripheral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub id: String,
    pub address: Option<String>,
    pub name: Option<String>,
    pub signal_strength: Option<i16>,
}

/// Connection progress of the single GATT session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Discovering,
    Ready,
}

impl ConnectionState {
    /// Linear progression only; any state may fall back to `Disconnected`.
    pub fn can_advance_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connected, Discovering)
                | (Discovering, Ready)
                | (_, Disconnected)
        )
    }

    pub fn is_linked(self) -> bool {
        matches!(
            self,
            ConnectionState::Connected | ConnectionState::Discovering | ConnectionState::Ready
        )
    }
}

/// Radio state of the bound adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// No adapter could be opened.
    Unavailable,
    Off,
    On,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanFailure {
    AdapterUnavailable(String),
    StartFailed(String),
    EventStreamClosed,
}

impl ScanFailure {
    /// Numeric code shown in the status line.
    pub fn code(&self) -> u8 {
        match self {
            ScanFailure::AdapterUnavailable(_) => 1,
            ScanFailure::StartFailed(_) => 2,
            ScanFailure::EventStreamClosed => 3,
        }
    }
}

/// Everything the BLE client reports back to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum BleEvent {
    DeviceFound(DiscoveredDevice),
    ScanFailed(ScanFailure),
    ScanStopped,
    ConnectionStateChanged(ConnectionState),
    CharacteristicRead { uuid: Uuid, value: Vec<u8> },
    Message(String),
    AdapterStateChanged(AdapterState),
    /// Adapter power or the connect opt-in changed.
    PermissionsChanged(BlePermissions),
}

#[derive(Debug, Clone)]
pub enum BluetoothCommand {
    StartScan,
    StopScan,
    Connect(DiscoveredDevice),
    Disconnect,
    RefreshPermissions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryCommand {
    Refresh,
    LoadNextPage,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

impl StatusMessage {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: MessageSeverity::Info,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: MessageSeverity::Success,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: MessageSeverity::Warning,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: MessageSeverity::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Bluetooth,
    Gallery,
    Web,
    Network,
    Settings,
}
