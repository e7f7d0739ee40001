use crate::domain::ble_format::{self, CharacteristicReading, NO_ADDRESS};
use crate::domain::models::{
    AdapterState, BleEvent, BluetoothCommand, ConnectionState, DiscoveredDevice, StatusMessage,
};
use crate::domain::permissions::BlePermissions;
use crate::presentation::app::ShellyApp;
use crate::presentation::components::Components;
use eframe::egui;

/// Everything the Bluetooth page shows, updated from [`BleEvent`]s.
#[derive(Debug)]
pub struct BluetoothScreen {
    pub adapter: AdapterState,
    pub is_scanning: bool,
    pub devices: Vec<DiscoveredDevice>,
    pub permissions: BlePermissions,
    pub connection_state: ConnectionState,
    pub characteristic: Option<CharacteristicReading>,
    pub status: StatusMessage,
}

impl Default for BluetoothScreen {
    fn default() -> Self {
        Self {
            adapter: AdapterState::Unavailable,
            is_scanning: false,
            devices: Vec::new(),
            permissions: BlePermissions::default(),
            connection_state: ConnectionState::Disconnected,
            characteristic: None,
            status: StatusMessage::info("Idle"),
        }
    }
}

impl BluetoothScreen {
    pub fn apply(&mut self, event: BleEvent) {
        match event {
            BleEvent::DeviceFound(device) => self.add_device(device),
            BleEvent::ScanFailed(failure) => {
                self.status =
                    StatusMessage::error(format!("Scan failed (code {})", failure.code()));
            }
            BleEvent::ScanStopped => self.stop_scan_ui(),
            BleEvent::ConnectionStateChanged(state) => {
                self.connection_state = state;
                self.status = match state {
                    ConnectionState::Connecting => StatusMessage::info("Connecting…"),
                    ConnectionState::Connected => {
                        StatusMessage::info("Connected, discovering services…")
                    }
                    ConnectionState::Discovering => StatusMessage::info("Discovering services…"),
                    ConnectionState::Ready => StatusMessage::success("Services discovered"),
                    ConnectionState::Disconnected => {
                        self.characteristic = None;
                        StatusMessage::warning("Disconnected")
                    }
                };
            }
            BleEvent::CharacteristicRead { uuid, value } => {
                self.characteristic = Some(CharacteristicReading::new(uuid, &value));
                self.status = StatusMessage::success(format!("Read OK from {}", uuid));
            }
            BleEvent::Message(message) => {
                self.status = StatusMessage::warning(message);
            }
            BleEvent::AdapterStateChanged(state) => {
                self.adapter = state;
                if state != AdapterState::On {
                    self.is_scanning = false;
                }
                self.status = match state {
                    AdapterState::On => StatusMessage::info("Bluetooth is on"),
                    AdapterState::Off => StatusMessage::error("Bluetooth is off"),
                    AdapterState::Unavailable => {
                        StatusMessage::error("Bluetooth adapter not available")
                    }
                };
            }
            BleEvent::PermissionsChanged(permissions) => {
                self.permissions = permissions;
                if !permissions.scan {
                    self.is_scanning = false;
                }
                if permissions.all_granted() {
                    self.status = StatusMessage::success("Bluetooth ready");
                } else if self.adapter == AdapterState::On {
                    self.status = StatusMessage::warning(format!(
                        "Missing permissions: {}",
                        permissions.missing().join(", ")
                    ));
                }
            }
        }
    }

    fn add_device(&mut self, device: DiscoveredDevice) {
        let address = ble_format::safe_device_address(&device, self.permissions.connect);
        if address != NO_ADDRESS
            && self
                .devices
                .iter()
                .any(|d| ble_format::safe_device_address(d, self.permissions.connect) == address)
        {
            return;
        }
        self.devices.push(device);
    }

    fn stop_scan_ui(&mut self) {
        self.is_scanning = false;
        self.status = StatusMessage::info("Scan stopped");
    }

    pub fn row_label(&self, device: &DiscoveredDevice) -> String {
        format!(
            "{}\n{}",
            ble_format::safe_device_name(device, self.permissions.connect),
            ble_format::safe_device_address(device, self.permissions.connect)
        )
    }

    pub fn toggle_scan(&mut self) -> BluetoothCommand {
        if self.is_scanning {
            self.stop_scan_ui();
            return BluetoothCommand::StopScan;
        }
        if !self.permissions.scan {
            self.status = StatusMessage::warning("Missing permissions, checking again…");
            return BluetoothCommand::RefreshPermissions;
        }

        self.devices.clear();
        self.is_scanning = true;
        self.status = StatusMessage::info("Scanning…");
        BluetoothCommand::StartScan
    }

    pub fn clear(&mut self) {
        self.devices.clear();
        self.characteristic = None;
    }

    pub fn connect(&mut self, index: usize) -> Option<BluetoothCommand> {
        let device = self.devices.get(index)?.clone();
        if !self.permissions.all_granted() {
            self.status = StatusMessage::warning("Missing permissions, checking again…");
            return Some(BluetoothCommand::RefreshPermissions);
        }

        if self.is_scanning {
            self.stop_scan_ui();
        }
        self.characteristic = None;
        let name = ble_format::connect_display_name(&device, self.permissions.connect);
        self.status = StatusMessage::info(format!("Connecting to {}…", name));
        Some(BluetoothCommand::Connect(device))
    }

    pub fn disconnect(&mut self) -> BluetoothCommand {
        self.characteristic = None;
        BluetoothCommand::Disconnect
    }
}

pub fn render(app: &mut ShellyApp, ui: &mut egui::Ui) {
    if Components::top_bar(ui, "Bluetooth", true) {
        app.go_home();
        return;
    }
    ui.add_space(10.0);

    ui_controls(app, ui);
    ui.add_space(15.0);
    ui_devices(app, ui);
    ui.add_space(15.0);
    ui_characteristic(app, ui);
}

fn ui_controls(app: &mut ShellyApp, ui: &mut egui::Ui) {
    Components::brutalist_card(ui, "Scanner", |ui| {
        let screen = &mut app.bluetooth;
        ui.horizontal(|ui| {
            ui.label("Adapter:");
            let (text, color) = match screen.adapter {
                AdapterState::On => ("ON", egui::Color32::from_rgb(0, 160, 0)),
                AdapterState::Off => ("OFF", egui::Color32::from_rgb(200, 0, 0)),
                AdapterState::Unavailable => ("NONE", egui::Color32::GRAY),
            };
            ui.label(egui::RichText::new(text).strong().color(color));
        });
        Components::status_line(ui, &screen.status);
        ui.add_space(10.0);

        let mut command = None;
        ui.horizontal(|ui| {
            let label = if screen.is_scanning { "Stop scan" } else { "Start scan" };
            if ui.button(label).clicked() {
                command = Some(screen.toggle_scan());
            }
            if screen.is_scanning {
                ui.spinner();
            }
            if ui.button("Clear").clicked() {
                screen.clear();
            }
            if ui.button("Check adapter").clicked() {
                command = Some(BluetoothCommand::RefreshPermissions);
            }
            if screen.connection_state.is_linked() && ui.button("Disconnect").clicked()
            {
                command = Some(screen.disconnect());
            }
        });

        if let Some(command) = command {
            app.send_bluetooth(command);
        }
    });
}

fn ui_devices(app: &mut ShellyApp, ui: &mut egui::Ui) {
    Components::brutalist_card(ui, "Nearby devices", |ui| {
        if app.bluetooth.devices.is_empty() {
            ui.label("No devices yet.");
            return;
        }

        let mut clicked = None;
        egui::ScrollArea::vertical()
            .id_salt("scan_results")
            .max_height(240.0)
            .show(ui, |ui| {
                for (index, device) in app.bluetooth.devices.iter().enumerate() {
                    let mut label = app.bluetooth.row_label(device);
                    if let Some(rssi) = device.signal_strength {
                        label.push_str(&format!("  ({} dBm)", rssi));
                    }
                    if ui.selectable_label(false, label).clicked() {
                        clicked = Some(index);
                    }
                    ui.separator();
                }
            });

        if let Some(command) = clicked.and_then(|i| app.bluetooth.connect(i)) {
            app.send_bluetooth(command);
        }
    });
}

fn ui_characteristic(app: &mut ShellyApp, ui: &mut egui::Ui) {
    Components::brutalist_card(ui, "Characteristic value", |ui| {
        match &app.bluetooth.characteristic {
            Some(reading) => {
                ui.label(egui::RichText::new(reading.render()).monospace());
            }
            None => {
                ui.label("Connect to a device to read a characteristic.");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{MessageSeverity, ScanFailure};
    use crate::domain::models::BATTERY_LEVEL_UUID;

    fn device(id: &str, address: Option<&str>, name: Option<&str>) -> DiscoveredDevice {
        DiscoveredDevice {
            id: id.to_string(),
            address: address.map(str::to_string),
            name: name.map(str::to_string),
            signal_strength: Some(-60),
        }
    }

    fn ready_screen() -> BluetoothScreen {
        let mut screen = BluetoothScreen::default();
        screen.apply(BleEvent::AdapterStateChanged(AdapterState::On));
        screen.apply(BleEvent::PermissionsChanged(BlePermissions::evaluate(true, true)));
        screen
    }

    #[test]
    fn devices_are_deduplicated_by_address() {
        let mut screen = ready_screen();
        assert!(matches!(screen.toggle_scan(), BluetoothCommand::StartScan));

        screen.apply(BleEvent::DeviceFound(device("a", Some("AA:AA:AA:AA:AA:AA"), Some("A"))));
        screen.apply(BleEvent::DeviceFound(device("a2", Some("AA:AA:AA:AA:AA:AA"), None)));
        screen.apply(BleEvent::DeviceFound(device("x", None, None)));
        screen.apply(BleEvent::DeviceFound(device("y", None, None)));

        assert_eq!(screen.devices.len(), 3);
        assert_eq!(screen.row_label(&screen.devices[0]), "A\nAA:AA:AA:AA:AA:AA");
        assert_eq!(screen.row_label(&screen.devices[1]), "Unknown device\nUnknown address");
    }

    #[test]
    fn scan_requires_permission() {
        let mut screen = BluetoothScreen::default();
        assert!(matches!(
            screen.toggle_scan(),
            BluetoothCommand::RefreshPermissions
        ));
        assert!(!screen.is_scanning);
    }

    #[test]
    fn scan_toggle_and_stop_events() {
        let mut screen = ready_screen();
        screen.toggle_scan();
        assert!(screen.is_scanning);
        assert_eq!(screen.status.message, "Scanning…");

        screen.apply(BleEvent::ScanStopped);
        assert!(!screen.is_scanning);
        assert_eq!(screen.status.message, "Scan stopped");

        screen.toggle_scan();
        screen.apply(BleEvent::ScanFailed(ScanFailure::StartFailed("busy".into())));
        assert_eq!(screen.status.message, "Scan failed (code 2)");
        assert_eq!(screen.status.severity, MessageSeverity::Error);
    }

    #[test]
    fn connect_flow_updates_status_and_value() {
        let mut screen = ready_screen();
        screen.apply(BleEvent::DeviceFound(device(
            "dev",
            Some("11:22:33:44:55:66"),
            Some("Shelly"),
        )));

        match screen.connect(0) {
            Some(BluetoothCommand::Connect(d)) => assert_eq!(d.id, "dev"),
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(screen.status.message, "Connecting to Shelly…");

        screen.apply(BleEvent::ConnectionStateChanged(ConnectionState::Connected));
        assert_eq!(screen.status.message, "Connected, discovering services…");

        screen.apply(BleEvent::CharacteristicRead {
            uuid: BATTERY_LEVEL_UUID,
            value: vec![42],
        });
        assert_eq!(screen.characteristic.as_ref().unwrap().uint8, "42");
        assert_eq!(
            screen.status.message,
            "Read OK from 00002a19-0000-1000-8000-00805f9b34fb"
        );

        screen.apply(BleEvent::ConnectionStateChanged(ConnectionState::Disconnected));
        assert!(screen.characteristic.is_none());
        assert_eq!(screen.status.message, "Disconnected");
    }

    #[test]
    fn connect_without_connect_permission_is_refused() {
        let mut screen = BluetoothScreen::default();
        screen.apply(BleEvent::AdapterStateChanged(AdapterState::On));
        screen.apply(BleEvent::PermissionsChanged(BlePermissions::evaluate(true, false)));
        screen.devices.push(device("dev", Some("11:22:33:44:55:66"), None));

        assert!(matches!(
            screen.connect(0),
            Some(BluetoothCommand::RefreshPermissions)
        ));
        assert!(screen.connect(5).is_none());
    }

    #[test]
    fn clear_resets_list_and_value() {
        let mut screen = ready_screen();
        screen.devices.push(device("dev", None, None));
        screen.characteristic = Some(CharacteristicReading::new(BATTERY_LEVEL_UUID, &[1]));
        screen.clear();
        assert!(screen.devices.is_empty());
        assert!(screen.characteristic.is_none());
    }

    #[test]
    fn power_off_stops_scanning_and_shows_state() {
        let mut screen = ready_screen();
        screen.toggle_scan();
        assert!(screen.is_scanning);

        screen.apply(BleEvent::AdapterStateChanged(AdapterState::Off));
        screen.apply(BleEvent::PermissionsChanged(BlePermissions::evaluate(false, true)));
        assert!(!screen.is_scanning);
        assert_eq!(screen.adapter, AdapterState::Off);
        assert_eq!(screen.status.message, "Bluetooth is off");
        assert_eq!(screen.status.severity, MessageSeverity::Error);

        screen.apply(BleEvent::AdapterStateChanged(AdapterState::On));
        screen.apply(BleEvent::PermissionsChanged(BlePermissions::evaluate(true, true)));
        assert_eq!(screen.status.message, "Bluetooth ready");
    }

    #[test]
    fn refused_scan_stops_the_spinner() {
        let mut screen = ready_screen();
        screen.toggle_scan();

        screen.apply(BleEvent::PermissionsChanged(BlePermissions::evaluate(false, true)));
        screen.apply(BleEvent::Message("Missing permission for scan".into()));
        assert!(!screen.is_scanning);
        assert_eq!(screen.status.message, "Missing permission for scan");
    }

    #[test]
    fn missing_opt_in_is_named() {
        let mut screen = ready_screen();
        screen.apply(BleEvent::PermissionsChanged(BlePermissions::evaluate(true, false)));
        assert_eq!(screen.status.message, "Missing permissions: connect");
    }
}
