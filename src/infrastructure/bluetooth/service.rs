//! Bluetooth Service Module
//!
//! Main service that coordinates scanning, the GATT session and permission
//! gating. It runs as a command loop on the Bluetooth thread.

use crate::domain::models::{
    AdapterState, BleEvent, BluetoothCommand, ConnectionState, DiscoveredDevice, ScanFailure,
};
use crate::domain::permissions::BlePermissions;
use crate::domain::settings::SettingsService;
use crate::error::BleError;
use crate::infrastructure::bluetooth::central::{
    AdapterEvent, BleCentral, BtleplugProvider, CentralProvider,
};
use crate::infrastructure::bluetooth::{connection::BleConnection, scanner::BleScanner};
use futures_util::StreamExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Main Bluetooth service coordinating all BLE operations
pub struct BluetoothService {
    provider: Box<dyn CentralProvider>,
    central: Option<Arc<dyn BleCentral>>,
    adapter_state: AdapterState,
    scanner: Option<BleScanner>,
    connection: BleConnection,
    /// Id of the peripheral the session belongs to.
    current: Option<String>,
    adapter_watch: Option<JoinHandle<()>>,
    adapter_tx: mpsc::UnboundedSender<AdapterEvent>,
    adapter_rx: mpsc::UnboundedReceiver<AdapterEvent>,
    permissions: BlePermissions,
    event_sender: mpsc::UnboundedSender<BleEvent>,
    settings: Arc<Mutex<SettingsService>>,
}

impl BluetoothService {
    pub fn new(
        event_sender: mpsc::UnboundedSender<BleEvent>,
        settings: Arc<Mutex<SettingsService>>,
    ) -> Self {
        Self::with_provider(Box::new(BtleplugProvider), event_sender, settings)
    }

    pub fn with_provider(
        provider: Box<dyn CentralProvider>,
        event_sender: mpsc::UnboundedSender<BleEvent>,
        settings: Arc<Mutex<SettingsService>>,
    ) -> Self {
        let (adapter_tx, adapter_rx) = mpsc::unbounded_channel();
        Self {
            provider,
            central: None,
            adapter_state: AdapterState::Unavailable,
            scanner: None,
            connection: BleConnection::new(event_sender.clone()),
            current: None,
            adapter_watch: None,
            adapter_tx,
            adapter_rx,
            permissions: BlePermissions::default(),
            event_sender,
            settings,
        }
    }

    /// Process commands until the sender side goes away, then clean up.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<BluetoothCommand>) {
        self.refresh_permissions(true).await;

        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd).await,
                    None => break,
                },
                Some(event) = self.adapter_rx.recv() => self.on_adapter_event(event).await,
            }
        }

        self.cleanup().await;
        info!("Bluetooth service stopped");
    }

    async fn handle(&mut self, cmd: BluetoothCommand) {
        match cmd {
            BluetoothCommand::StartScan => self.start_scan().await,
            BluetoothCommand::StopScan => self.stop_scan().await,
            BluetoothCommand::Connect(device) => self.connect(device).await,
            BluetoothCommand::Disconnect => self.disconnect().await,
            BluetoothCommand::RefreshPermissions => self.refresh_permissions(true).await,
        }
    }

    /// Start scanning for devices
    pub async fn start_scan(&mut self) {
        self.refresh_permissions(false).await;
        if !self.permissions.scan {
            self.report_permissions();
            self.send_message(BleError::MissingPermission("scan").to_string());
            return;
        }

        let timeout = self.scan_timeout();
        let Some(scanner) = self.scanner.as_mut() else {
            let failure = ScanFailure::AdapterUnavailable(BleError::AdapterUnavailable.to_string());
            let _ = self.event_sender.send(BleEvent::ScanFailed(failure));
            return;
        };
        if scanner.is_scanning() {
            debug!("Ignoring scan request, already scanning");
            return;
        }
        scanner.start(timeout).await;
    }

    /// Stop scanning
    pub async fn stop_scan(&mut self) {
        if let Some(scanner) = self.scanner.as_mut() {
            scanner.stop().await;
        }
    }

    /// Connect to a discovered device and read one characteristic
    pub async fn connect(&mut self, device: DiscoveredDevice) {
        self.stop_scan().await;
        self.close_session().await;
        self.drain_adapter_events().await;

        self.refresh_permissions(false).await;
        if !self.permissions.connect {
            self.report_permissions();
            self.send_message(BleError::MissingPermission("connection").to_string());
            return;
        }

        let Some(central) = self.central.clone() else {
            self.send_message(format!("Connection failed: {}", BleError::AdapterUnavailable));
            return;
        };

        self.current = Some(device.id.clone());
        if let Err(e) = self.connection.establish(central.as_ref(), &device.id).await {
            error!("Connection to {} failed: {}", device.id, e);
            self.current = None;
            if let Err(e) = central.disconnect(&device.id).await {
                warn!("Disconnect after failure: {}", e);
            }
            self.send_message(format!("Connection failed: {}", e));
            self.connection.transition(ConnectionState::Disconnected);
        }
    }

    /// Disconnect from the current device
    pub async fn disconnect(&mut self) {
        if self.close_session().await {
            info!("Disconnected from device");
        }
    }

    pub async fn cleanup(&mut self) {
        self.stop_scan().await;
        self.disconnect().await;
        if let Some(task) = self.adapter_watch.take() {
            task.abort();
        }
    }

    /// Tear down the GATT session, if any. Returns whether one existed.
    async fn close_session(&mut self) -> bool {
        let current = self.current.take();
        if let (Some(id), Some(central)) = (&current, &self.central) {
            if let Err(e) = central.disconnect(id).await {
                warn!("Disconnect failed: {}", e);
            }
        }
        self.connection.transition(ConnectionState::Disconnected);
        current.is_some()
    }

    /// Handle adapter notifications queued while a session was being torn
    /// down, so they cannot hit the next one.
    async fn drain_adapter_events(&mut self) {
        while let Ok(event) = self.adapter_rx.try_recv() {
            self.on_adapter_event(event).await;
        }
    }

    async fn on_adapter_event(&mut self, event: AdapterEvent) {
        match event {
            AdapterEvent::DeviceDisconnected(id) => self.on_link_lost(&id),
            AdapterEvent::StateChanged(state) => self.apply_adapter_state(state, false).await,
            AdapterEvent::DeviceDiscovered(_) | AdapterEvent::DeviceUpdated(_) => {}
        }
    }

    fn on_link_lost(&mut self, id: &str) {
        if self.current.as_deref() != Some(id) {
            debug!("Ignoring disconnect of {}, not the current device", id);
            return;
        }

        info!("Device {} dropped the link", id);
        self.current = None;
        self.connection.transition(ConnectionState::Disconnected);
    }

    async fn apply_adapter_state(&mut self, state: AdapterState, always_report: bool) {
        let changed = state != self.adapter_state;
        self.adapter_state = state;
        if changed || always_report {
            info!(?state, "Adapter state");
            let _ = self
                .event_sender
                .send(BleEvent::AdapterStateChanged(state));
        }
        if changed && state != AdapterState::On {
            self.stop_scan().await;
            self.close_session().await;
        }
        self.update_permissions(always_report);
    }

    /// Re-evaluate permissions, looking for an adapter if none is bound yet.
    async fn refresh_permissions(&mut self, always_report: bool) {
        if self.central.is_none() {
            match self.provider.open().await {
                Ok(central) => self.bind(central).await,
                Err(e) => warn!("No Bluetooth adapter: {}", e),
            }
        }

        let state = match &self.central {
            Some(central) => central.state().await,
            None => AdapterState::Unavailable,
        };
        self.apply_adapter_state(state, always_report).await;
    }

    async fn bind(&mut self, central: Arc<dyn BleCentral>) {
        info!("Bluetooth adapter bound");
        match central.events().await {
            Ok(mut events) => {
                let forward = self.adapter_tx.clone();
                self.adapter_watch = Some(tokio::spawn(async move {
                    while let Some(event) = events.next().await {
                        if matches!(
                            event,
                            AdapterEvent::DeviceDisconnected(_) | AdapterEvent::StateChanged(_)
                        ) && forward.send(event).is_err()
                        {
                            break;
                        }
                    }
                }));
            }
            Err(e) => warn!("Cannot watch adapter events: {}", e),
        }
        self.scanner = Some(BleScanner::new(central.clone(), self.event_sender.clone()));
        self.central = Some(central);
    }

    fn update_permissions(&mut self, always_report: bool) {
        let allow_connections = self
            .settings
            .lock()
            .map(|s| s.get().ble.allow_connections)
            .unwrap_or(false);
        let permissions =
            BlePermissions::evaluate(self.adapter_state == AdapterState::On, allow_connections);

        if always_report || permissions != self.permissions {
            self.permissions = permissions;
            self.report_permissions();
        }
    }

    fn report_permissions(&self) {
        let _ = self
            .event_sender
            .send(BleEvent::PermissionsChanged(self.permissions));
    }

    fn scan_timeout(&self) -> Duration {
        let ms = self
            .settings
            .lock()
            .map(|s| s.get().ble.scan_timeout_ms)
            .unwrap_or(10_000);
        Duration::from_millis(ms)
    }

    fn send_message(&self, message: String) {
        let _ = self.event_sender.send(BleEvent::Message(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{BATTERY_LEVEL_UUID, BATTERY_SERVICE_UUID};
    use crate::infrastructure::bluetooth::central::fake::{FakeCentral, FakeProvider};
    use crate::infrastructure::bluetooth::protocol::ServiceLayout;

    struct Harness {
        commands: mpsc::UnboundedSender<BluetoothCommand>,
        events: mpsc::UnboundedReceiver<BleEvent>,
        _dir: tempfile::TempDir,
    }

    impl Harness {
        fn start(central: Option<Arc<FakeCentral>>, allow_connections: bool) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut settings = SettingsService::with_path(dir.path().join("settings.json"));
            settings.get_mut().ble.allow_connections = allow_connections;
            settings.get_mut().ble.scan_timeout_ms = 5_000;

            let (event_tx, events) = mpsc::unbounded_channel();
            let (commands, command_rx) = mpsc::unbounded_channel();
            let service = BluetoothService::with_provider(
                Box::new(FakeProvider(central)),
                event_tx,
                Arc::new(Mutex::new(settings)),
            );
            tokio::spawn(service.run(command_rx));

            Self {
                commands,
                events,
                _dir: dir,
            }
        }

        fn send(&self, command: BluetoothCommand) {
            self.commands.send(command).unwrap();
        }

        async fn next(&mut self) -> BleEvent {
            tokio::time::timeout(Duration::from_secs(60), self.events.recv())
                .await
                .expect("no event within a minute")
                .expect("service stopped")
        }

        async fn expect(&mut self, expected: &[BleEvent]) {
            for event in expected {
                assert_eq!(&self.next().await, event);
            }
        }

        /// Connect and wait for the battery read.
        async fn connect(&mut self, id: &str) {
            self.send(BluetoothCommand::Connect(device(id)));
            loop {
                if let BleEvent::CharacteristicRead { .. } = self.next().await {
                    return;
                }
            }
        }
    }

    fn device(id: &str) -> DiscoveredDevice {
        DiscoveredDevice {
            id: id.to_string(),
            address: None,
            name: None,
            signal_strength: None,
        }
    }

    fn powered_central() -> Arc<FakeCentral> {
        let central = FakeCentral::new();
        central.set_services(
            vec![ServiceLayout {
                uuid: BATTERY_SERVICE_UUID,
                characteristics: vec![BATTERY_LEVEL_UUID],
            }],
            Some(vec![64]),
        );
        central
    }

    fn state(state: ConnectionState) -> BleEvent {
        BleEvent::ConnectionStateChanged(state)
    }

    fn granted(scan: bool, connect: bool) -> BleEvent {
        BleEvent::PermissionsChanged(BlePermissions { scan, connect })
    }

    async fn ready(central: &Arc<FakeCentral>, allow_connections: bool) -> Harness {
        let mut harness = Harness::start(Some(central.clone()), allow_connections);
        harness
            .expect(&[
                BleEvent::AdapterStateChanged(AdapterState::On),
                granted(true, allow_connections),
            ])
            .await;
        harness
    }

    #[tokio::test(start_paused = true)]
    async fn scan_without_adapter_is_refused() {
        let mut harness = Harness::start(None, true);
        harness
            .expect(&[
                BleEvent::AdapterStateChanged(AdapterState::Unavailable),
                granted(false, false),
            ])
            .await;

        harness.send(BluetoothCommand::StartScan);
        harness
            .expect(&[
                granted(false, false),
                BleEvent::Message("Missing permission for scan".into()),
            ])
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn connect_without_opt_in_is_refused() {
        let central = powered_central();
        let mut harness = ready(&central, false).await;

        harness.send(BluetoothCommand::Connect(device("a")));
        harness
            .expect(&[
                granted(true, false),
                BleEvent::Message("Missing permission for connection".into()),
            ])
            .await;
        assert!(!central.calls().contains(&"connect:a".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn scan_times_out_once() {
        let central = powered_central();
        let mut harness = ready(&central, true).await;

        harness.send(BluetoothCommand::StartScan);
        harness.expect(&[BleEvent::ScanStopped]).await;

        // A late stop must not report a second time
        harness.send(BluetoothCommand::StopScan);
        harness.send(BluetoothCommand::RefreshPermissions);
        harness
            .expect(&[
                BleEvent::AdapterStateChanged(AdapterState::On),
                granted(true, true),
            ])
            .await;
        assert_eq!(central.calls(), ["start_scan", "stop_scan"]);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_stops_the_scan_and_reads() {
        let central = powered_central();
        let mut harness = ready(&central, true).await;

        harness.send(BluetoothCommand::StartScan);
        harness.send(BluetoothCommand::Connect(device("a")));
        harness
            .expect(&[
                BleEvent::ScanStopped,
                state(ConnectionState::Connecting),
                state(ConnectionState::Connected),
                state(ConnectionState::Discovering),
                state(ConnectionState::Ready),
                BleEvent::CharacteristicRead {
                    uuid: BATTERY_LEVEL_UUID,
                    value: vec![64],
                },
            ])
            .await;
        assert_eq!(
            central.calls(),
            ["start_scan", "stop_scan", "connect:a", "read:a"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn connect_closes_the_previous_session() {
        let central = powered_central();
        let mut harness = ready(&central, true).await;

        harness.connect("a").await;
        harness.send(BluetoothCommand::Connect(device("b")));
        harness
            .expect(&[
                state(ConnectionState::Disconnected),
                state(ConnectionState::Connecting),
            ])
            .await;

        let calls = central.calls();
        let closed = calls.iter().position(|c| c == "disconnect:a").unwrap();
        let opened = calls.iter().position(|c| c == "connect:b").unwrap();
        assert!(closed < opened);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_failure_ends_disconnected() {
        let central = powered_central();
        central.fail_connect();
        let mut harness = ready(&central, true).await;

        harness.send(BluetoothCommand::Connect(device("a")));
        assert_eq!(harness.next().await, state(ConnectionState::Connecting));
        match harness.next().await {
            BleEvent::Message(m) => assert!(m.starts_with("Connection failed")),
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(harness.next().await, state(ConnectionState::Disconnected));
        assert!(central.calls().contains(&"disconnect:a".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn link_loss_reports_disconnected() {
        let central = powered_central();
        let mut harness = ready(&central, true).await;

        harness.connect("a").await;
        central.emit(AdapterEvent::DeviceDisconnected("a".into()));
        harness
            .expect(&[state(ConnectionState::Disconnected)])
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn late_disconnect_of_previous_device_is_ignored() {
        let central = powered_central();
        let mut harness = ready(&central, true).await;

        harness.connect("a").await;
        harness.connect("b").await;
        central.emit(AdapterEvent::DeviceDisconnected("a".into()));
        tokio::time::sleep(Duration::from_millis(1)).await;

        // The session on "b" is still up, so closing it reaches the device
        harness.send(BluetoothCommand::Disconnect);
        harness
            .expect(&[state(ConnectionState::Disconnected)])
            .await;
        assert_eq!(central.calls().last().map(String::as_str), Some("disconnect:b"));
    }

    #[tokio::test(start_paused = true)]
    async fn power_off_drops_session_and_permissions() {
        let central = powered_central();
        let mut harness = ready(&central, true).await;

        harness.connect("a").await;
        central.set_state(AdapterState::Off);
        harness
            .expect(&[
                BleEvent::AdapterStateChanged(AdapterState::Off),
                state(ConnectionState::Disconnected),
                granted(false, false),
            ])
            .await;

        harness.send(BluetoothCommand::StartScan);
        harness
            .expect(&[
                granted(false, false),
                BleEvent::Message("Missing permission for scan".into()),
            ])
            .await;

        central.set_state(AdapterState::On);
        harness
            .expect(&[
                BleEvent::AdapterStateChanged(AdapterState::On),
                granted(true, true),
            ])
            .await;
    }
}
