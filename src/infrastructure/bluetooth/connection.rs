//! BLE Connection Module
//!
//! Walks one peripheral through connect, service discovery and a single
//! characteristic read.

use crate::domain::models::{BleEvent, ConnectionState};
use crate::error::BleError;
use crate::infrastructure::bluetooth::central::BleCentral;
use crate::infrastructure::bluetooth::protocol;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Connection state holder; every accepted transition is reported.
pub struct BleConnection {
    state: ConnectionState,
    event_sender: mpsc::UnboundedSender<BleEvent>,
}

impl BleConnection {
    pub fn new(event_sender: mpsc::UnboundedSender<BleEvent>) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            event_sender,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Apply a transition if the state machine allows it.
    pub fn transition(&mut self, next: ConnectionState) -> bool {
        if next == self.state {
            return false;
        }
        if !self.state.can_advance_to(next) {
            warn!(from = ?self.state, to = ?next, "Ignoring out-of-order connection state");
            return false;
        }
        debug!(from = ?self.state, to = ?next, "Connection state");
        self.state = next;
        let _ = self
            .event_sender
            .send(BleEvent::ConnectionStateChanged(next));
        true
    }

    /// Connect, discover and read.
    ///
    /// Connect and discovery failures are returned; the caller reports them
    /// and drops the session. A failed read leaves the link up.
    pub async fn establish(&mut self, central: &dyn BleCentral, id: &str) -> Result<(), BleError> {
        self.transition(ConnectionState::Connecting);

        central.connect(id).await?;
        info!(id, "GATT connected");
        self.transition(ConnectionState::Connected);

        self.transition(ConnectionState::Discovering);
        let layouts = central.discover_services(id).await?;
        info!("Discovered {} services", layouts.len());
        self.transition(ConnectionState::Ready);

        let Some(target) = protocol::select_read_target(&layouts) else {
            self.send_message(BleError::NoCharacteristic.to_string());
            return Ok(());
        };

        info!(uuid = %target.characteristic, "Reading characteristic");
        match central.read(id, target).await {
            Ok(value) => {
                debug!("Read {} bytes: {:02X?}", value.len(), value);
                let _ = self.event_sender.send(BleEvent::CharacteristicRead {
                    uuid: target.characteristic,
                    value,
                });
            }
            Err(e) => {
                warn!("Characteristic read failed: {}", e);
                self.send_message(format!("Read failed: {}", e));
            }
        }

        Ok(())
    }

    fn send_message(&self, message: String) {
        let _ = self.event_sender.send(BleEvent::Message(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{BATTERY_LEVEL_UUID, BATTERY_SERVICE_UUID};
    use crate::infrastructure::bluetooth::central::fake::FakeCentral;
    use crate::infrastructure::bluetooth::protocol::ServiceLayout;

    fn drain(rx: &mut mpsc::UnboundedReceiver<BleEvent>) -> Vec<BleEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn transitions_are_reported_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut connection = BleConnection::new(tx);

        for state in [
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Discovering,
            ConnectionState::Ready,
            ConnectionState::Disconnected,
        ] {
            assert!(connection.transition(state));
        }

        let states: Vec<_> = drain(&mut rx)
            .into_iter()
            .map(|e| match e {
                BleEvent::ConnectionStateChanged(s) => s,
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(
            states,
            [
                ConnectionState::Connecting,
                ConnectionState::Connected,
                ConnectionState::Discovering,
                ConnectionState::Ready,
                ConnectionState::Disconnected,
            ]
        );
    }

    #[test]
    fn skipped_and_repeated_states_are_ignored() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut connection = BleConnection::new(tx);

        assert!(!connection.transition(ConnectionState::Disconnected));
        assert!(!connection.transition(ConnectionState::Ready));
        assert!(connection.transition(ConnectionState::Connecting));
        assert!(!connection.transition(ConnectionState::Connecting));

        assert_eq!(connection.state(), ConnectionState::Connecting);
        assert_eq!(drain(&mut rx).len(), 1);
    }

    fn battery_service() -> Vec<ServiceLayout> {
        vec![ServiceLayout {
            uuid: BATTERY_SERVICE_UUID,
            characteristics: vec![BATTERY_LEVEL_UUID],
        }]
    }

    fn states(events: &[BleEvent]) -> Vec<ConnectionState> {
        events
            .iter()
            .filter_map(|e| match e {
                BleEvent::ConnectionStateChanged(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn establish_reads_the_battery_level() {
        let central = FakeCentral::new();
        central.set_services(battery_service(), Some(vec![87]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut connection = BleConnection::new(tx);

        connection.establish(central.as_ref(), "dev").await.unwrap();

        let events = drain(&mut rx);
        assert_eq!(
            states(&events),
            [
                ConnectionState::Connecting,
                ConnectionState::Connected,
                ConnectionState::Discovering,
                ConnectionState::Ready,
            ]
        );
        assert_eq!(
            events.last(),
            Some(&BleEvent::CharacteristicRead {
                uuid: BATTERY_LEVEL_UUID,
                value: vec![87],
            })
        );
        assert_eq!(central.calls(), ["connect:dev", "read:dev"]);
    }

    #[tokio::test]
    async fn no_characteristic_keeps_the_link() {
        let central = FakeCentral::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut connection = BleConnection::new(tx);

        connection.establish(central.as_ref(), "dev").await.unwrap();

        assert_eq!(connection.state(), ConnectionState::Ready);
        assert_eq!(
            drain(&mut rx).last(),
            Some(&BleEvent::Message("No readable characteristic found".into()))
        );
    }

    #[tokio::test]
    async fn read_failure_is_reported_as_message() {
        let central = FakeCentral::new();
        central.set_services(battery_service(), None);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut connection = BleConnection::new(tx);

        connection.establish(central.as_ref(), "dev").await.unwrap();

        assert_eq!(connection.state(), ConnectionState::Ready);
        match drain(&mut rx).last() {
            Some(BleEvent::Message(m)) => assert!(m.starts_with("Read failed")),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn connect_failure_is_returned() {
        let central = FakeCentral::new();
        central.fail_connect();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut connection = BleConnection::new(tx);

        assert!(connection.establish(central.as_ref(), "dev").await.is_err());
        assert_eq!(states(&drain(&mut rx)), [ConnectionState::Connecting]);
        assert_eq!(connection.state(), ConnectionState::Connecting);
    }
}
