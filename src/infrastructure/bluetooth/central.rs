//! BLE Central Module
//!
//! The adapter and peripheral calls the service needs, behind a trait so the
//! scan and connect flows run the same against btleplug and in tests.

use crate::domain::models::{AdapterState, DiscoveredDevice};
use crate::error::BleError;
use crate::infrastructure::bluetooth::protocol::{ReadTarget, ServiceLayout};
use async_trait::async_trait;
use btleplug::api::{
    BDAddr, Central, CentralEvent, CentralState, Manager as _, Peripheral as _, ScanFilter,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures_util::future;
use futures_util::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use tracing::{debug, info};

/// Adapter notifications, with peripherals named by their id string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    DeviceDiscovered(String),
    DeviceUpdated(String),
    DeviceDisconnected(String),
    StateChanged(AdapterState),
}

#[async_trait]
pub trait BleCentral: Send + Sync {
    /// A fresh subscription to adapter notifications.
    async fn events(&self) -> Result<BoxStream<'static, AdapterEvent>, BleError>;

    async fn state(&self) -> AdapterState;

    async fn start_scan(&self) -> Result<(), BleError>;

    async fn stop_scan(&self) -> Result<(), BleError>;

    /// Current snapshot of a known peripheral.
    async fn device(&self, id: &str) -> Result<DiscoveredDevice, BleError>;

    async fn connect(&self, id: &str) -> Result<(), BleError>;

    async fn discover_services(&self, id: &str) -> Result<Vec<ServiceLayout>, BleError>;

    async fn read(&self, id: &str, target: ReadTarget) -> Result<Vec<u8>, BleError>;

    async fn disconnect(&self, id: &str) -> Result<(), BleError>;
}

/// Opens the central. Called again on every permission refresh until an
/// adapter turns up.
#[async_trait]
pub trait CentralProvider: Send + Sync {
    async fn open(&self) -> Result<Arc<dyn BleCentral>, BleError>;
}

pub struct BtleplugProvider;

#[async_trait]
impl CentralProvider for BtleplugProvider {
    async fn open(&self) -> Result<Arc<dyn BleCentral>, BleError> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(BleError::AdapterUnavailable)?;
        if let Ok(info) = adapter.adapter_info().await {
            info!("Using adapter {}", info);
        }
        Ok(Arc::new(BtleplugCentral {
            _manager: manager,
            adapter,
        }))
    }
}

/// The first system adapter. The manager is held for the adapter's lifetime.
pub struct BtleplugCentral {
    _manager: Manager,
    adapter: Adapter,
}

impl BtleplugCentral {
    async fn peripheral(&self, id: &str) -> Result<Peripheral, BleError> {
        self.adapter
            .peripherals()
            .await?
            .into_iter()
            .find(|p| p.id().to_string() == id)
            .ok_or_else(|| BleError::UnknownDevice(id.to_string()))
    }
}

fn map_state(state: CentralState) -> AdapterState {
    match state {
        CentralState::PoweredOff => AdapterState::Off,
        // Platforms that cannot tell are treated as powered
        _ => AdapterState::On,
    }
}

fn map_event(event: CentralEvent) -> Option<AdapterEvent> {
    match event {
        CentralEvent::DeviceDiscovered(id) => Some(AdapterEvent::DeviceDiscovered(id.to_string())),
        CentralEvent::DeviceUpdated(id) => Some(AdapterEvent::DeviceUpdated(id.to_string())),
        CentralEvent::DeviceDisconnected(id) => {
            Some(AdapterEvent::DeviceDisconnected(id.to_string()))
        }
        CentralEvent::StateUpdate(state) => Some(AdapterEvent::StateChanged(map_state(state))),
        _ => None,
    }
}

#[async_trait]
impl BleCentral for BtleplugCentral {
    async fn events(&self) -> Result<BoxStream<'static, AdapterEvent>, BleError> {
        let events = self.adapter.events().await?;
        Ok(events
            .filter_map(|e| future::ready(map_event(e)))
            .boxed())
    }

    async fn state(&self) -> AdapterState {
        match self.adapter.adapter_state().await {
            Ok(state) => map_state(state),
            Err(e) => {
                debug!("adapter_state: {}", e);
                AdapterState::On
            }
        }
    }

    async fn start_scan(&self) -> Result<(), BleError> {
        Ok(self.adapter.start_scan(ScanFilter::default()).await?)
    }

    async fn stop_scan(&self) -> Result<(), BleError> {
        Ok(self.adapter.stop_scan().await?)
    }

    async fn device(&self, id: &str) -> Result<DiscoveredDevice, BleError> {
        let peripheral = self.peripheral(id).await?;

        // CoreBluetooth hides addresses and reports all zeroes
        let address = Some(peripheral.address())
            .filter(|a| *a != BDAddr::from([0u8; 6]))
            .map(|a| a.to_string());
        let properties = peripheral.properties().await.ok().flatten();

        Ok(DiscoveredDevice {
            id: id.to_string(),
            address,
            name: properties.as_ref().and_then(|p| p.local_name.clone()),
            signal_strength: properties.as_ref().and_then(|p| p.rssi),
        })
    }

    async fn connect(&self, id: &str) -> Result<(), BleError> {
        let peripheral = self.peripheral(id).await?;
        if !peripheral.is_connected().await.unwrap_or(false) {
            peripheral.connect().await?;
        }
        Ok(())
    }

    async fn discover_services(&self, id: &str) -> Result<Vec<ServiceLayout>, BleError> {
        let peripheral = self.peripheral(id).await?;
        peripheral.discover_services().await?;
        Ok(peripheral
            .services()
            .iter()
            .map(|s| ServiceLayout {
                uuid: s.uuid,
                characteristics: s.characteristics.iter().map(|c| c.uuid).collect(),
            })
            .collect())
    }

    async fn read(&self, id: &str, target: ReadTarget) -> Result<Vec<u8>, BleError> {
        let peripheral = self.peripheral(id).await?;
        let characteristic = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.service_uuid == target.service && c.uuid == target.characteristic)
            .ok_or(BleError::NoCharacteristic)?;
        Ok(peripheral.read(&characteristic).await?)
    }

    async fn disconnect(&self, id: &str) -> Result<(), BleError> {
        let peripheral = self.peripheral(id).await?;
        Ok(peripheral.disconnect().await?)
    }
}
