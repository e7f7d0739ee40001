//! GATT identifiers and read-target selection.

use crate::domain::models::{BATTERY_LEVEL_UUID, BATTERY_SERVICE_UUID};
use uuid::Uuid;

/// Minimal view of a discovered service, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLayout {
    pub uuid: Uuid,
    pub characteristics: Vec<Uuid>,
}

/// Which characteristic to read after discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTarget {
    pub service: Uuid,
    pub characteristic: Uuid,
}

/// Battery level when the device exposes it, otherwise the first
/// characteristic of the first service.
pub fn select_read_target(services: &[ServiceLayout]) -> Option<ReadTarget> {
    let battery = services
        .iter()
        .find(|s| s.uuid == BATTERY_SERVICE_UUID)
        .filter(|s| s.characteristics.contains(&BATTERY_LEVEL_UUID));
    if battery.is_some() {
        return Some(ReadTarget {
            service: BATTERY_SERVICE_UUID,
            characteristic: BATTERY_LEVEL_UUID,
        });
    }

    let first = services.first()?;
    first.characteristics.first().map(|&characteristic| ReadTarget {
        service: first.uuid,
        characteristic,
    })
}
