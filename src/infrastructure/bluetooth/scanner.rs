//! BLE Scanner Module
//!
//! Time-boxed discovery with per-scan address deduplication.

use crate::domain::models::{BleEvent, ScanFailure};
use crate::infrastructure::bluetooth::central::{AdapterEvent, BleCentral};
use futures_util::StreamExt;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Scan bookkeeping shared between the scanner and its event task.
#[derive(Debug, Default)]
pub struct ScanTracker {
    scanning: bool,
    generation: u64,
    seen: HashSet<String>,
}

impl ScanTracker {
    /// Returns the new scan's generation, or `None` if a scan is running.
    pub fn begin(&mut self) -> Option<u64> {
        if self.scanning {
            return None;
        }
        self.scanning = true;
        self.generation += 1;
        self.seen.clear();
        Some(self.generation)
    }

    /// Whether a result should be reported. Results without an address are
    /// never deduplicated.
    pub fn observe(&mut self, address: Option<&str>) -> bool {
        if !self.scanning {
            return false;
        }
        match address {
            Some(address) => self.seen.insert(address.to_string()),
            None => true,
        }
    }

    /// Marks the scan stopped. A stale `generation` (a timer from an earlier
    /// scan) is ignored. Returns `true` only for the call that actually stops.
    pub fn finish(&mut self, generation: Option<u64>) -> bool {
        if !self.scanning {
            return false;
        }
        if generation.is_some_and(|g| g != self.generation) {
            return false;
        }
        self.scanning = false;
        true
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }
}

fn lock(tracker: &Mutex<ScanTracker>) -> MutexGuard<'_, ScanTracker> {
    tracker.lock().unwrap_or_else(PoisonError::into_inner)
}

/// BLE Scanner bound to one adapter
pub struct BleScanner {
    central: Arc<dyn BleCentral>,
    tracker: Arc<Mutex<ScanTracker>>,
    task: Option<JoinHandle<()>>,
    event_sender: mpsc::UnboundedSender<BleEvent>,
}

impl BleScanner {
    pub fn new(central: Arc<dyn BleCentral>, event_sender: mpsc::UnboundedSender<BleEvent>) -> Self {
        Self {
            central,
            tracker: Arc::new(Mutex::new(ScanTracker::default())),
            task: None,
            event_sender,
        }
    }

    /// Start scanning; stops by itself after `timeout`.
    pub async fn start(&mut self, timeout: Duration) {
        let generation = lock(&self.tracker).begin();
        let Some(generation) = generation else {
            debug!("Scan already running");
            return;
        };

        info!(timeout_ms = timeout.as_millis() as u64, "Starting BLE scan");

        let events = match self.central.events().await {
            Ok(events) => events,
            Err(e) => {
                self.fail(ScanFailure::StartFailed(e.to_string())).await;
                return;
            }
        };

        if let Err(e) = self.central.start_scan().await {
            self.fail(ScanFailure::StartFailed(e.to_string())).await;
            return;
        }

        let central = self.central.clone();
        let tracker = self.tracker.clone();
        let sender = self.event_sender.clone();

        self.task = Some(tokio::spawn(async move {
            let mut events = events;
            let deadline = tokio::time::sleep(timeout);
            tokio::pin!(deadline);

            loop {
                tokio::select! {
                    _ = &mut deadline => {
                        info!("Scan timeout reached");
                        break;
                    }
                    event = events.next() => match event {
                        Some(AdapterEvent::DeviceDiscovered(id)) => {
                            report(central.as_ref(), &tracker, &sender, &id, true).await;
                        }
                        Some(AdapterEvent::DeviceUpdated(id)) => {
                            report(central.as_ref(), &tracker, &sender, &id, false).await;
                        }
                        Some(_) => {}
                        None => {
                            warn!("Adapter event stream ended during scan");
                            let _ = sender.send(BleEvent::ScanFailed(ScanFailure::EventStreamClosed));
                            break;
                        }
                    }
                }
            }

            finish(central.as_ref(), &tracker, &sender, Some(generation)).await;
        }));
    }

    /// Stop scanning. Emits `ScanStopped` only if a scan was running.
    pub async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        finish(self.central.as_ref(), &self.tracker, &self.event_sender, None).await;
    }

    pub fn is_scanning(&self) -> bool {
        lock(&self.tracker).is_scanning()
    }

    async fn fail(&mut self, failure: ScanFailure) {
        warn!(?failure, "BLE scan failed");
        let _ = self.event_sender.send(BleEvent::ScanFailed(failure));
        self.stop().await;
    }
}

impl Drop for BleScanner {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn finish(
    central: &dyn BleCentral,
    tracker: &Mutex<ScanTracker>,
    sender: &mpsc::UnboundedSender<BleEvent>,
    generation: Option<u64>,
) {
    if !lock(tracker).finish(generation) {
        return;
    }
    info!("Stopping BLE scan");
    if let Err(e) = central.stop_scan().await {
        debug!("stop_scan: {}", e);
    }
    let _ = sender.send(BleEvent::ScanStopped);
}

async fn report(
    central: &dyn BleCentral,
    tracker: &Mutex<ScanTracker>,
    sender: &mpsc::UnboundedSender<BleEvent>,
    id: &str,
    first_sighting: bool,
) {
    let device = match central.device(id).await {
        Ok(device) => device,
        Err(e) => {
            debug!("Discovered peripheral vanished: {}", e);
            return;
        }
    };

    // Address-less devices would repeat on every advertisement update
    if device.address.is_none() && !first_sighting {
        return;
    }
    if !lock(tracker).observe(device.address.as_deref()) {
        return;
    }

    debug!(id = %device.id, name = ?device.name, "Device found");
    let _ = sender.send(BleEvent::DeviceFound(device));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::DiscoveredDevice;
    use crate::infrastructure::bluetooth::central::fake::FakeCentral;

    #[test]
    fn begin_is_ignored_while_scanning() {
        let mut tracker = ScanTracker::default();
        assert_eq!(tracker.begin(), Some(1));
        assert_eq!(tracker.begin(), None);
        assert!(tracker.is_scanning());
    }

    #[test]
    fn addresses_are_reported_once_per_scan() {
        let mut tracker = ScanTracker::default();
        tracker.begin();
        assert!(tracker.observe(Some("AA:BB:CC:DD:EE:FF")));
        assert!(!tracker.observe(Some("AA:BB:CC:DD:EE:FF")));
        assert!(tracker.observe(Some("11:22:33:44:55:66")));
        assert!(tracker.observe(None));
        assert!(tracker.observe(None));

        tracker.finish(None);
        tracker.begin();
        assert!(tracker.observe(Some("AA:BB:CC:DD:EE:FF")));
    }

    #[test]
    fn nothing_is_reported_when_idle() {
        let mut tracker = ScanTracker::default();
        assert!(!tracker.observe(Some("AA:BB:CC:DD:EE:FF")));
    }

    #[test]
    fn stop_happens_once() {
        let mut tracker = ScanTracker::default();
        let generation = tracker.begin();
        assert!(tracker.finish(None));
        assert!(!tracker.finish(generation));
        assert!(!tracker.finish(None));
    }

    #[test]
    fn stale_timer_does_not_stop_new_scan() {
        let mut tracker = ScanTracker::default();
        let first = tracker.begin();
        tracker.finish(None);
        let second = tracker.begin();
        assert_ne!(first, second);

        assert!(!tracker.finish(first));
        assert!(tracker.is_scanning());
        assert!(tracker.finish(second));
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<BleEvent>) -> Vec<BleEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn found(events: &[BleEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                BleEvent::DeviceFound(DiscoveredDevice { id, .. }) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_stops_the_scan_once() {
        let central = FakeCentral::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scanner = BleScanner::new(central.clone(), tx);

        scanner.start(Duration::from_secs(10)).await;
        assert!(scanner.is_scanning());

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(!scanner.is_scanning());

        scanner.stop().await;
        assert_eq!(drain(&mut rx), [BleEvent::ScanStopped]);
        assert_eq!(central.calls(), ["start_scan", "stop_scan"]);
    }

    #[tokio::test(start_paused = true)]
    async fn sightings_are_deduplicated_by_address() {
        let central = FakeCentral::new();
        central.add_device("a", Some("AA:AA:AA:AA:AA:AA"));
        central.add_device("b", Some("BB:BB:BB:BB:BB:BB"));
        central.add_device("anon", None);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scanner = BleScanner::new(central.clone(), tx);

        scanner.start(Duration::from_secs(5)).await;
        central.emit(AdapterEvent::DeviceDiscovered("a".into()));
        central.emit(AdapterEvent::DeviceUpdated("a".into()));
        central.emit(AdapterEvent::DeviceDiscovered("anon".into()));
        central.emit(AdapterEvent::DeviceUpdated("anon".into()));
        central.emit(AdapterEvent::DeviceDiscovered("gone".into()));
        central.emit(AdapterEvent::DeviceUpdated("b".into()));
        tokio::time::sleep(Duration::from_secs(6)).await;

        let events = drain(&mut rx);
        assert_eq!(found(&events), ["a", "anon", "b"]);
        assert_eq!(events.last(), Some(&BleEvent::ScanStopped));
    }

    #[tokio::test(start_paused = true)]
    async fn start_failure_reports_then_stops() {
        let central = FakeCentral::new();
        central.fail_start();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scanner = BleScanner::new(central.clone(), tx);

        scanner.start(Duration::from_secs(10)).await;
        assert!(!scanner.is_scanning());

        let events = drain(&mut rx);
        assert!(matches!(
            events.as_slice(),
            [
                BleEvent::ScanFailed(ScanFailure::StartFailed(_)),
                BleEvent::ScanStopped
            ]
        ));
    }
}
