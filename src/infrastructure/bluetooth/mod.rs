//! Bluetooth Module
//!
//! BLE inspector: scan, connect, discover, read one characteristic.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    BluetoothService                      │
//! │   (command loop, permissions, single GATT session)       │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┼─────────────┐
//!         │             │             │
//!         ▼             ▼             ▼
//! ┌───────────┐  ┌────────────┐  ┌────────────┐
//! │  Scanner  │  │ Connection │  │  Protocol  │
//! │           │  │            │  │            │
//! │ - timeout │  │ - connect  │  │ - service  │
//! │ - dedup   │  │ - discover │  │   layouts  │
//! │           │  │ - read     │  │ - target   │
//! └─────┬─────┘  └─────┬──────┘  └────────────┘
//!       │              │
//!       ▼              ▼
//! ┌─────────────────────────────┐
//! │    Central (BleCentral)     │
//! │ - adapter power, link loss  │
//! │ - btleplug adapter calls    │
//! └─────────────────────────────┘
//! ```
//!
//! Results travel to the UI as [`BleEvent`](crate::domain::models::BleEvent)s.

pub mod central;
pub mod connection;
pub mod protocol;
pub mod scanner;
pub mod service;

pub use service::BluetoothService;
