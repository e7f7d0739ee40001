//! Runtime gates for BLE operations.
//!
//! On the desktop the OS grants Bluetooth access per process, so "scan" means
//! an adapter is bound and powered on, and "connect" additionally requires
//! the user to have allowed connections in the settings.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlePermissions {
    pub scan: bool,
    pub connect: bool,
}

impl BlePermissions {
    pub fn evaluate(adapter_on: bool, allow_connections: bool) -> Self {
        Self {
            scan: adapter_on,
            connect: adapter_on && allow_connections,
        }
    }

    pub fn all_granted(&self) -> bool {
        self.scan && self.connect
    }

    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.scan {
            missing.push("scan");
        }
        if !self.connect {
            missing.push("connect");
        }
        missing
    }
}
