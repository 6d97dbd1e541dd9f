//! Parsing of `adb devices` listings.

use serde::{Deserialize, Serialize};

/// Connection state reported for a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    /// Connected and authorized.
    Device,
    /// Connected, but the host key has not been accepted on the handset.
    Unauthorized,
    Offline,
    /// Anything else (`recovery`, `sideload`, `no permissions`, ...).
    Other(String),
}

impl DeviceState {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "device" => DeviceState::Device,
            "unauthorized" => DeviceState::Unauthorized,
            "offline" => DeviceState::Offline,
            other => DeviceState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DeviceState::Device => "device",
            DeviceState::Unauthorized => "unauthorized",
            DeviceState::Offline => "offline",
            DeviceState::Other(s) => s,
        }
    }
}

/// One row of `adb devices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub serial: String,
    pub state: DeviceState,
}

/// Parse the output of `adb devices`.
///
/// Skips the header and the `* daemon ...` banner lines adb prints when it
/// has to start its server.
pub fn parse_device_list(output: &str) -> Vec<DeviceEntry> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with("List of devices") && !line.starts_with('*'))
        .filter_map(|line| {
            let mut parts = line.splitn(2, char::is_whitespace);
            let serial = parts.next()?.to_string();
            let state = DeviceState::parse(parts.next().unwrap_or(""));
            Some(DeviceEntry { serial, state })
        })
        .collect()
}
