//! Pre-scan readiness: debugging authorization and device settings.
//!
//! Authorization cannot be granted from the host; the operator accepts the
//! RSA prompt on the handset while we poll. The setting writes afterwards
//! are independent and idempotent, and any of them may fail without
//! affecting the outcome.

use std::time::Duration;

use pincheck_core::devices::DeviceState;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::device::executor::DeviceExecutor;

/// One best-effort device setting write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupStep {
    pub description: &'static str,
    pub args: &'static [&'static str],
}

/// Settings written before the scan, in order.
pub const SETUP_STEPS: &[SetupStep] = &[
    SetupStep {
        description: "enable developer options",
        args: &["settings", "put", "global", "development_settings_enabled", "1"],
    },
    SetupStep {
        description: "keep USB debugging on",
        args: &["settings", "put", "global", "adb_enabled", "1"],
    },
    SetupStep {
        description: "stay awake while charging",
        args: &["settings", "put", "global", "stay_on_while_plugged_in", "7"],
    },
];

const AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct Negotiator<'a, E> {
    exec: &'a E,
    authorization_timeout: Duration,
    poll_interval: Duration,
}

impl<'a, E: DeviceExecutor> Negotiator<'a, E> {
    pub fn new(exec: &'a E) -> Self {
        Self {
            exec,
            authorization_timeout: AUTHORIZATION_TIMEOUT,
            poll_interval: POLL_INTERVAL,
        }
    }

    #[cfg(test)]
    pub fn with_authorization_timeout(mut self, timeout: Duration) -> Self {
        self.authorization_timeout = timeout;
        self
    }

    /// Make sure the device accepts commands, then apply [`SETUP_STEPS`].
    ///
    /// Returns false only when the device never became authorized.
    pub async fn ensure_ready(&self) -> bool {
        if !self.await_authorization().await {
            return false;
        }
        let applied = self.apply_settings().await;
        info!(
            "Device ready ({}/{} settings applied)",
            applied,
            SETUP_STEPS.len()
        );
        true
    }

    /// Poll `adb get-state` until the device is authorized.
    pub async fn await_authorization(&self) -> bool {
        let deadline = Instant::now() + self.authorization_timeout;
        let mut prompted = false;

        loop {
            match self.device_state().await {
                Some(DeviceState::Device) => return true,
                Some(DeviceState::Unauthorized) => {
                    if !prompted {
                        warn!("Device is unauthorized: accept the USB debugging prompt on the phone");
                        prompted = true;
                    }
                }
                Some(DeviceState::Offline) => {
                    info!("Device is offline, waiting for it to come back");
                }
                Some(DeviceState::Other(state)) => {
                    warn!("Device is in unsupported state '{}'", state);
                    return false;
                }
                None => {
                    warn!("No device answered 'adb get-state'");
                    return false;
                }
            }

            if Instant::now() + self.poll_interval > deadline {
                warn!(
                    "Device was not authorized within {}s",
                    self.authorization_timeout.as_secs()
                );
                return false;
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Run every setup step, returning how many succeeded.
    pub async fn apply_settings(&self) -> usize {
        let mut applied = 0;
        for step in SETUP_STEPS {
            match self.exec.shell_checked(step.args).await {
                Ok(_) => applied += 1,
                Err(e) => warn!("Could not {}: {}", step.description, e),
            }
        }
        applied
    }

    /// adb reports unauthorized/offline devices on stderr with a failing status.
    async fn device_state(&self) -> Option<DeviceState> {
        let output = self.exec.run(&["get-state"]).await.ok()?;
        if output.success {
            return Some(DeviceState::parse(output.stdout.trim()));
        }
        let stderr = output.stderr.to_lowercase();
        if stderr.contains("unauthorized") {
            Some(DeviceState::Unauthorized)
        } else if stderr.contains("offline") {
            Some(DeviceState::Offline)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::ScriptedDevice;

    #[tokio::test]
    async fn test_ready_device_applies_all_settings() {
        let device = ScriptedDevice::new();
        assert!(Negotiator::new(&device).ensure_ready().await);

        let commands = device.commands();
        assert_eq!(commands[0], "get-state");
        assert_eq!(
            &commands[1..],
            &[
                "shell settings put global development_settings_enabled 1",
                "shell settings put global adb_enabled 1",
                "shell settings put global stay_on_while_plugged_in 7",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_setting_does_not_stop_the_rest() {
        let device = ScriptedDevice::new();
        device.fail_command("shell settings put global development_settings_enabled 1");
        let negotiator = Negotiator::new(&device);

        assert_eq!(negotiator.apply_settings().await, 2);
        assert!(negotiator.ensure_ready().await);
        assert_eq!(
            device
                .commands()
                .iter()
                .filter(|c| c.starts_with("shell settings"))
                .count(),
            6
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_authorization() {
        let device = ScriptedDevice::new();
        device.push_get_state("", "error: device unauthorized.\nThis adb server's $ADB_VENDOR_KEYS is not set");
        device.push_get_state("", "error: device unauthorized.");
        device.push_get_state("device\n", "");

        let start = Instant::now();
        assert!(Negotiator::new(&device).await_authorization().await);
        assert_eq!(start.elapsed(), POLL_INTERVAL * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_authorization_timeout() {
        let device = ScriptedDevice::new();
        for _ in 0..100 {
            device.push_get_state("", "error: device unauthorized.");
        }
        let negotiator =
            Negotiator::new(&device).with_authorization_timeout(Duration::from_secs(10));
        assert!(!negotiator.ensure_ready().await);
        assert!(!device.commands().iter().any(|c| c.starts_with("shell")));
    }

    #[tokio::test]
    async fn test_no_device_fails_immediately() {
        let device = ScriptedDevice::new();
        device.push_get_state("", "error: no devices/emulators found");
        assert!(!Negotiator::new(&device).ensure_ready().await);
        assert_eq!(device.commands(), vec!["get-state"]);
    }

    #[tokio::test]
    async fn test_unsupported_state_fails() {
        let device = ScriptedDevice::new();
        device.push_get_state("recovery\n", "");
        assert!(!Negotiator::new(&device).ensure_ready().await);
    }
}
