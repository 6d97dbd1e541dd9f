//! Gesture primitives: wake, swipe, and keypad entry.
//!
//! Each primitive is a short series of device commands followed by a fixed
//! settle delay. They change on-device state and must not overlap.

use pincheck_core::candidate::{Candidate, KEYCODE_CONFIRM, KEYCODE_DELETE, PIN_LENGTH};
use pincheck_core::error::PinError;
use pincheck_core::geometry::ScreenGeometry;
use pincheck_core::timing::Timing;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::device::executor::{DeviceExecutor, TransportError};

/// Android `KEYCODE_WAKEUP`. Unlike the power key it never turns the screen off.
const KEYCODE_WAKEUP: u8 = 224;

/// Which unlock swipe to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeKind {
    /// Initial unlock: slower swipe, longer settle.
    Full,
    /// After a cooldown, to dismiss the lockout banner.
    Recovery,
}

/// Query the physical screen size.
pub async fn query_geometry<E: DeviceExecutor>(exec: &E) -> Result<ScreenGeometry, PinError> {
    let output = exec.shell_checked(&["wm", "size"]).await?;
    ScreenGeometry::parse_wm_size(&output.stdout)
}

pub struct Gestures<'a, E> {
    exec: &'a E,
    timing: &'a Timing,
    geometry: ScreenGeometry,
}

impl<'a, E: DeviceExecutor> Gestures<'a, E> {
    pub fn new(exec: &'a E, timing: &'a Timing, geometry: ScreenGeometry) -> Self {
        Self {
            exec,
            timing,
            geometry,
        }
    }

    /// Wake the screen and keep it on while the scan runs.
    ///
    /// Only the wake key is required to succeed; the stay-awake settings are
    /// best effort.
    pub async fn wake_and_hold_screen(&self) -> Result<(), PinError> {
        self.keyevent(KEYCODE_WAKEUP).await?;

        let timeout_ms = self.timing.screen_off_timeout.as_millis().to_string();
        let holds: [&[&str]; 2] = [
            &["svc", "power", "stayon", "true"],
            &["settings", "put", "system", "screen_off_timeout", timeout_ms.as_str()],
        ];
        for args in holds {
            if let Err(e) = self.exec.shell_checked(args).await {
                warn!("Could not keep screen awake ({}): {}", args.join(" "), e);
            }
        }
        Ok(())
    }

    /// Swipe up the middle of the screen, then wait for the UI to settle.
    pub async fn unlock_swipe(&self, kind: SwipeKind) -> Result<(), PinError> {
        let (duration, settle) = match kind {
            SwipeKind::Full => (self.timing.swipe_duration, self.timing.swipe_settle),
            SwipeKind::Recovery => (
                self.timing.recovery_swipe_duration,
                self.timing.recovery_swipe_settle,
            ),
        };
        let path = self.geometry.unlock_swipe();
        let coords = [
            path.start.0.to_string(),
            path.start.1.to_string(),
            path.end.0.to_string(),
            path.end.1.to_string(),
            duration.as_millis().to_string(),
        ];

        let mut args = vec!["input", "swipe"];
        args.extend(coords.iter().map(String::as_str));
        self.exec.shell_checked(&args).await?;
        sleep(settle).await;
        Ok(())
    }

    /// Type `candidate` on the keypad and confirm it.
    ///
    /// Every digit is attempted even when an earlier keystroke fails. The
    /// confirm key is only sent when all digits landed; otherwise the field
    /// is cleared so leftovers don't prefix the next candidate.
    pub async fn enter_digits(&self, candidate: Candidate) -> Result<(), PinError> {
        let mut failures: Vec<TransportError> = Vec::new();
        for code in candidate.keycodes() {
            if let Err(e) = self.keyevent(code).await {
                failures.push(e);
            }
            sleep(self.timing.key_delay).await;
        }

        if let Some(first) = failures.into_iter().next() {
            self.clear_entry().await;
            return Err(PinError::command_failed(format!(
                "Failed to enter PIN {}: {}",
                candidate, first
            )));
        }

        self.keyevent(KEYCODE_CONFIRM).await?;
        sleep(self.timing.confirm_settle).await;
        debug!("Entered {}", candidate);
        Ok(())
    }

    async fn clear_entry(&self) {
        for _ in 0..PIN_LENGTH {
            if self.keyevent(KEYCODE_DELETE).await.is_err() {
                break;
            }
        }
    }

    async fn keyevent(&self, code: u8) -> Result<(), TransportError> {
        let code = code.to_string();
        self.exec
            .shell_checked(&["input", "keyevent", code.as_str()])
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::device::testing::ScriptedDevice;
    use pincheck_core::error::ErrorCode;

    fn pin(s: &str) -> Candidate {
        s.parse().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_digits_sends_keycodes_then_confirm() {
        let device = ScriptedDevice::new();
        let timing = Timing::default();
        let gestures = Gestures::new(&device, &timing, ScreenGeometry::default());

        gestures.enter_digits(pin("0429")).await.unwrap();

        assert_eq!(
            device.commands(),
            vec![
                "shell input keyevent 7",
                "shell input keyevent 11",
                "shell input keyevent 9",
                "shell input keyevent 16",
                "shell input keyevent 66",
            ]
        );
        assert_eq!(device.entered(), vec!["0429"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_digits_spaces_keystrokes() {
        let device = ScriptedDevice::new();
        let timing = Timing::default();
        let gestures = Gestures::new(&device, &timing, ScreenGeometry::default());

        let start = tokio::time::Instant::now();
        gestures.enter_digits(pin("1111")).await.unwrap();

        let times = device.timed_commands();
        for pair in times.windows(2) {
            assert!(pair[1].0 - pair[0].0 >= timing.key_delay);
        }
        // 4 key delays + confirm settle
        assert_eq!(start.elapsed(), Duration::from_millis(4 * 100 + 500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_digit_still_attempts_all_and_skips_confirm() {
        let device = ScriptedDevice::new();
        device.fail_command("shell input keyevent 8");
        let timing = Timing::default();
        let gestures = Gestures::new(&device, &timing, ScreenGeometry::default());

        let err = gestures.enter_digits(pin("1234")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TransportCommand);
        assert!(err.message.contains("1234"));

        let commands = device.commands();
        let digits: Vec<&String> = commands
            .iter()
            .filter(|c| !c.ends_with(" 66") && !c.ends_with(" 67"))
            .collect();
        assert_eq!(digits.len(), 4);
        assert!(!commands.iter().any(|c| c == "shell input keyevent 66"));
        assert_eq!(
            commands.iter().filter(|c| *c == "shell input keyevent 67").count(),
            4
        );
        assert!(device.entered().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlock_swipe_uses_geometry() {
        let device = ScriptedDevice::new();
        let timing = Timing::default();
        let geometry = ScreenGeometry {
            width: 1440,
            height: 3200,
        };
        let gestures = Gestures::new(&device, &timing, geometry);

        gestures.unlock_swipe(SwipeKind::Full).await.unwrap();
        gestures.unlock_swipe(SwipeKind::Recovery).await.unwrap();

        assert_eq!(
            device.commands(),
            vec![
                "shell input swipe 720 2560 720 640 100",
                "shell input swipe 720 2560 720 640 50",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlock_swipe_failure_is_error() {
        let device = ScriptedDevice::new();
        device.fail_command("shell input swipe 540 1920 540 480 100");
        let timing = Timing::default();
        let gestures = Gestures::new(&device, &timing, ScreenGeometry::default());

        assert!(gestures.unlock_swipe(SwipeKind::Full).await.is_err());
    }

    #[tokio::test]
    async fn test_wake_and_hold_tolerates_settings_failure() {
        let device = ScriptedDevice::new();
        device.fail_command("shell svc power stayon true");
        let timing = Timing::default();
        let gestures = Gestures::new(&device, &timing, ScreenGeometry::default());

        gestures.wake_and_hold_screen().await.unwrap();
        assert_eq!(
            device.commands(),
            vec![
                "shell input keyevent 224",
                "shell svc power stayon true",
                "shell settings put system screen_off_timeout 1800000",
            ]
        );
    }

    #[tokio::test]
    async fn test_wake_failure_is_error() {
        let device = ScriptedDevice::new();
        device.fail_command("shell input keyevent 224");
        let timing = Timing::default();
        let gestures = Gestures::new(&device, &timing, ScreenGeometry::default());

        assert!(gestures.wake_and_hold_screen().await.is_err());
        assert_eq!(device.commands().len(), 1);
    }

    #[tokio::test]
    async fn test_query_geometry() {
        let device = ScriptedDevice::new();
        device.set_wm_size_output(Some("Physical size: 720x1600\n"));
        let g = query_geometry(&device).await.unwrap();
        assert_eq!((g.width, g.height), (720, 1600));

        device.set_wm_size_output(None);
        let err = query_geometry(&device).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TransportCommand);

        device.set_wm_size_output(Some("nonsense"));
        let err = query_geometry(&device).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Parse);
    }
}
