//! Operator-friendly error types with suggestions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error categories for a pincheck run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No device reachable, or the transport tool is missing.
    Connectivity,
    /// A single device command failed.
    TransportCommand,
    /// Device output did not match the expected pattern.
    Parse,
    /// The operator cancelled the run.
    Interrupted,
    Unexpected,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Connectivity => write!(f, "CONNECTIVITY"),
            ErrorCode::TransportCommand => write!(f, "TRANSPORT_COMMAND"),
            ErrorCode::Parse => write!(f, "PARSE"),
            ErrorCode::Interrupted => write!(f, "INTERRUPTED"),
            ErrorCode::Unexpected => write!(f, "UNEXPECTED"),
        }
    }
}

/// An error with context the operator can act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinError {
    pub code: ErrorCode,
    pub message: String,
    pub suggestion: Option<String>,
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (hint: {})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for PinError {}

impl PinError {
    /// The transport binary could not be spawned.
    pub fn adb_missing(program: &str) -> Self {
        Self {
            code: ErrorCode::Connectivity,
            message: format!("ADB is not installed or '{}' is not executable", program),
            suggestion: Some(
                "Install it with 'sudo apt install adb' (Debian/Ubuntu), \
                 'sudo pacman -S android-tools' (Arch) or 'sudo dnf install android-tools' (Fedora), \
                 or point --adb / PINCHECK_ADB at the binary"
                    .into(),
            ),
        }
    }

    pub fn no_device() -> Self {
        Self {
            code: ErrorCode::Connectivity,
            message: "No Android device connected".to_string(),
            suggestion: Some(
                "Connect the device via USB, enable USB debugging in Developer options, \
                 accept the debugging prompt, then run 'adb devices' to verify"
                    .into(),
            ),
        }
    }

    /// The device is visible but not ready for commands.
    pub fn device_not_ready(state: &str) -> Self {
        Self {
            code: ErrorCode::Connectivity,
            message: format!("Device is not ready (state: {})", state),
            suggestion: Some(
                "Accept the USB debugging prompt on the device, or reconnect the cable".into(),
            ),
        }
    }

    /// More than one device is attached and none was selected.
    pub fn multiple_devices(serials: &[String]) -> Self {
        Self {
            code: ErrorCode::Connectivity,
            message: format!(
                "{} devices connected ({})",
                serials.len(),
                serials.join(", ")
            ),
            suggestion: Some("Select one with --serial or ANDROID_SERIAL".into()),
        }
    }

    pub fn command_failed(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::TransportCommand,
            message: message.into(),
            suggestion: Some("Check the USB connection and that the device is still listed by 'adb devices'".into()),
        }
    }

    /// Create a command failed error with stderr output included.
    pub fn command_failed_with_stderr(message: impl Into<String>, stderr: Option<&str>) -> Self {
        let msg = message.into();
        let full_message = match stderr {
            Some(err) if !err.trim().is_empty() => format!("{}\nstderr: {}", msg, err.trim()),
            _ => msg,
        };
        Self {
            code: ErrorCode::TransportCommand,
            message: full_message,
            suggestion: Some("Check the USB connection and the device's authorization state".into()),
        }
    }

    pub fn parse_failed(what: &str, output: &str) -> Self {
        let snippet: String = output.trim().chars().take(80).collect();
        Self {
            code: ErrorCode::Parse,
            message: format!("Could not parse {} from device output: '{}'", what, snippet),
            suggestion: Some("The device may use a different output format; defaults will be used".into()),
        }
    }

    pub fn interrupted() -> Self {
        Self {
            code: ErrorCode::Interrupted,
            message: "Interrupted by operator".to_string(),
            suggestion: Some("Re-run pincheck to start a new scan from 0000".into()),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Unexpected,
            message: message.into(),
            suggestion: Some("This is an internal error. Please report it if it persists.".into()),
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self.code {
            ErrorCode::Interrupted => 0,
            _ => 1,
        }
    }
}
