//! Device command transport over `adb`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use pincheck_core::devices::{parse_device_list, DeviceEntry, DeviceState};
use pincheck_core::error::PinError;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Upper bound on a single adb invocation.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(15);

/// Captured result of a device command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Turn a non-zero exit into an error.
    pub fn into_checked(self, command: &[&str]) -> Result<Self, TransportError> {
        if self.success {
            Ok(self)
        } else {
            Err(TransportError::Failed {
                command: command.join(" "),
                code: self.code,
                stderr: self.stderr,
            })
        }
    }
}

/// Low-level failure of a single device command.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("'{program}' was not found")]
    NotInstalled { program: String },

    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("'{command}' exited with status {code:?}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl From<TransportError> for PinError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::NotInstalled { program } => PinError::adb_missing(&program),
            TransportError::Failed { ref stderr, .. } => {
                PinError::command_failed_with_stderr(err.to_string(), Some(stderr.as_str()))
            }
            other => PinError::command_failed(other.to_string()),
        }
    }
}

/// Issues commands to a device and returns their output.
///
/// Implementations must run one command at a time; callers never overlap
/// invocations.
#[allow(async_fn_in_trait)]
pub trait DeviceExecutor {
    /// Run the transport with `args` (e.g. `["devices"]`).
    async fn run(&self, args: &[&str]) -> Result<CommandOutput, TransportError>;

    /// Run a command in the device shell.
    async fn shell(&self, args: &[&str]) -> Result<CommandOutput, TransportError> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push("shell");
        full.extend_from_slice(args);
        self.run(&full).await
    }

    /// Run a shell command and fail on a non-zero exit status.
    async fn shell_checked(&self, args: &[&str]) -> Result<CommandOutput, TransportError> {
        self.shell(args).await?.into_checked(args)
    }
}

/// Executor that spawns the `adb` binary for every command.
#[derive(Debug, Clone)]
pub struct AdbExecutor {
    program: PathBuf,
    serial: Option<String>,
    timeout: Duration,
}

impl AdbExecutor {
    pub fn new(program: impl Into<PathBuf>, serial: Option<String>) -> Self {
        Self {
            program: program.into(),
            serial,
            timeout: COMMAND_TIMEOUT,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Check that adb can be executed; returns its version banner.
    pub async fn probe_installed(&self) -> Result<String, PinError> {
        let output = self.run(&["version"]).await.map_err(|err| match err {
            TransportError::NotInstalled { .. } | TransportError::Spawn { .. } => {
                PinError::adb_missing(&self.program.to_string_lossy())
            }
            other => PinError::from(other),
        })?;
        Ok(output.stdout.lines().next().unwrap_or_default().to_string())
    }
}

impl DeviceExecutor for AdbExecutor {
    async fn run(&self, args: &[&str]) -> Result<CommandOutput, TransportError> {
        let program = self.program.to_string_lossy().into_owned();
        let mut cmd = Command::new(&self.program);
        if let Some(serial) = &self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("adb {}", args.join(" "));

        let output = match timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                return Err(TransportError::Timeout {
                    command: args.join(" "),
                    timeout: self.timeout,
                })
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TransportError::NotInstalled { program })
            }
            Ok(Err(source)) => return Err(TransportError::Spawn { program, source }),
            Ok(Ok(output)) => output,
        };

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// List attached devices via `adb devices`.
pub async fn list_devices<E: DeviceExecutor>(exec: &E) -> Result<Vec<DeviceEntry>, PinError> {
    let output = exec.run(&["devices"]).await?.into_checked(&["devices"])?;
    Ok(parse_device_list(&output.stdout))
}

/// Find the device `serial` names, or the only attached one, in any state.
///
/// Unlike [`ensure_connected`] this accepts an unauthorized or offline
/// device, so setup can wait for it to become ready.
pub async fn find_attached<E: DeviceExecutor>(
    exec: &E,
    serial: Option<&str>,
) -> Result<DeviceEntry, PinError> {
    let mut devices = list_devices(exec).await?;
    if let Some(wanted) = serial {
        devices.retain(|d| d.serial == wanted);
    }
    match devices.len() {
        0 => Err(PinError::no_device()),
        1 => Ok(devices.remove(0)),
        _ => Err(PinError::multiple_devices(
            &devices.iter().map(|d| d.serial.clone()).collect::<Vec<_>>(),
        )),
    }
}

/// Require exactly one usable device, or the one named by `serial`.
pub async fn ensure_connected<E: DeviceExecutor>(
    exec: &E,
    serial: Option<&str>,
) -> Result<DeviceEntry, PinError> {
    let devices = list_devices(exec).await?;
    let candidates: Vec<DeviceEntry> = match serial {
        Some(wanted) => devices.into_iter().filter(|d| d.serial == wanted).collect(),
        None => devices,
    };

    let ready: Vec<&DeviceEntry> = candidates
        .iter()
        .filter(|d| d.state == DeviceState::Device)
        .collect();

    match ready.as_slice() {
        [one] => Ok((*one).clone()),
        [] => match candidates.first() {
            Some(entry) => Err(PinError::device_not_ready(entry.state.as_str())),
            None => Err(PinError::no_device()),
        },
        many => Err(PinError::multiple_devices(
            &many.iter().map(|d| d.serial.clone()).collect::<Vec<_>>(),
        )),
    }
}
