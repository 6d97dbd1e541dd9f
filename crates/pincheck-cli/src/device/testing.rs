//! In-memory device used by unit tests.
//!
//! Models just enough of a handset to exercise the scan: a keypad buffer
//! that collects digit keystrokes, a lock screen that opens for one secret
//! PIN, and scripted outputs or failures for everything else.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};

use pincheck_core::candidate::{KEYCODE_CONFIRM, KEYCODE_DELETE, KEYCODE_DIGIT_BASE};
use tokio::time::Instant;

use crate::device::executor::{CommandOutput, DeviceExecutor, TransportError};

#[derive(Default)]
struct State {
    log: Vec<(Instant, String)>,
    devices_output: String,
    devices_queue: VecDeque<String>,
    wm_size_output: Option<String>,
    get_state: VecDeque<(String, String)>,
    failing_commands: HashSet<String>,
    failing_entries: HashSet<String>,
    dumpsys_fails: bool,
    dumpsys_locked: String,
    dumpsys_unlocked: String,
    secret: Option<String>,
    typed: String,
    entered: Vec<String>,
    unlocked: bool,
}

pub struct ScriptedDevice {
    state: RefCell<State>,
}

impl ScriptedDevice {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State {
                devices_output: "List of devices attached\nSCRIPTED01\tdevice\n".into(),
                wm_size_output: Some("Physical size: 1080x2400\n".into()),
                dumpsys_locked: "  mShowingDream=false mDreamingLockscreen=true\n".into(),
                dumpsys_unlocked: "  mShowingDream=false mDreamingLockscreen=false\n".into(),
                ..State::default()
            }),
        }
    }

    /// Device that unlocks when `pin` is confirmed.
    pub fn with_secret(pin: &str) -> Self {
        let device = Self::new();
        device.state.borrow_mut().secret = Some(pin.to_string());
        device
    }

    pub fn set_devices_output(&self, output: &str) {
        self.state.borrow_mut().devices_output = output.to_string();
    }

    /// Queue a one-off `devices` reply, used before falling back to the fixed one.
    pub fn push_devices_output(&self, output: &str) {
        self.state
            .borrow_mut()
            .devices_queue
            .push_back(output.to_string());
    }

    /// None makes `wm size` fail.
    pub fn set_wm_size_output(&self, output: Option<&str>) {
        self.state.borrow_mut().wm_size_output = output.map(String::from);
    }

    pub fn set_dumpsys_outputs(&self, locked: &str, unlocked: &str) {
        let mut state = self.state.borrow_mut();
        state.dumpsys_locked = locked.to_string();
        state.dumpsys_unlocked = unlocked.to_string();
    }

    pub fn fail_dumpsys(&self, fail: bool) {
        self.state.borrow_mut().dumpsys_fails = fail;
    }

    /// Queue a `get-state` reply as (stdout, stderr). An empty stdout means failure.
    pub fn push_get_state(&self, stdout: &str, stderr: &str) {
        self.state
            .borrow_mut()
            .get_state
            .push_back((stdout.to_string(), stderr.to_string()));
    }

    /// Make the exact command line (space-joined args) exit non-zero.
    pub fn fail_command(&self, command: &str) {
        self.state
            .borrow_mut()
            .failing_commands
            .insert(command.to_string());
    }

    /// Make the last digit keystroke of `pin` fail.
    pub fn fail_entry(&self, pin: &str) {
        self.state
            .borrow_mut()
            .failing_entries
            .insert(pin.to_string());
    }

    /// All commands issued, space-joined.
    pub fn commands(&self) -> Vec<String> {
        self.state
            .borrow()
            .log
            .iter()
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Commands with the (paused) clock reading when they were issued.
    pub fn timed_commands(&self) -> Vec<(Instant, String)> {
        self.state.borrow().log.clone()
    }

    /// PINs confirmed with the enter key, in order.
    pub fn entered(&self) -> Vec<String> {
        self.state.borrow().entered.clone()
    }

    fn keyevent(state: &mut State, code: u8) -> bool {
        if let Some(digit) = code.checked_sub(KEYCODE_DIGIT_BASE).filter(|d| *d < 10) {
            let mut next = state.typed.clone();
            next.push(char::from(b'0' + digit));
            if next.len() == 4 && state.failing_entries.contains(&next) {
                return false;
            }
            state.typed = next;
        } else if code == KEYCODE_CONFIRM {
            let pin = std::mem::take(&mut state.typed);
            if state.secret.as_deref() == Some(pin.as_str()) {
                state.unlocked = true;
            }
            state.entered.push(pin);
        } else if code == KEYCODE_DELETE {
            state.typed.pop();
        }
        true
    }
}

fn ok(stdout: impl Into<String>) -> CommandOutput {
    CommandOutput {
        success: true,
        code: Some(0),
        stdout: stdout.into(),
        stderr: String::new(),
    }
}

fn failed(stderr: impl Into<String>) -> CommandOutput {
    CommandOutput {
        success: false,
        code: Some(1),
        stdout: String::new(),
        stderr: stderr.into(),
    }
}

impl DeviceExecutor for ScriptedDevice {
    async fn run(&self, args: &[&str]) -> Result<CommandOutput, TransportError> {
        let line = args.join(" ");
        let mut state = self.state.borrow_mut();
        state.log.push((Instant::now(), line.clone()));

        if state.failing_commands.contains(&line) {
            return Ok(failed("error: closed"));
        }

        let output = match args {
            ["devices"] => match state.devices_queue.pop_front() {
                Some(out) => ok(out),
                None => ok(state.devices_output.clone()),
            },
            ["get-state"] => match state.get_state.pop_front() {
                Some((stdout, stderr)) if stdout.is_empty() => failed(stderr),
                Some((stdout, _)) => ok(stdout),
                None => ok("device\n"),
            },
            ["shell", "wm", "size"] => match &state.wm_size_output {
                Some(out) => ok(out.clone()),
                None => failed("error: device offline"),
            },
            ["shell", "dumpsys", "window"] => {
                if state.dumpsys_fails {
                    failed("error: closed")
                } else if state.unlocked {
                    ok(state.dumpsys_unlocked.clone())
                } else {
                    ok(state.dumpsys_locked.clone())
                }
            }
            ["shell", "input", "keyevent", code] => {
                let code: u8 = code.parse().unwrap_or(0);
                if Self::keyevent(&mut state, code) {
                    ok("")
                } else {
                    failed("error: closed")
                }
            }
            _ => ok(""),
        };
        Ok(output)
    }
}
