//! Lock-state detection from the window manager dump.

use std::cell::Cell;

use tracing::debug;

use crate::device::executor::DeviceExecutor;

/// Marker that `dumpsys window` prints once the keyguard is gone on stock Android.
pub const DEFAULT_UNLOCKED_MARKER: &str = "mDreamingLockscreen=false";

/// How to read the window dump.
///
/// The marker text varies between vendors and OS versions, so it is
/// configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerRule {
    /// Unlocked iff the dump contains the marker.
    UnlockedWhenPresent(String),
    /// Unlocked iff the dump lacks the marker.
    LockedWhenPresent(String),
}

impl Default for MarkerRule {
    fn default() -> Self {
        MarkerRule::UnlockedWhenPresent(DEFAULT_UNLOCKED_MARKER.to_string())
    }
}

impl MarkerRule {
    pub fn is_unlocked(&self, dump: &str) -> bool {
        match self {
            MarkerRule::UnlockedWhenPresent(marker) => dump.contains(marker.as_str()),
            MarkerRule::LockedWhenPresent(marker) => !dump.contains(marker.as_str()),
        }
    }
}

/// Result of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked,
    /// The dump could not be read; says nothing about the PIN.
    Unknown,
}

pub struct UnlockDetector<'a, E> {
    exec: &'a E,
    rule: MarkerRule,
    /// Consecutive probes that returned [`LockState::Unknown`].
    unreadable: Cell<u32>,
}

impl<'a, E: DeviceExecutor> UnlockDetector<'a, E> {
    pub fn new(exec: &'a E, rule: MarkerRule) -> Self {
        Self {
            exec,
            rule,
            unreadable: Cell::new(0),
        }
    }

    /// Dump window state and classify it.
    pub async fn probe(&self) -> LockState {
        let state = self.classify().await;
        match state {
            LockState::Unknown => self.unreadable.set(self.unreadable.get() + 1),
            _ => self.unreadable.set(0),
        }
        state
    }

    /// True only when the device positively reports being unlocked.
    ///
    /// An unreadable dump is `false`; see [`Self::unreadable_streak`].
    pub async fn is_unlocked(&self) -> bool {
        self.probe().await == LockState::Unlocked
    }

    /// How many probes in a row could not read the lock state.
    pub fn unreadable_streak(&self) -> u32 {
        self.unreadable.get()
    }

    async fn classify(&self) -> LockState {
        let output = match self.exec.shell_checked(&["dumpsys", "window"]).await {
            Ok(output) => output,
            Err(e) => {
                debug!("Window dump failed: {}", e);
                return LockState::Unknown;
            }
        };
        if output.stdout.trim().is_empty() {
            return LockState::Unknown;
        }
        if self.rule.is_unlocked(&output.stdout) {
            LockState::Unlocked
        } else {
            LockState::Locked
        }
    }
}
