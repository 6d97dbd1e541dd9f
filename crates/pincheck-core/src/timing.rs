//! Protocol delays and cooldown policy.
//!
//! The delays let the device UI settle between gestures. Issuing the next
//! gesture early produces false negatives, so they are part of the protocol
//! rather than pacing.

use std::time::Duration;

/// All fixed delays used while driving the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    /// Pause after each digit keystroke.
    pub key_delay: Duration,
    /// Pause after the confirm keystroke before probing lock state.
    pub confirm_settle: Duration,
    /// Pause after the wake key during the initial unlock.
    pub wake_settle: Duration,
    /// Duration of the full unlock swipe.
    pub swipe_duration: Duration,
    /// Pause after a full unlock swipe.
    pub swipe_settle: Duration,
    /// Duration of the post-cooldown swipe.
    pub recovery_swipe_duration: Duration,
    /// Pause after the post-cooldown swipe.
    pub recovery_swipe_settle: Duration,
    /// Pause after a candidate could not be entered.
    pub entry_failure_delay: Duration,
    /// Length of the lockout cooldown.
    pub cooldown: Duration,
    /// Cooldown fires each time this many entries have landed.
    pub cooldown_every: u32,
    /// Screen-off timeout written while the scan runs.
    pub screen_off_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            key_delay: Duration::from_millis(100),
            confirm_settle: Duration::from_millis(500),
            wake_settle: Duration::from_secs(1),
            swipe_duration: Duration::from_millis(100),
            swipe_settle: Duration::from_secs(1),
            recovery_swipe_duration: Duration::from_millis(50),
            recovery_swipe_settle: Duration::from_millis(500),
            entry_failure_delay: Duration::from_secs(1),
            cooldown: Duration::from_secs(30),
            cooldown_every: 5,
            screen_off_timeout: Duration::from_secs(30 * 60),
        }
    }
}

impl Timing {
    /// Whether `attempts` successful entries ends a cooldown window.
    pub fn is_cooldown_boundary(&self, attempts: u32) -> bool {
        attempts > 0 && self.cooldown_every > 0 && attempts % self.cooldown_every == 0
    }
}
