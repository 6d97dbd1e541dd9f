//! Attempt scheduler: the scan state machine.
//!
//! ```text
//! connect -> measure screen -> initial unlock -> [enter -> probe -> (cooldown)]* -> done
//! ```
//!
//! A candidate whose keystrokes fail is skipped after a short recovery
//! delay; it neither counts as an attempt nor moves the cooldown window.
//! The loop never aborts on a per-candidate failure.

use std::time::Duration;

use chrono::{DateTime, Utc};
use pincheck_core::candidate::{Candidate, SPACE_SIZE};
use pincheck_core::error::PinError;
use pincheck_core::geometry::ScreenGeometry;
use pincheck_core::summary::{AttemptResult, RunOutcome, RunSummary};
use pincheck_core::timing::Timing;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::device::detector::{MarkerRule, UnlockDetector};
use crate::device::executor::{ensure_connected, DeviceExecutor};
use crate::device::gestures::{query_geometry, Gestures, SwipeKind};
use crate::report::{StatusEvent, StatusReporter};

/// Warn after this many consecutive unreadable window dumps.
const DETECTOR_FAILURE_THRESHOLD: u32 = 3;

/// Interval between countdown reports during a cooldown.
const COUNTDOWN_STEP: Duration = Duration::from_secs(10);

/// State of one scan.
#[derive(Debug, Clone)]
pub struct Session {
    pub started_at: DateTime<Utc>,
    started: Instant,
    pub geometry: ScreenGeometry,
    /// Candidates whose keystrokes all landed.
    pub attempts: u32,
    /// `attempts` value at the last cooldown.
    pub last_cooldown_at: Option<u32>,
    pub entry_failures: u32,
    pub cooldowns: u32,
    pub candidates_tried: u32,
}

impl Session {
    pub fn new(geometry: ScreenGeometry) -> Self {
        Self {
            started_at: Utc::now(),
            started: Instant::now(),
            geometry,
            attempts: 0,
            last_cooldown_at: None,
            entry_failures: 0,
            cooldowns: 0,
            candidates_tried: 0,
        }
    }

    /// Whether the entries so far end a cooldown window that has not been served yet.
    pub fn cooldown_due(&self, timing: &Timing) -> bool {
        timing.is_cooldown_boundary(self.attempts) && self.last_cooldown_at != Some(self.attempts)
    }

    pub fn summary(&self, outcome: RunOutcome) -> RunSummary {
        RunSummary {
            outcome,
            attempts: self.attempts,
            entry_failures: self.entry_failures,
            cooldowns: self.cooldowns,
            candidates_tried: self.candidates_tried,
            started_at: self.started_at.to_rfc3339(),
            elapsed_secs: self.started.elapsed().as_secs_f64(),
        }
    }
}

pub struct AttemptScheduler<'a, E, R> {
    exec: &'a E,
    reporter: &'a R,
    timing: Timing,
    rule: MarkerRule,
    serial: Option<String>,
}

impl<'a, E: DeviceExecutor, R: StatusReporter> AttemptScheduler<'a, E, R> {
    pub fn new(exec: &'a E, reporter: &'a R) -> Self {
        Self {
            exec,
            reporter,
            timing: Timing::default(),
            rule: MarkerRule::default(),
            serial: None,
        }
    }

    #[cfg(test)]
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_marker_rule(mut self, rule: MarkerRule) -> Self {
        self.rule = rule;
        self
    }

    /// Restrict the connectivity check to one device.
    pub fn with_serial(mut self, serial: Option<String>) -> Self {
        self.serial = serial;
        self
    }

    /// Enumerate candidates `0..total` in ascending order until one unlocks the device.
    ///
    /// Errors only when no device is reachable or the initial unlock fails;
    /// an exhausted space is reported through [`RunOutcome::Exhausted`].
    pub async fn run(&self, total: u32) -> Result<RunSummary, PinError> {
        ensure_connected(self.exec, self.serial.as_deref()).await?;

        let (geometry, detected) = match query_geometry(self.exec).await {
            Ok(geometry) => (geometry, true),
            Err(e) => {
                debug!("Screen size query failed: {}", e);
                (ScreenGeometry::default(), false)
            }
        };
        let total = total.min(SPACE_SIZE);
        let mut session = Session::new(geometry);
        self.reporter.report(StatusEvent::SessionStarted {
            geometry: session.geometry,
            detected,
            total,
        });

        let gestures = Gestures::new(self.exec, &self.timing, session.geometry);
        let detector = UnlockDetector::new(self.exec, self.rule.clone());

        self.initial_unlock(&gestures).await?;
        self.reporter.report(StatusEvent::InitialUnlockDone);

        for candidate in Candidate::ascending(total) {
            session.candidates_tried += 1;
            self.reporter.report(StatusEvent::Attempting {
                candidate,
                index: candidate.value(),
                total,
            });

            let result = self
                .attempt(&gestures, &detector, candidate, &mut session)
                .await;
            match result {
                AttemptResult::EnteredMatch => {
                    let summary = session.summary(RunOutcome::Found { pin: candidate });
                    self.reporter.report(StatusEvent::Finished(summary.clone()));
                    return Ok(summary);
                }
                AttemptResult::EntryFailed => {
                    sleep(self.timing.entry_failure_delay).await;
                    continue;
                }
                AttemptResult::EnteredNoMatch => {}
            }

            if session.cooldown_due(&self.timing) {
                self.cooldown(&gestures, &mut session).await;
            }
        }

        let summary = session.summary(RunOutcome::Exhausted);
        self.reporter.report(StatusEvent::Finished(summary.clone()));
        Ok(summary)
    }

    /// Wake the screen and swipe past the lock screen twice.
    async fn initial_unlock(&self, gestures: &Gestures<'_, E>) -> Result<(), PinError> {
        gestures.wake_and_hold_screen().await?;
        sleep(self.timing.wake_settle).await;
        gestures.unlock_swipe(SwipeKind::Full).await?;
        gestures.unlock_swipe(SwipeKind::Full).await?;
        Ok(())
    }

    async fn attempt(
        &self,
        gestures: &Gestures<'_, E>,
        detector: &UnlockDetector<'_, E>,
        candidate: Candidate,
        session: &mut Session,
    ) -> AttemptResult {
        if let Err(error) = gestures.enter_digits(candidate).await {
            session.entry_failures += 1;
            self.reporter
                .report(StatusEvent::EntryFailed { candidate, error });
            return AttemptResult::EntryFailed;
        }
        session.attempts += 1;

        if detector.is_unlocked().await {
            return AttemptResult::EnteredMatch;
        }
        let streak = detector.unreadable_streak();
        if streak > 0 && streak % DETECTOR_FAILURE_THRESHOLD == 0 {
            self.reporter
                .report(StatusEvent::DetectorUnreachable { consecutive: streak });
        }
        AttemptResult::EnteredNoMatch
    }

    /// Wait out the lockout, then bring the keypad back.
    async fn cooldown(&self, gestures: &Gestures<'_, E>, session: &mut Session) {
        session.cooldowns += 1;
        session.last_cooldown_at = Some(session.attempts);
        self.reporter.report(StatusEvent::CooldownStarted {
            attempts: session.attempts,
            duration: self.timing.cooldown,
        });

        let mut remaining = self.timing.cooldown;
        while !remaining.is_zero() {
            let step = remaining.min(COUNTDOWN_STEP);
            sleep(step).await;
            remaining -= step;
            if !remaining.is_zero() {
                self.reporter
                    .report(StatusEvent::CooldownTick { remaining });
            }
        }

        if let Err(e) = gestures.wake_and_hold_screen().await {
            warn!("Wake after cooldown failed: {}", e);
        }
        if let Err(e) = gestures.unlock_swipe(SwipeKind::Recovery).await {
            warn!("Swipe after cooldown failed: {}", e);
        }
        self.reporter.report(StatusEvent::CooldownFinished);
    }
}
