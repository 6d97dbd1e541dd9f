//! Status reporting for a running scan.

use std::time::Duration;

use pincheck_core::candidate::Candidate;
use pincheck_core::error::PinError;
use pincheck_core::geometry::ScreenGeometry;
use pincheck_core::summary::{format_elapsed, RunOutcome, RunSummary};
use tracing::{debug, error, info, warn};

/// Log a progress line every this many candidates.
const PROGRESS_EVERY: u32 = 100;

/// Something that happened during a scan.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    SessionStarted {
        geometry: ScreenGeometry,
        detected: bool,
        total: u32,
    },
    InitialUnlockDone,
    Attempting {
        candidate: Candidate,
        index: u32,
        total: u32,
    },
    EntryFailed {
        candidate: Candidate,
        error: PinError,
    },
    CooldownStarted {
        attempts: u32,
        duration: Duration,
    },
    /// Time left in the current cooldown.
    CooldownTick {
        remaining: Duration,
    },
    CooldownFinished,
    /// Consecutive window dumps that could not be read.
    DetectorUnreachable {
        consecutive: u32,
    },
    Finished(RunSummary),
}

/// Receives scan events. Called from the scan's single thread of control.
pub trait StatusReporter {
    fn report(&self, event: StatusEvent);
}

/// Renders events as timestamped log lines and a final summary block.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    /// Suppress the summary block (it is printed as JSON instead).
    quiet_summary: bool,
}

impl ConsoleReporter {
    pub fn new(quiet_summary: bool) -> Self {
        Self { quiet_summary }
    }
}

impl StatusReporter for ConsoleReporter {
    fn report(&self, event: StatusEvent) {
        match event {
            StatusEvent::SessionStarted {
                geometry,
                detected,
                total,
            } => {
                if detected {
                    info!("Detected screen size: {}", geometry);
                } else {
                    warn!("Could not detect screen size, using default {}", geometry);
                }
                info!("Testing {} PINs", total);
            }
            StatusEvent::InitialUnlockDone => info!("Initial unlock sequence completed"),
            StatusEvent::Attempting {
                candidate,
                index,
                total,
            } => {
                debug!("Testing PIN: {}", candidate);
                if index % PROGRESS_EVERY == 0 {
                    let pct = f64::from(index) * 100.0 / f64::from(total.max(1));
                    info!("Testing PIN: {} ({:.0}%)", candidate, pct);
                }
            }
            StatusEvent::EntryFailed { candidate, error } => {
                error!("Failed to enter PIN {}: {}", candidate, error.message);
            }
            StatusEvent::CooldownStarted { attempts, duration } => {
                warn!(
                    "Pausing {}s after {} attempts...",
                    duration.as_secs(),
                    attempts
                );
            }
            StatusEvent::CooldownTick { remaining } => {
                info!("Waiting for timeout... {}s left", remaining.as_secs());
            }
            StatusEvent::CooldownFinished => info!("Cooldown finished, resuming"),
            StatusEvent::DetectorUnreachable { consecutive } => {
                warn!(
                    "Lock state unreadable {} times in a row; check the device connection",
                    consecutive
                );
            }
            StatusEvent::Finished(summary) => {
                if !self.quiet_summary {
                    println!("{}", render_summary(&summary));
                }
            }
        }
    }
}

/// Human-readable summary block.
pub fn render_summary(summary: &RunSummary) -> String {
    let headline = match summary.outcome {
        RunOutcome::Found { pin } => format!("SUCCESS! PIN found: {}", pin),
        RunOutcome::Exhausted => "PIN check completed - No matching PIN found".to_string(),
    };
    format!(
        "{}\nTime elapsed: {}\nTotal attempts: {}\nEntry failures: {}\nCooldowns: {}",
        headline,
        format_elapsed(summary.elapsed_secs),
        summary.attempts,
        summary.entry_failures,
        summary.cooldowns,
    )
}


#[cfg(test)]
mod tests {
    use super::*;

    fn summary(outcome: RunOutcome) -> RunSummary {
        RunSummary {
            outcome,
            attempts: 42,
            entry_failures: 3,
            cooldowns: 8,
            candidates_tried: 45,
            started_at: "2026-01-01T00:00:00+00:00".into(),
            elapsed_secs: 301.0,
        }
    }

    #[test]
    fn test_render_found() {
        let pin = Candidate::new(44).unwrap();
        let text = render_summary(&summary(RunOutcome::Found { pin }));
        assert!(text.starts_with("SUCCESS! PIN found: 0044"));
        assert!(text.contains("Time elapsed: 0:05:01"));
        assert!(text.contains("Total attempts: 42"));
    }

    #[test]
    fn test_render_exhausted() {
        let text = render_summary(&summary(RunOutcome::Exhausted));
        assert!(text.contains("No matching PIN found"));
        assert!(text.contains("Cooldowns: 8"));
    }
}
