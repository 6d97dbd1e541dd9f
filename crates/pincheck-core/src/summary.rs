//! Outcome of a scan, in a form suitable for display or JSON output.

use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;

/// Result of entering a single candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptResult {
    /// Entered; the device stayed locked.
    EnteredNoMatch,
    /// Entered; the device unlocked.
    EnteredMatch,
    /// The keystroke sequence could not be completed.
    EntryFailed,
}

/// Terminal state of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Found { pin: Candidate },
    Exhausted,
}

/// Final report for one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    /// Candidates whose keystrokes all landed.
    pub attempts: u32,
    pub entry_failures: u32,
    pub cooldowns: u32,
    /// Candidates enumerated, including failed entries.
    pub candidates_tried: u32,
    /// RFC 3339 start time.
    pub started_at: String,
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn pin(&self) -> Option<Candidate> {
        match self.outcome {
            RunOutcome::Found { pin } => Some(pin),
            RunOutcome::Exhausted => None,
        }
    }
}

/// Format seconds as `H:MM:SS`.
pub fn format_elapsed(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
