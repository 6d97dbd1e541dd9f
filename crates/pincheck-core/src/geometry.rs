//! Screen geometry and swipe endpoint math.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PinError;

/// Larger dimensions are treated as corrupt `wm size` output.
pub const MAX_DIMENSION: u32 = 100_000;

static PHYSICAL_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Physical size:\s*(\d+)x(\d+)").expect("size pattern must compile")
});

/// Screen size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 2400,
        }
    }
}

/// Start and end points of a swipe gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwipePath {
    pub start: (u32, u32),
    pub end: (u32, u32),
}

impl ScreenGeometry {
    /// Vertical swipe up the horizontal midpoint, from 80% to 20% of the height.
    pub fn unlock_swipe(&self) -> SwipePath {
        let x = self.width / 2;
        SwipePath {
            start: (x, tenths(self.height, 8)),
            end: (x, tenths(self.height, 2)),
        }
    }

    /// Parse `wm size` output.
    ///
    /// Only the `Physical size: <W>x<H>` line is honored; an `Override size`
    /// line (set by display scaling tools) is ignored.
    pub fn parse_wm_size(output: &str) -> Result<Self, PinError> {
        let parse_err = || PinError::parse_failed("screen size", output);
        let caps = PHYSICAL_SIZE.captures(output).ok_or_else(parse_err)?;

        let width: u32 = caps[1].parse().map_err(|_| parse_err())?;
        let height: u32 = caps[2].parse().map_err(|_| parse_err())?;
        let plausible = 1..=MAX_DIMENSION;
        if !plausible.contains(&width) || !plausible.contains(&height) {
            return Err(parse_err());
        }
        Ok(Self { width, height })
    }
}

/// `n` tenths of `value`, rounded down. Never overflows.
fn tenths(value: u32, n: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(n.min(10)) / 10;
    // scaled <= value
    scaled as u32
}

impl std::fmt::Display for ScreenGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
