//! Runtime configuration resolved from flags and environment.
//!
//! Priority for the adb binary:
//! 1. `--adb` (explicit flag)
//! 2. `PINCHECK_ADB` (ignores empty string)
//! 3. `$ANDROID_HOME/platform-tools/adb`, then `$ANDROID_SDK_ROOT/...` (if the file exists)
//! 4. `adb` on `PATH`
//!
//! The device serial comes from `--serial`, then `ANDROID_SERIAL`.

use std::env;
use std::path::{Path, PathBuf};

use crate::args::Cli;
use crate::device::detector::MarkerRule;

/// Settings for one pincheck invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub adb: PathBuf,
    pub serial: Option<String>,
    pub marker_rule: MarkerRule,
    pub assume_yes: bool,
    pub json: bool,
    pub skip_setup: bool,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        let marker_rule = match (&cli.unlocked_marker, &cli.locked_marker) {
            (Some(marker), _) => MarkerRule::UnlockedWhenPresent(marker.clone()),
            (None, Some(marker)) => MarkerRule::LockedWhenPresent(marker.clone()),
            (None, None) => MarkerRule::default(),
        };
        Self {
            adb: resolve_adb_program(cli.adb.as_deref()),
            serial: resolve_serial(cli.serial.as_deref()),
            marker_rule,
            assume_yes: cli.yes,
            json: cli.json,
            skip_setup: cli.skip_setup,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Locate the adb binary.
pub fn resolve_adb_program(flag: Option<&Path>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }

    if let Some(path) = non_empty_var("PINCHECK_ADB") {
        return PathBuf::from(path);
    }

    for sdk_var in ["ANDROID_HOME", "ANDROID_SDK_ROOT"] {
        if let Some(sdk) = non_empty_var(sdk_var) {
            let candidate = PathBuf::from(sdk).join("platform-tools").join("adb");
            if candidate.is_file() {
                return candidate;
            }
        }
    }

    PathBuf::from("adb")
}

/// Pick the device serial, if any.
pub fn resolve_serial(flag: Option<&str>) -> Option<String> {
    flag.map(String::from)
        .filter(|s| !s.is_empty())
        .or_else(|| non_empty_var("ANDROID_SERIAL"))
}
