//! CLI argument parsing with clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Recover a forgotten 4-digit Android lock-screen PIN over adb.
///
/// Types every PIN from 0000 to 9999 on a connected, USB-debugging-authorized
/// device, pausing 30 seconds every 5 attempts to ride out lockouts, and
/// stops as soon as the lock screen goes away.
#[derive(Debug, Parser)]
#[command(name = "pincheck", version, after_help = "\
Examples:
  pincheck                              # Interactive scan of the only connected device
  pincheck -s R58M123ABC                # Pick a device when several are attached
  pincheck --adb ~/Android/platform-tools/adb
  pincheck --locked-marker 'isStatusBarKeyguard=true'
  pincheck --yes --json > result.json   # Unattended, machine-readable result")]
pub struct Cli {
    /// Path to the adb binary [env: PINCHECK_ADB]
    #[arg(long, value_name = "PATH")]
    pub adb: Option<PathBuf>,

    /// Device serial to target [env: ANDROID_SERIAL]
    #[arg(short, long)]
    pub serial: Option<String>,

    /// Window-dump text that means the device is unlocked
    #[arg(long, value_name = "TEXT", conflicts_with = "locked_marker")]
    pub unlocked_marker: Option<String>,

    /// Window-dump text that means the device is still locked
    #[arg(long, value_name = "TEXT")]
    pub locked_marker: Option<String>,

    /// Answer yes to every confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Skip the authorization check and device setting writes
    #[arg(long)]
    pub skip_setup: bool,
}
