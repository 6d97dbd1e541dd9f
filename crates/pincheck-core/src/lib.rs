//! Core types and logic for pincheck.
//!
//! This crate holds the I/O-free half of pincheck: what a candidate looks
//! like on the keypad, where to swipe, how to read device listings, when to
//! cool down, and how a finished scan is reported. The CLI crate drives a
//! device with these.
//!
//! # Modules
//!
//! - [`candidate`]: 4-digit candidates and their keycodes
//! - [`geometry`]: screen size parsing and swipe endpoints
//! - [`devices`]: `adb devices` parsing
//! - [`timing`]: protocol delays and cooldown policy
//! - [`summary`]: per-attempt results and the final run summary
//! - [`error`]: error taxonomy with operator-facing suggestions
//!
//! # Keypad
//!
//! | Key | Keycode |
//! |-----|---------|
//! | `0`..`9` | `7`..`16` |
//! | Confirm | `66` |
//! | Delete | `67` |

pub mod candidate;
pub mod devices;
pub mod error;
pub mod geometry;
pub mod summary;
pub mod timing;
