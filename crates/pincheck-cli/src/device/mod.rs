//! Everything that talks to the handset.

pub mod detector;
pub mod executor;
pub mod gestures;
pub mod setup;

#[cfg(test)]
pub mod testing;

pub use executor::AdbExecutor;
