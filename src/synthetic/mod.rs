//! Synthetic platform
//!
//! In-memory implementations of the capture and recording primitives. The
//! simulator binary runs on them and the test suites use them as doubles.

pub mod devices;
pub mod recorder;

pub use devices::{SyntheticMediaDevices, SyntheticSource};
pub use recorder::{SyntheticRecorderConfig, SyntheticRecorderHandle, SyntheticRecorderPlatform};
