//! Command handlers
//!
//! The operations a frontend invokes. Each takes the shared
//! [`RecorderState`](recording::RecorderState) and returns an
//! [`ErrorResponse`](crate::utils::error::ErrorResponse) on failure.

pub mod recording;
pub mod system;
