//! Application state
//!
//! A single [`AppState`] mutated only through [`Action`]s dispatched to the
//! [`AppStateStore`].

pub mod store;
pub mod types;

pub use store::AppStateStore;
pub use types::{
    Action, ActivePanel, AppState, MediaState, Notification, NotificationLevel, OutputInfo,
    OutputState, RecordingState, SelectedSources, StatusError, UiState, WebcamCorner,
    WebcamPosition,
};
