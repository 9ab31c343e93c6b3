//! The view model, the state of the host as seen by the shell.

use compact_str::CompactString;
use crux_location_permission::PermissionStatus;
use serde::{Deserialize, Serialize};

use super::{Model, RelayState, CONTENT_ROOT};

#[derive(Serialize, Deserialize, Clone, Default, Debug, PartialEq, Eq, Hash)]
pub struct ViewModel {
    /// The page the browser surface should load at startup, relative to the asset root.
    pub content_root: CompactString,
    /// A human readable description of the OS location permission.
    pub location_permission: CompactString,
    /// The origin of a geolocation prompt waiting for the user's decision, if any.
    pub pending_prompt: Option<CompactString>,
}

impl ViewModel {
    pub fn new(model: &Model) -> Self {
        let location_permission = match model.relay.last_status() {
            None => "Unknown",
            Some(PermissionStatus::Granted) => "Granted",
            Some(PermissionStatus::NotGranted) => "Not granted",
        };
        let pending_prompt = match model.relay.state() {
            RelayState::Idle => None,
            RelayState::AwaitingUserDecision { origin } => Some(origin.clone()),
        };
        Self {
            content_root: CONTENT_ROOT.into(),
            location_permission: location_permission.into(),
            pending_prompt,
        }
    }
}
