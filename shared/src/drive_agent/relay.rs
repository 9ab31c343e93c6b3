//! The geolocation permission relay.
//!
//! Mediates between geolocation prompts from the browser surface and the OS permission
//! subsystem. Every prompt goes through a permission check; if the permission is missing a
//! single OS request is issued and the prompt is kept until the user has decided.

use compact_str::CompactString;
use crux_location_permission::{LocationPermission, PermissionResult, PermissionStatus};
use log::{debug, info};

use super::{Command, Event};
use crate::{ContentEvent, ContentOperation};

/// The request code attached to OS permission requests.
pub const LOCATION_PERMISSION_REQUEST_CODE: u32 = 1001;

/// The state of the relay.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RelayState {
    /// No OS permission request is in flight.
    #[default]
    Idle,
    /// An OS permission request is in flight and the prompt from `origin` waits for its result.
    AwaitingUserDecision { origin: CompactString },
}

#[derive(Debug, Default)]
pub struct GeoPermissionRelay {
    state: RelayState,
    /// The most recently observed OS permission.
    last_status: Option<PermissionStatus>,
}

impl GeoPermissionRelay {
    pub fn state(&self) -> &RelayState {
        &self.state
    }

    pub fn last_status(&self) -> Option<PermissionStatus> {
        self.last_status
    }

    /// The browser surface asks whether `origin` may access the location.
    pub(crate) fn prompt(&self, origin: CompactString) -> Command {
        debug!("Geolocation prompt from {origin}");
        LocationPermission::check()
            .then_send(move |status| Event::LocationPermissionChecked { origin, status })
    }

    /// The OS permission has been checked for a prompt from `origin`.
    pub(crate) fn checked(&mut self, origin: CompactString, status: PermissionStatus) -> Command {
        self.last_status = Some(status);
        match (status, &self.state) {
            (PermissionStatus::Granted, _) => {
                LocationPermission::resolve_prompt(origin, true, false).into()
            }
            (PermissionStatus::NotGranted, RelayState::Idle) => {
                self.state = RelayState::AwaitingUserDecision { origin };
                LocationPermission::request(LOCATION_PERMISSION_REQUEST_CODE)
                    .then_send(Event::LocationPermissionResult)
            }
            (PermissionStatus::NotGranted, RelayState::AwaitingUserDecision { origin: pending }) => {
                // A request is already in flight: the new prompt takes its place.
                let superseded = if *pending == origin {
                    Command::done()
                } else {
                    debug!("Prompt from {pending} superseded by {origin}");
                    LocationPermission::resolve_prompt(pending.clone(), false, false).into()
                };
                self.state = RelayState::AwaitingUserDecision { origin };
                superseded
            }
        }
    }

    /// The OS has reported the result of the permission request.
    pub(crate) fn resolved(&mut self, result: PermissionResult) -> Command {
        let pending = match std::mem::take(&mut self.state) {
            RelayState::AwaitingUserDecision { origin } => Some(origin),
            RelayState::Idle => None,
        };
        match result {
            Ok(()) => {
                self.last_status = Some(PermissionStatus::Granted);
                let update: Command =
                    Command::notify_shell(ContentOperation::Post(ContentEvent::LocationUpdate))
                        .into();
                match pending {
                    Some(origin) => Command::all([
                        LocationPermission::resolve_prompt(origin, true, false).into(),
                        update,
                    ]),
                    None => update,
                }
            }
            Err(e) => {
                self.last_status = Some(PermissionStatus::NotGranted);
                info!("Location permission not granted: {e}");
                match pending {
                    Some(origin) => LocationPermission::resolve_prompt(origin, false, false).into(),
                    None => Command::done(),
                }
            }
        }
    }
}
