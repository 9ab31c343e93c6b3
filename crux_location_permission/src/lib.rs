use crux_core::{
    Request,
    capability::Operation,
    command::{Command, NotificationBuilder, RequestBuilder},
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::marker::PhantomData;

/// An operation on the OS-level fine-location permission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PermissionOperation {
    /// Check whether the permission is currently granted. Must not show any dialog.
    Check,
    /// Ask the OS to show its permission dialog.
    ///
    /// The shell should keep the request until the OS reports the user's decision for
    /// `request_code`, which may take an unbounded amount of time.
    Request { request_code: u32 },
    /// Resolve a geolocation prompt raised by the embedded browser surface.
    ///
    /// This is a notification: the shell never responds to it.
    ResolvePrompt {
        /// The origin of the content which asked for the location.
        origin: String,
        /// Whether the content may access the location.
        allow: bool,
        /// Whether the browser surface should remember the decision.
        retain: bool,
    },
}

/// The answer from the OS permission subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionResponse {
    Granted,
    Denied,
    /// The dialog was dismissed without a decision. (Only valid for `Request`.)
    Dismissed,
}

impl Operation for PermissionOperation {
    type Output = PermissionResponse;
}

/// The current state of the permission, as returned by `check()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionStatus {
    Granted,
    NotGranted,
}

/// Why a permission request did not result in a grant.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
    derive_more::Error,
)]
#[serde(rename_all = "camelCase")]
pub enum PermissionError {
    #[display("Permission denied")]
    Denied,
    #[display("Permission dialog dismissed")]
    Dismissed,
}

pub type PermissionResult<T = (), E = PermissionError> = Result<T, E>;

/// The location permission capability API
///
/// This capability lets the app check and request the OS fine-location permission and answer
/// geolocation prompts from the embedded browser surface.
#[derive(Clone)]
pub struct LocationPermission<Effect, Event> {
    effect: PhantomData<Effect>,
    event: PhantomData<Event>,
}

impl<Effect, Event> LocationPermission<Effect, Event>
where
    Effect: Send + From<Request<PermissionOperation>> + 'static,
    Event: Send + 'static,
{
    /// Check the current permission without asking the user.
    pub fn check() -> RequestBuilder<Effect, Event, impl Future<Output = PermissionStatus>> {
        Command::request_from_shell(PermissionOperation::Check).map(response_to_status)
    }

    /// Ask the OS for the permission, tagging the request with `request_code`.
    ///
    /// Resolves when the user has made a decision.
    pub fn request(
        request_code: u32,
    ) -> RequestBuilder<Effect, Event, impl Future<Output = PermissionResult>> {
        Command::request_from_shell(PermissionOperation::Request { request_code })
            .map(response_to_result)
    }

    /// Answer a geolocation prompt from the browser surface.
    pub fn resolve_prompt(
        origin: impl Into<String>,
        allow: bool,
        retain: bool,
    ) -> NotificationBuilder<Effect, Event, impl Future<Output = ()>> {
        Command::notify_shell(PermissionOperation::ResolvePrompt {
            origin: origin.into(),
            allow,
            retain,
        })
    }
}

fn response_to_status(response: PermissionResponse) -> PermissionStatus {
    match response {
        PermissionResponse::Granted => PermissionStatus::Granted,
        PermissionResponse::Denied | PermissionResponse::Dismissed => PermissionStatus::NotGranted,
    }
}

fn response_to_result(response: PermissionResponse) -> PermissionResult {
    match response {
        PermissionResponse::Granted => Ok(()),
        PermissionResponse::Denied => Err(PermissionError::Denied),
        PermissionResponse::Dismissed => Err(PermissionError::Dismissed),
    }
}
