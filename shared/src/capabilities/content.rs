//! The structured channel from the host to the hosted web content.

use crux_core::capability::Operation;
use serde::{Deserialize, Serialize};

/// Why a bridge call produced no value.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, derive_more::Display, derive_more::Error,
)]
#[serde(rename_all = "camelCase")]
pub enum BridgeError {
    /// The setting was never saved or the asset doesn't exist.
    #[display("Not found")]
    NotFound,
    #[display("I/O error: {message}")]
    Io { message: String },
    /// The stored bytes are not valid UTF-8.
    #[display("Invalid data: {message}")]
    InvalidData { message: String },
}

pub type BridgeResult<T, E = BridgeError> = Result<T, E>;

/// The value returned for a bridge call which has a return value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BridgeReply {
    /// Answer to `getSetting`.
    Setting {
        name: String,
        value: BridgeResult<String>,
    },
    /// Answer to `getGeoJsonData`.
    GeoJson(BridgeResult<String>),
}

/// An event posted by the host to the hosted content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentEvent {
    /// The content should (re)run its location initialization.
    LocationUpdate,
}

/// A message to the hosted content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentOperation {
    Reply(BridgeReply),
    Post(ContentEvent),
}

/// An empty response. The shell never answers content messages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ContentResponse {}

impl Operation for ContentOperation {
    type Output = ContentResponse;
}
