use compact_str::CompactString;
use crux_core::capability::Operation;
use serde::{Deserialize, Serialize};

/// An operation to read a bundled asset in full.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetOperation {
    /// The file name of the asset, relative to the asset root.
    pub name: CompactString,
}

/// The content of an asset, or why it couldn't be read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetResponse {
    Content(String),
    NotFound,
    IoError { message: String },
}

impl Operation for AssetOperation {
    type Output = AssetResponse;
}
