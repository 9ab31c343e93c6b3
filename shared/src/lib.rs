mod capabilities;
pub mod drive_agent;

use std::sync::LazyLock;

pub use capabilities::*;
pub use crux_core::{Core, Request, bridge::Bridge};
pub use drive_agent::*;
use wasm_bindgen::prelude::wasm_bindgen;

uniffi::include_scaffolding!("shared");

static CORE: LazyLock<Bridge<DriveAgent>> = LazyLock::new(|| Bridge::new(Core::new()));

// Errors must not cross the FFI boundary, so they are logged and an empty message is returned.

#[wasm_bindgen]
pub fn process_event(data: &[u8]) -> Vec<u8> {
    CORE.process_event(data).unwrap_or_else(|e| {
        log::error!("Failed to process event: {e:?}");
        Vec::new()
    })
}

#[wasm_bindgen]
pub fn handle_response(id: u32, data: &[u8]) -> Vec<u8> {
    CORE.handle_response(id, data).unwrap_or_else(|e| {
        log::error!("Failed to handle response {id}: {e:?}");
        Vec::new()
    })
}

#[wasm_bindgen]
pub fn view() -> Vec<u8> {
    CORE.view().unwrap_or_else(|e| {
        log::error!("Failed to serialize the view model: {e:?}");
        Vec::new()
    })
}
