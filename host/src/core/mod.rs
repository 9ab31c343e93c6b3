pub mod assets;
pub mod permission;
pub mod storage;
pub mod surface;

use std::collections::VecDeque;

use crux_core::capability::Operation;
use crux_kv::{
    KeyValueOperation, KeyValueResponse, KeyValueResult, error::KeyValueError, value::Value,
};
use crux_location_permission::{PermissionOperation, PermissionResponse};
use shared::{
    AssetOperation, BridgeError, BridgeReply, BridgeResult, ContentOperation, DriveAgent, Effect,
    Event, Request,
};

use assets::AssetDir;
use permission::PermissionSystem;
use storage::SettingsScope;
use surface::BrowserSurface;

/// What the host should do after the back button was pressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackAction {
    /// The browser surface navigated back in its history.
    WentBack,
    /// There is nothing to go back to, the host should exit.
    Exit,
}

/// The host side of the app: resolves the effects of the core against the local platform.
///
/// Everything runs on the caller's thread. Synchronous effects are resolved before a bridge call
/// returns; only the OS permission dialog is kept pending until its result is reported.
pub struct Backend<P, S> {
    /// The core of the app.
    core: shared::Core<DriveAgent>,
    storage: SettingsScope,
    assets: AssetDir,
    permissions: P,
    surface: S,
    /// The OS permission request waiting for `on_request_permissions_result`.
    pending_permission: Option<(u32, Request<PermissionOperation>)>,
    /// Replies produced by the core which are not yet picked up by a bridge call.
    replies: Vec<BridgeReply>,
}

impl<P: PermissionSystem, S: BrowserSurface> Backend<P, S> {
    pub fn new(storage: SettingsScope, assets: AssetDir, permissions: P, surface: S) -> Self {
        Self {
            core: shared::Core::new(),
            storage,
            assets,
            permissions,
            surface,
            pending_permission: None,
            replies: Vec::new(),
        }
    }

    pub fn permissions_mut(&mut self) -> &mut P {
        &mut self.permissions
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Load the content root into the browser surface.
    pub fn start(&mut self) {
        let root = self.assets.root().join(self.core.view().content_root.as_str());
        let root = std::path::absolute(&root).unwrap_or(root);
        let url = format!("file://{}", root.display());
        tracing::info!("Loading {url}");
        self.surface.load_url(&url);
    }

    // Settings bridge

    pub fn save_setting(&mut self, name: &str, value: &str) {
        self.process_event(Event::SaveSetting {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    /// Read a setting, telling a missing setting apart from a failed read.
    pub fn lookup_setting(&mut self, name: &str) -> BridgeResult<String> {
        self.process_event(Event::GetSetting {
            name: name.to_string(),
        });
        let reply = self.take_reply(
            |reply| matches!(reply, BridgeReply::Setting { name: n, .. } if n == name),
        );
        match reply {
            Some(BridgeReply::Setting { value, .. }) => value,
            _ => unanswered(),
        }
    }

    /// Read a setting as seen by the content: the value or nothing.
    pub fn get_setting(&mut self, name: &str) -> Option<String> {
        self.lookup_setting(name).ok()
    }

    // Map bridge

    pub fn trigger_location_update(&mut self) {
        self.process_event(Event::TriggerLocationUpdate);
    }

    /// Read the bundled geo data, telling a missing file apart from a failed read.
    pub fn fetch_geo_json(&mut self) -> BridgeResult<String> {
        self.process_event(Event::GetGeoJsonData);
        match self.take_reply(|reply| matches!(reply, BridgeReply::GeoJson(_))) {
            Some(BridgeReply::GeoJson(content)) => content,
            _ => unanswered(),
        }
    }

    /// Read the bundled geo data as seen by the content: the text or nothing.
    pub fn get_geo_json_data(&mut self) -> Option<String> {
        self.fetch_geo_json().ok()
    }

    // Browser surface and OS callbacks

    /// The browser surface asks whether `origin` may access the location.
    pub fn on_geolocation_prompt(&mut self, origin: &str) {
        self.process_event(Event::GeolocationPrompt {
            origin: origin.into(),
        });
    }

    /// The OS reports the decision for a permission request. An empty `grants` means the dialog
    /// was dismissed.
    ///
    /// Returns whether the result answered the pending request. Results for other request codes,
    /// or without a pending request, are ignored.
    pub fn on_request_permissions_result(&mut self, request_code: u32, grants: &[bool]) -> bool {
        let Some((code, mut request)) = self.pending_permission.take() else {
            tracing::warn!("Permission result {request_code} without a pending request");
            return false;
        };
        if code != request_code {
            tracing::warn!("Ignoring permission result {request_code}, waiting for {code}");
            self.pending_permission = Some((code, request));
            return false;
        }
        let response = match grants.first() {
            Some(true) => PermissionResponse::Granted,
            Some(false) => PermissionResponse::Denied,
            None => PermissionResponse::Dismissed,
        };
        let effects = self.resolve(&mut request, response);
        self.process_effects(effects);
        true
    }

    pub fn on_back_pressed(&mut self) -> BackAction {
        if self.surface.can_go_back() {
            self.surface.go_back();
            BackAction::WentBack
        } else {
            BackAction::Exit
        }
    }

    // Effect processing

    fn process_event(&mut self, event: Event) {
        let effects = self.core.process_event(event);
        self.process_effects(effects);
    }

    /// Process effects until the core has nothing more to say.
    fn process_effects(&mut self, effects: impl IntoIterator<Item = Effect>) {
        let mut queue: VecDeque<Effect> = effects.into_iter().collect();
        while let Some(effect) = queue.pop_front() {
            let more = match effect {
                Effect::Render(_) => {
                    tracing::trace!("View: {:?}", self.core.view());
                    Vec::new()
                }
                Effect::Storage(req) => self.process_storage(req),
                Effect::Permission(req) => self.process_permission(req),
                Effect::Asset(req) => self.process_asset(req),
                Effect::Content(req) => {
                    self.process_content(req.operation);
                    Vec::new()
                }
            };
            queue.extend(more);
        }
    }

    /// Handle persistant storage operations.
    fn process_storage(&mut self, mut request: Request<KeyValueOperation>) -> Vec<Effect> {
        let result = match request.operation.clone() {
            KeyValueOperation::Get { key } => self
                .storage
                .get(&key)
                .map(|value| KeyValueResponse::Get {
                    value: value.map(Value::Bytes).unwrap_or(Value::None),
                }),
            KeyValueOperation::Set { key, value } => {
                self.storage
                    .set(key, &value)
                    .map(|previous| KeyValueResponse::Set {
                        previous: previous.map(Value::Bytes).unwrap_or(Value::None),
                    })
            }
            KeyValueOperation::Delete { key } => {
                self.storage
                    .delete(&key)
                    .map(|previous| KeyValueResponse::Delete {
                        previous: previous.map(Value::Bytes).unwrap_or(Value::None),
                    })
            }
            KeyValueOperation::Exists { key } => Ok(KeyValueResponse::Exists {
                is_present: self.storage.exists(&key),
            }),
            KeyValueOperation::ListKeys { prefix, .. } => Ok(KeyValueResponse::ListKeys {
                keys: self.storage.keys_with_prefix(&prefix),
                next_cursor: 0,
            }),
        };
        let response = match result {
            Ok(response) => KeyValueResult::Ok { response },
            Err(e) => {
                tracing::warn!("Storage operation failed: {e:#}");
                KeyValueResult::Err {
                    error: KeyValueError::Io {
                        message: format!("{e:#}"),
                    },
                }
            }
        };
        self.resolve(&mut request, response)
    }

    fn process_permission(&mut self, mut request: Request<PermissionOperation>) -> Vec<Effect> {
        match request.operation.clone() {
            PermissionOperation::Check => {
                let response = if self.permissions.is_location_granted() {
                    PermissionResponse::Granted
                } else {
                    PermissionResponse::Denied
                };
                self.resolve(&mut request, response)
            }
            PermissionOperation::Request { request_code } => {
                if let Some((code, _)) = &self.pending_permission {
                    tracing::warn!("Permission request {code} replaced by {request_code}");
                }
                self.permissions.request_location(request_code);
                self.pending_permission = Some((request_code, request));
                Vec::new()
            }
            PermissionOperation::ResolvePrompt {
                origin,
                allow,
                retain,
            } => {
                self.surface.resolve_geolocation_prompt(&origin, allow, retain);
                Vec::new()
            }
        }
    }

    fn process_asset(&mut self, mut request: Request<AssetOperation>) -> Vec<Effect> {
        let response = self.assets.read(&request.operation.name);
        self.resolve(&mut request, response)
    }

    fn process_content(&mut self, operation: ContentOperation) {
        match operation {
            ContentOperation::Reply(reply) => self.replies.push(reply),
            ContentOperation::Post(event) => self.surface.post_event(event),
        }
    }

    /// Resolve a request, logging instead of failing if the core rejects it.
    fn resolve<Op: Operation>(&self, request: &mut Request<Op>, output: Op::Output) -> Vec<Effect> {
        self.core.resolve(request, output).unwrap_or_else(|e| {
            tracing::warn!("Failed to resolve a request: {e:?}");
            Vec::new()
        })
    }

    /// Remove and return the first reply accepted by `wanted`.
    fn take_reply(&mut self, wanted: impl Fn(&BridgeReply) -> bool) -> Option<BridgeReply> {
        let index = self.replies.iter().position(wanted)?;
        Some(self.replies.remove(index))
    }
}

fn unanswered<T>() -> BridgeResult<T> {
    tracing::warn!("The core did not answer a bridge call");
    Err(BridgeError::NotFound)
}

#[cfg(test)]
mod tests;
