mod relay;
pub mod view_types;

use compact_str::CompactString;
use crux_core::{
    App,
    macros::effect,
    render::{RenderOperation, render},
};
use crux_kv::{KeyValueOperation, command::KeyValue, error::KeyValueError};
use crux_location_permission::{PermissionOperation, PermissionResult, PermissionStatus};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use view_types::ViewModel;

pub use relay::{GeoPermissionRelay, LOCATION_PERMISSION_REQUEST_CODE, RelayState};

use crate::{
    AssetOperation, AssetResponse, BridgeError, BridgeReply, BridgeResult, ContentEvent,
    ContentOperation,
};

type Command = crux_core::Command<Effect, Event>;

/// The page loaded into the browser surface at startup, relative to the asset root.
pub const CONTENT_ROOT: &str = "index.html";
/// The bundled geo data served to the content.
pub const GEOJSON_ASSET: &str = "speedtraps.geojson";

/// An event from the shell. Either a bridge call from the hosted content, a notification from the
/// browser surface or some information that was requested by the app.
///
/// Events created by the app itself are marked with `#[serde(skip)]`; a shell never sends them.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum Event {
    // Settings bridge
    /// Save a setting, overwriting any previous value.
    SaveSetting { name: String, value: String },
    /// Read a setting. Answered with `BridgeReply::Setting`.
    GetSetting { name: String },
    /// A setting has been written to storage.
    #[serde(skip)]
    SettingSaved {
        name: String,
        res: Result<Option<Vec<u8>>, KeyValueError>,
    },
    /// A setting has been read from storage.
    #[serde(skip)]
    SettingLoaded {
        name: String,
        res: Result<Option<Vec<u8>>, KeyValueError>,
    },

    // Map bridge
    /// Ask the host to tell the content to re-run its location initialization.
    TriggerLocationUpdate,
    /// Read the bundled geo data. Answered with `BridgeReply::GeoJson`.
    GetGeoJsonData,
    #[serde(skip)]
    GeoJsonLoaded(AssetResponse),

    // Geolocation permission
    /// The browser surface asks whether `origin` may access the location.
    GeolocationPrompt { origin: CompactString },
    #[serde(skip)]
    LocationPermissionChecked {
        origin: CompactString,
        status: PermissionStatus,
    },
    /// The OS permission dialog has been answered.
    #[serde(skip)]
    LocationPermissionResult(PermissionResult),
}

/// All the possible side effects of the application.
///
/// If you port this application to a new platform, you need to implement these effects.
#[effect(typegen)]
pub enum Effect {
    Render(RenderOperation),
    Storage(KeyValueOperation),
    Permission(PermissionOperation),
    Asset(AssetOperation),
    Content(ContentOperation),
}

/// The state of the application.
///
/// Settings live in the storage scope owned by the shell, so only the relay has state here.
#[derive(Default)]
pub struct Model {
    relay: GeoPermissionRelay,
}

#[derive(Default)]
pub struct DriveAgent;

impl App for DriveAgent {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Effect = Effect;
    type Capabilities = (); // FIXME: Depricated and will be removed.

    fn update(
        &self,
        event: Self::Event,
        model: &mut Self::Model,
        _: &Self::Capabilities, // Deprecated argument
    ) -> Command {
        update(model, event).and(render())
    }

    fn view(&self, model: &Self::Model) -> Self::ViewModel {
        ViewModel::new(model)
    }
}

fn update(model: &mut Model, event: Event) -> Command {
    match event {
        // Settings bridge
        Event::SaveSetting { name, value } => {
            debug!("Saving setting {name}");
            KeyValue::set(name.clone(), value.into_bytes())
                .then_send(move |res| Event::SettingSaved { name, res })
        }
        Event::SettingSaved { name, res } => {
            if let Err(e) = res {
                warn!("Failed to save setting {name}: {e}");
            }
            Command::done()
        }
        Event::GetSetting { name } => KeyValue::get(name.clone())
            .then_send(move |res| Event::SettingLoaded { name, res }),
        Event::SettingLoaded { name, res } => {
            let value = setting_value(&name, res);
            reply(BridgeReply::Setting { name, value })
        }

        // Map bridge
        Event::TriggerLocationUpdate => {
            Command::notify_shell(ContentOperation::Post(ContentEvent::LocationUpdate)).into()
        }
        Event::GetGeoJsonData => Command::request_from_shell(AssetOperation {
            name: GEOJSON_ASSET.into(),
        })
        .then_send(Event::GeoJsonLoaded),
        Event::GeoJsonLoaded(response) => reply(BridgeReply::GeoJson(asset_content(response))),

        // Geolocation permission
        Event::GeolocationPrompt { origin } => model.relay.prompt(origin),
        Event::LocationPermissionChecked { origin, status } => {
            model.relay.checked(origin, status)
        }
        Event::LocationPermissionResult(result) => model.relay.resolved(result),
    }
}

fn reply(reply: BridgeReply) -> Command {
    Command::notify_shell(ContentOperation::Reply(reply)).into()
}

/// Interpret a value read from storage as a setting.
fn setting_value(
    name: &str,
    res: Result<Option<Vec<u8>>, KeyValueError>,
) -> BridgeResult<String> {
    match res {
        Ok(Some(bytes)) => String::from_utf8(bytes).map_err(|e| {
            warn!("Setting {name} is not valid UTF-8: {e}");
            BridgeError::InvalidData {
                message: e.to_string(),
            }
        }),
        Ok(None) => Err(BridgeError::NotFound),
        Err(e) => {
            warn!("Failed to read setting {name}: {e}");
            Err(BridgeError::Io {
                message: e.to_string(),
            })
        }
    }
}

fn asset_content(response: AssetResponse) -> BridgeResult<String> {
    match response {
        AssetResponse::Content(content) => Ok(content),
        AssetResponse::NotFound => {
            warn!("Asset {GEOJSON_ASSET} not found");
            Err(BridgeError::NotFound)
        }
        AssetResponse::IoError { message } => {
            warn!("Failed to read asset {GEOJSON_ASSET}: {message}");
            Err(BridgeError::Io { message })
        }
    }
}
