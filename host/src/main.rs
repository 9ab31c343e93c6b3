mod config;
mod core;

use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use shared::BridgeReply;

use crate::config::HostConfig;
use crate::core::assets::AssetDir;
use crate::core::permission::SimulatedPermissions;
use crate::core::storage::SettingsScope;
use crate::core::surface::{HostMessage, JsonLinesSurface};
use crate::core::{BackAction, Backend};

/// A headless host for the drive agent content.
///
/// Reads bridge calls from stdin, one JSON object per line, and writes everything the host tells
/// the content to stdout.
#[derive(Parser)]
#[command(name = "drive-agent-host", version)]
struct Cli {
    /// Path to a JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the asset directory.
    #[arg(long)]
    asset_dir: Option<PathBuf>,
    /// Override the data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

/// A call from the content, or a platform callback, as read from stdin.
#[derive(Debug, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase", rename_all_fields = "camelCase")]
enum ContentCall {
    SaveSetting { name: String, value: String },
    GetSetting { name: String },
    TriggerLocationUpdate,
    GetGeoJsonData,
    GeolocationPrompt { origin: String },
    PermissionResult { request_code: u32, grants: Vec<bool> },
    Back,
}

type HeadlessBackend<W> = Backend<SimulatedPermissions, JsonLinesSurface<W>>;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = HostConfig::load(cli.config.as_deref())?;
    if let Some(asset_dir) = cli.asset_dir {
        config.asset_dir = asset_dir;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let storage = SettingsScope::open(&config.data_dir, &config.settings_scope)?;
    let mut backend = Backend::new(
        storage,
        AssetDir::new(&config.asset_dir),
        SimulatedPermissions::new(config.location_granted),
        JsonLinesSurface::new(io::stdout()),
    );
    backend.start();

    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let call = match serde_json::from_str::<ContentCall>(&line) {
            Ok(call) => call,
            Err(e) => {
                tracing::warn!("Ignoring bad call {line:?}: {e}");
                continue;
            }
        };
        tracing::debug!("Call: {call:?}");
        if let ControlFlow::Exit = dispatch(&mut backend, call) {
            break;
        }
    }
    Ok(())
}

enum ControlFlow {
    Continue,
    Exit,
}

fn dispatch<W: io::Write>(backend: &mut HeadlessBackend<W>, call: ContentCall) -> ControlFlow {
    let reply = match call {
        ContentCall::SaveSetting { name, value } => {
            backend.save_setting(&name, &value);
            None
        }
        ContentCall::GetSetting { name } => {
            let value = backend.lookup_setting(&name);
            Some(BridgeReply::Setting { name, value })
        }
        ContentCall::TriggerLocationUpdate => {
            backend.trigger_location_update();
            None
        }
        ContentCall::GetGeoJsonData => Some(BridgeReply::GeoJson(backend.fetch_geo_json())),
        ContentCall::GeolocationPrompt { origin } => {
            backend.on_geolocation_prompt(&origin);
            None
        }
        ContentCall::PermissionResult {
            request_code,
            grants,
        } => {
            // The simulated OS remembers the decision like a real one would.
            if backend.on_request_permissions_result(request_code, &grants) {
                if let Some(&granted) = grants.first() {
                    backend.permissions_mut().granted = granted;
                }
            }
            None
        }
        ContentCall::Back => {
            if backend.on_back_pressed() == BackAction::Exit {
                backend.surface_mut().send(&HostMessage::Exit);
                return ControlFlow::Exit;
            }
            None
        }
    };
    if let Some(reply) = reply {
        backend.surface_mut().send(&HostMessage::Reply { reply });
    }
    ControlFlow::Continue
}
