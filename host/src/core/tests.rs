use std::fs;

use shared::{ContentEvent, LOCATION_PERMISSION_REQUEST_CODE};

use super::permission::SimulatedPermissions;
use super::*;

/// A surface remembering everything the host did to it.
#[derive(Default)]
struct RecordingSurface {
    loaded: Vec<String>,
    events: Vec<ContentEvent>,
    prompts: Vec<(String, bool, bool)>,
}

impl BrowserSurface for RecordingSurface {
    fn load_url(&mut self, url: &str) {
        self.loaded.push(url.to_string());
    }

    fn post_event(&mut self, event: ContentEvent) {
        self.events.push(event);
    }

    fn resolve_geolocation_prompt(&mut self, origin: &str, allow: bool, retain: bool) {
        self.prompts.push((origin.to_string(), allow, retain));
    }

    fn can_go_back(&self) -> bool {
        self.loaded.len() > 1
    }

    fn go_back(&mut self) {
        self.loaded.pop();
    }
}

type TestBackend = Backend<SimulatedPermissions, RecordingSurface>;

fn backend(dir: &tempfile::TempDir, granted: bool) -> TestBackend {
    let storage = SettingsScope::open(dir.path().join("data"), "AppSettings").unwrap();
    let assets = AssetDir::new(dir.path().join("assets"));
    Backend::new(
        storage,
        assets,
        SimulatedPermissions::new(granted),
        RecordingSurface::default(),
    )
}

#[test]
fn settings_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = backend(&dir, false);

    host.save_setting("unit", "metric");
    assert_eq!(host.get_setting("unit").as_deref(), Some("metric"));
    assert_eq!(host.get_setting("theme"), None);
    assert_eq!(host.lookup_setting("theme"), Err(BridgeError::NotFound));
    host.save_setting("theme", "dark");
    assert_eq!(host.get_setting("theme").as_deref(), Some("dark"));
}

#[test]
fn last_write_wins() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = backend(&dir, false);
    host.save_setting("theme", "dark");
    host.save_setting("theme", "light");
    assert_eq!(host.get_setting("theme").as_deref(), Some("light"));
}

#[test]
fn arbitrary_strings_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = backend(&dir, false);
    for (name, value) in [("", ""), ("ключ", "värde 🚗"), ("a\nb", "{\"x\":1}")] {
        host.save_setting(name, value);
        assert_eq!(host.get_setting(name).as_deref(), Some(value));
    }
}

#[test]
fn settings_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = backend(&dir, false);
    host.save_setting("unit", "metric");
    drop(host);

    let mut host = backend(&dir, false);
    assert_eq!(host.get_setting("unit").as_deref(), Some("metric"));
}

#[test]
fn geojson_is_served_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("assets")).unwrap();
    let content = "{\"type\":\"FeatureCollection\",\"features\":[]}";
    fs::write(dir.path().join("assets/speedtraps.geojson"), content).unwrap();
    let mut host = backend(&dir, false);
    assert_eq!(host.get_geo_json_data().as_deref(), Some(content));
}

#[test]
fn missing_geojson_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = backend(&dir, false);
    assert_eq!(host.get_geo_json_data(), None);
    assert_eq!(host.fetch_geo_json(), Err(BridgeError::NotFound));
}

#[test]
fn start_loads_content_root() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = backend(&dir, false);
    host.start();
    assert_eq!(host.surface.loaded.len(), 1);
    assert!(host.surface.loaded[0].ends_with("assets/index.html"));
    assert!(host.surface.loaded[0].starts_with("file://"));
}

#[test]
fn relative_asset_dir_loads_absolute_url() {
    let dir = tempfile::tempdir().unwrap();
    let storage = SettingsScope::open(dir.path(), "AppSettings").unwrap();
    let mut host = Backend::new(
        storage,
        AssetDir::new("assets"),
        SimulatedPermissions::new(false),
        RecordingSurface::default(),
    );
    host.start();
    assert!(host.surface.loaded[0].starts_with("file:///"));
    assert!(host.surface.loaded[0].ends_with("/assets/index.html"));
}

#[test]
fn granted_prompt_resolves_without_request() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = backend(&dir, true);
    host.on_geolocation_prompt("file://");
    assert_eq!(
        host.surface.prompts,
        vec![("file://".to_string(), true, false)]
    );
    assert!(host.permissions_mut().requests.is_empty());
    assert!(host.surface.events.is_empty());
}

#[test]
fn deferred_grant() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = backend(&dir, false);
    host.on_geolocation_prompt("file://");
    assert_eq!(
        host.permissions_mut().requests,
        vec![LOCATION_PERMISSION_REQUEST_CODE]
    );
    assert!(host.surface.prompts.is_empty());

    host.permissions_mut().granted = true;
    host.on_request_permissions_result(LOCATION_PERMISSION_REQUEST_CODE, &[true]);
    assert_eq!(host.surface.events, vec![ContentEvent::LocationUpdate]);
    assert_eq!(
        host.surface.prompts,
        vec![("file://".to_string(), true, false)]
    );

    // The request is gone, a repeated result changes nothing.
    host.on_request_permissions_result(LOCATION_PERMISSION_REQUEST_CODE, &[true]);
    assert_eq!(host.surface.events.len(), 1);
}

#[test]
fn deferred_denial() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = backend(&dir, false);
    host.on_geolocation_prompt("file://");
    host.on_request_permissions_result(LOCATION_PERMISSION_REQUEST_CODE, &[]);
    assert!(host.surface.events.is_empty());
    assert_eq!(
        host.surface.prompts,
        vec![("file://".to_string(), false, false)]
    );
}

#[test]
fn foreign_request_code_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = backend(&dir, false);
    host.on_geolocation_prompt("file://");
    assert!(!host.on_request_permissions_result(42, &[true]));
    assert!(host.surface.events.is_empty());
    assert!(host.surface.prompts.is_empty());

    host.on_request_permissions_result(LOCATION_PERMISSION_REQUEST_CODE, &[true]);
    assert_eq!(host.surface.events, vec![ContentEvent::LocationUpdate]);
}

#[test]
fn repeated_prompts_issue_one_request() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = backend(&dir, false);
    host.on_geolocation_prompt("file://");
    host.on_geolocation_prompt("file://");
    assert_eq!(host.permissions_mut().requests.len(), 1);
}

#[test]
fn granted_prompt_leaves_waiting_prompt_pending() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = backend(&dir, false);
    host.on_geolocation_prompt("https://a");

    // The permission got granted elsewhere, a new prompt is answered at once.
    host.permissions_mut().granted = true;
    host.on_geolocation_prompt("https://b");
    assert_eq!(
        host.surface.prompts,
        vec![("https://b".to_string(), true, false)]
    );

    // The older prompt still waits for the OS result.
    assert!(host.on_request_permissions_result(LOCATION_PERMISSION_REQUEST_CODE, &[true]));
    assert_eq!(
        host.surface.prompts,
        vec![
            ("https://b".to_string(), true, false),
            ("https://a".to_string(), true, false),
        ]
    );
    assert_eq!(host.surface.events, vec![ContentEvent::LocationUpdate]);
    assert_eq!(host.permissions_mut().requests.len(), 1);
}

#[test]
fn trigger_location_update_posts_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = backend(&dir, false);
    host.trigger_location_update();
    assert_eq!(host.surface.events, vec![ContentEvent::LocationUpdate]);
}

#[test]
fn back_navigation() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = backend(&dir, false);
    host.start();
    assert_eq!(host.on_back_pressed(), BackAction::Exit);
    host.surface.load_url("file:///assets/settings.html");
    assert_eq!(host.on_back_pressed(), BackAction::WentBack);
    assert_eq!(host.surface.loaded.len(), 1);
}
