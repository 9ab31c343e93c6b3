//! The OS permission subsystem, as seen by the host.

/// Access to the OS fine-location permission.
pub trait PermissionSystem {
    /// Whether the permission is granted right now.
    fn is_location_granted(&self) -> bool;
    /// Show the OS permission dialog. The decision is delivered later through
    /// `Backend::on_request_permissions_result` with the same `request_code`.
    fn request_location(&mut self, request_code: u32);
}

/// A permission subsystem without a dialog, for headless runs and tests.
///
/// Requests are recorded; the decision is fed back by whoever drives the host.
#[derive(Debug, Default)]
pub struct SimulatedPermissions {
    pub granted: bool,
    pub requests: Vec<u32>,
}

impl SimulatedPermissions {
    pub fn new(granted: bool) -> Self {
        Self {
            granted,
            requests: Vec::new(),
        }
    }
}

impl PermissionSystem for SimulatedPermissions {
    fn is_location_granted(&self) -> bool {
        self.granted
    }

    fn request_location(&mut self, request_code: u32) {
        tracing::info!("Location permission requested (code {request_code})");
        self.requests.push(request_code);
    }
}
