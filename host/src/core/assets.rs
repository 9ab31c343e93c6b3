//! Bundled assets.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use shared::AssetResponse;

/// A directory of read-only files bundled with the host.
pub struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read an asset in full. Names must stay inside the asset root.
    pub fn read(&self, name: &str) -> AssetResponse {
        let relative = Path::new(name);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            tracing::warn!("Refusing to read asset outside the asset root: {name}");
            return AssetResponse::NotFound;
        }
        let path = self.root.join(relative);
        match fs::read_to_string(&path) {
            Ok(content) => AssetResponse::Content(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("Asset {} not found", path.display());
                AssetResponse::NotFound
            }
            Err(e) => {
                tracing::warn!("Failed to read asset {}: {e}", path.display());
                AssetResponse::IoError {
                    message: e.to_string(),
                }
            }
        }
    }
}
