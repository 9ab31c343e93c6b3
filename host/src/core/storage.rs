//! A named local storage scope.
//!
//! All keys of a scope live in one JSON file, `<dir>/<name>.json`, mapping each key to its
//! base64 encoded value. The file is read when the scope is opened and rewritten after every
//! change, so a value is durable once `set` has returned.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::prelude::*;

pub struct SettingsScope {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl SettingsScope {
    /// Open the scope `name` in `dir`, creating the directory if needed. A scope which has never
    /// been written to is empty.
    pub fn open(dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create storage directory {}", dir.display()))?;
        let path = dir.join(format!("{name}.json"));
        let entries = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json)
                .with_context(|| format!("Corrupt storage scope {}", path.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        tracing::debug!("Opened storage scope {} with {} keys", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    /// Get a value from the scope.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.entries
            .get(key)
            .map(|encoded| {
                BASE64_STANDARD
                    .decode(encoded)
                    .with_context(|| format!("Bad encoding of {key}"))
            })
            .transpose()
    }

    /// Set a value and return the previous one. If the value cannot be written, the scope is left
    /// unchanged.
    pub fn set(&mut self, key: String, value: &[u8]) -> Result<Option<Vec<u8>>> {
        let previous = self.get(&key).ok().flatten();
        let old = self.entries.insert(key.clone(), BASE64_STANDARD.encode(value));
        if let Err(e) = self.flush() {
            match old {
                Some(old) => self.entries.insert(key, old),
                None => self.entries.remove(&key),
            };
            return Err(e);
        }
        Ok(previous)
    }

    /// Delete a value and return the previous one.
    pub fn delete(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        let previous = self.get(key).ok().flatten();
        if let Some(old) = self.entries.remove(key) {
            if let Err(e) = self.flush() {
                self.entries.insert(key.to_string(), old);
                return Err(e);
            }
        }
        Ok(previous)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All keys starting with `prefix`, in order.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Write the scope to disk, replacing the old file atomically.
    fn flush(&self) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, SettingsScope) {
        let dir = tempfile::tempdir().unwrap();
        let scope = SettingsScope::open(dir.path(), "AppSettings").unwrap();
        (dir, scope)
    }

    #[test]
    fn empty_scope() {
        let (_dir, scope) = setup();
        assert_eq!(scope.get("unit").unwrap(), None);
        assert!(!scope.exists("unit"));
    }

    #[test]
    fn set_returns_previous() {
        let (_dir, mut scope) = setup();
        assert_eq!(scope.set("unit".into(), b"metric").unwrap(), None);
        assert_eq!(
            scope.set("unit".into(), b"imperial").unwrap(),
            Some(b"metric".to_vec())
        );
        assert_eq!(scope.get("unit").unwrap(), Some(b"imperial".to_vec()));
    }

    #[test]
    fn values_survive_reopen() {
        let (dir, mut scope) = setup();
        scope.set("theme".into(), b"dark").unwrap();
        scope.set("empty".into(), b"").unwrap();
        drop(scope);

        let scope = SettingsScope::open(dir.path(), "AppSettings").unwrap();
        assert_eq!(scope.get("theme").unwrap(), Some(b"dark".to_vec()));
        assert_eq!(scope.get("empty").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn scopes_are_isolated() {
        let (dir, mut scope) = setup();
        scope.set("theme".into(), b"dark").unwrap();
        let other = SettingsScope::open(dir.path(), "Other").unwrap();
        assert_eq!(other.get("theme").unwrap(), None);
    }

    #[test]
    fn delete_and_list() {
        let (_dir, mut scope) = setup();
        scope.set("map.zoom".into(), b"12").unwrap();
        scope.set("map.style".into(), b"night").unwrap();
        scope.set("unit".into(), b"metric").unwrap();
        assert_eq!(scope.keys_with_prefix("map."), vec!["map.style", "map.zoom"]);

        assert_eq!(scope.delete("map.zoom").unwrap(), Some(b"12".to_vec()));
        assert_eq!(scope.delete("map.zoom").unwrap(), None);
        assert_eq!(scope.keys_with_prefix(""), vec!["map.style", "unit"]);
    }

    #[test]
    fn failed_write_keeps_old_state() {
        let (dir, mut scope) = setup();
        scope.set("theme".into(), b"light").unwrap();
        // A directory in place of the temp file makes every write fail.
        fs::create_dir(dir.path().join("AppSettings.json.tmp")).unwrap();

        assert!(scope.set("theme".into(), b"dark").is_err());
        assert!(scope.set("unit".into(), b"metric").is_err());
        assert!(scope.delete("theme").is_err());
        assert_eq!(scope.get("theme").unwrap(), Some(b"light".to_vec()));
        assert_eq!(scope.get("unit").unwrap(), None);
        assert_eq!(scope.keys_with_prefix(""), vec!["theme"]);

        let reopened = SettingsScope::open(dir.path(), "AppSettings").unwrap();
        assert_eq!(reopened.get("theme").unwrap(), Some(b"light".to_vec()));
        assert_eq!(reopened.get("unit").unwrap(), None);
    }

    #[test]
    fn corrupt_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("AppSettings.json"), "not json").unwrap();
        assert!(SettingsScope::open(dir.path(), "AppSettings").is_err());
    }
}
