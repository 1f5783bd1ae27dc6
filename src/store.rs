use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use parking_lot::RwLock;

/// Opaque key-value persistence, the same surface the host app's storage
/// layer exposes.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    fn multi_remove(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }

    fn all_keys(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn all_keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}

/// Single-file JSON store, one flat object mapping keys to string values.
/// Re-read on every call and rewritten on every mutation, which is fine at
/// habit-edit frequency.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("unable to read store file {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid store file {}", self.path.display()))
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("unable to create store directory {}", parent.display())
                })?;
            }
        }
        let text = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, format!("{text}\n"))
            .with_context(|| format!("unable to write store file {}", self.path.display()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }

    fn multi_remove(&self, keys: &[String]) -> Result<()> {
        let mut entries = self.load()?;
        let mut changed = false;
        for key in keys {
            changed |= entries.remove(key).is_some();
        }
        if changed {
            self.save(&entries)?;
        }
        Ok(())
    }

    fn all_keys(&self) -> Result<Vec<String>> {
        Ok(self.load()?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        store.set("a", "1").expect("set");
        store.set("b", "2").expect("set");
        assert_eq!(store.get("a").expect("get"), Some("1".to_string()));
        store.remove("a").expect("remove");
        assert_eq!(store.get("a").expect("get"), None);
        assert_eq!(store.all_keys().expect("keys"), vec!["b".to_string()]);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("reminders.json");

        let store = JsonFileStore::new(&path);
        store.set("notification_h1", r#"["abc"]"#).expect("set");
        drop(store);

        let reopened = JsonFileStore::new(&path);
        assert_eq!(
            reopened.get("notification_h1").expect("get"),
            Some(r#"["abc"]"#.to_string())
        );
    }

    #[test]
    fn file_store_reads_empty_when_missing() {
        let dir = tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("missing.json"));
        assert_eq!(store.get("anything").expect("get"), None);
        assert!(store.all_keys().expect("keys").is_empty());
    }

    #[test]
    fn file_store_multi_remove_deletes_listed_keys() {
        let dir = tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("reminders.json"));
        store.set("notification_h1", "a").expect("set");
        store.set("notification_h2", "b").expect("set");
        store.set("habits", "[]").expect("set");

        store
            .multi_remove(&["notification_h1".to_string(), "notification_h2".to_string()])
            .expect("multi remove");
        assert_eq!(store.all_keys().expect("keys"), vec!["habits".to_string()]);
    }
}
