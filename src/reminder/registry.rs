use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::store::KeyValueStore;

pub const REGISTRY_KEY_PREFIX: &str = "notification_";

/// Persistent map from habit id to the notification identifiers that habit
/// currently owns. No in-memory cache; every call round-trips the store.
pub struct NotificationRegistry {
    store: Arc<dyn KeyValueStore>,
}

impl NotificationRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key_for(habit_id: &str) -> String {
        format!("{REGISTRY_KEY_PREFIX}{habit_id}")
    }

    /// Missing entries, decode failures, and store read failures all degrade
    /// to an empty list; the failures are logged so they stay observable.
    pub fn get(&self, habit_id: &str) -> Vec<String> {
        let value = match self.store.get(&Self::key_for(habit_id)) {
            Ok(Some(value)) => value,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(habit_id, error = %err, "failed to read notification registry entry");
                return Vec::new();
            }
        };
        decode_identifiers(habit_id, &value)
    }

    pub fn set(&self, habit_id: &str, identifiers: &[String]) -> Result<()> {
        let encoded = serde_json::to_string(identifiers)?;
        self.store.set(&Self::key_for(habit_id), &encoded)
    }

    pub fn remove(&self, habit_id: &str) -> Result<()> {
        self.store.remove(&Self::key_for(habit_id))
    }

    pub fn all_keys(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .all_keys()?
            .into_iter()
            .filter(|key| key.starts_with(REGISTRY_KEY_PREFIX))
            .collect())
    }

    pub fn clear_all(&self) -> Result<()> {
        let keys = self.all_keys()?;
        self.store.multi_remove(&keys)
    }
}

/// Current entries are JSON arrays; very old installs stored a single bare
/// identifier string, which must still decode.
fn decode_identifiers(habit_id: &str, value: &str) -> Vec<String> {
    if value.starts_with('[') {
        match serde_json::from_str(value) {
            Ok(identifiers) => identifiers,
            Err(err) => {
                warn!(habit_id, error = %err, "malformed notification registry entry");
                Vec::new()
            }
        }
    } else {
        vec![value.to_string()]
    }
}
