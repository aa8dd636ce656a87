use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::debug;

use super::{PreferenceStore, replace_file};

type Preferences = BTreeMap<String, BTreeMap<String, String>>;

/// Stores preferences as a JSON object keyed by user, then by preference key:
/// ```json
/// {
///   "local": { "gradeSystem": "percentage", "displayLabel": "gpa" }
/// }
/// ```
pub struct JsonPreferenceStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonPreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Preferences> {
        if !self.path.exists() {
            return Ok(Preferences::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    fn save(&self, preferences: &Preferences) -> Result<()> {
        let content = serde_json::to_string_pretty(preferences)?;
        replace_file(&self.path, |file| Ok(file.write_all(content.as_bytes())?))
    }
}

#[async_trait::async_trait]
impl PreferenceStore for JsonPreferenceStore {
    async fn get(&self, user_id: &str, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .load()?
            .get(user_id)
            .and_then(|prefs| prefs.get(key))
            .cloned())
    }

    async fn set(&self, user_id: &str, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut preferences = self.load()?;
        preferences
            .entry(user_id.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self.save(&preferences)?;
        debug!(user_id, key, value, "Preference saved");
        Ok(())
    }
}
