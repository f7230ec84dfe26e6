use crate::{
    error::{AvatarError, Result},
    models::ModelConfig,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

pub const STORAGE_KEY: &str = "avatar_maker_model_config";

/// Persistence for the user's model configuration. No stored value means
/// the client is unconfigured.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load(&self) -> Result<Option<ModelConfig>>;
    async fn save(&self, config: &ModelConfig) -> Result<()>;
    async fn clear(&self) -> Result<()>;
    async fn has_config(&self) -> bool;
}

/// A JSON object of string entries on disk, keyed like browser local storage.
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                AvatarError::Storage(format!("corrupt store {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(AvatarError::Storage(e.to_string())),
        }
    }

    async fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AvatarError::Storage(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| AvatarError::Storage(e.to_string()))
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load(&self) -> Result<Option<ModelConfig>> {
        self.read_entries()
            .await?
            .get(STORAGE_KEY)
            .map(|raw| serde_json::from_str(raw).map_err(AvatarError::from))
            .transpose()
    }

    async fn save(&self, config: &ModelConfig) -> Result<()> {
        let mut entries = self.read_entries().await?;
        entries.insert(STORAGE_KEY.to_string(), serde_json::to_string(config)?);
        self.write_entries(&entries).await
    }

    async fn clear(&self) -> Result<()> {
        let mut entries = self.read_entries().await?;
        if entries.remove(STORAGE_KEY).is_some() {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }

    async fn has_config(&self) -> bool {
        self.read_entries()
            .await
            .map(|entries| entries.contains_key(STORAGE_KEY))
            .unwrap_or(false)
    }
}

#[derive(Default)]
pub struct MemoryConfigStore {
    raw: Mutex<Option<String>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &ModelConfig) -> Result<Self> {
        Ok(Self {
            raw: Mutex::new(Some(serde_json::to_string(config)?)),
        })
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> Result<Option<ModelConfig>> {
        let raw = self
            .raw
            .lock()
            .map_err(|_| AvatarError::Storage("config store lock poisoned".into()))?;
        raw.as_deref()
            .map(|raw| serde_json::from_str(raw).map_err(AvatarError::from))
            .transpose()
    }

    async fn save(&self, config: &ModelConfig) -> Result<()> {
        let serialized = serde_json::to_string(config)?;
        let mut raw = self
            .raw
            .lock()
            .map_err(|_| AvatarError::Storage("config store lock poisoned".into()))?;
        *raw = Some(serialized);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut raw = self
            .raw
            .lock()
            .map_err(|_| AvatarError::Storage("config store lock poisoned".into()))?;
        *raw = None;
        Ok(())
    }

    async fn has_config(&self) -> bool {
        self.raw.lock().map(|raw| raw.is_some()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ModelConfig {
        ModelConfig::new("https://api.example.com", "sk-test", "gemini-image")
    }

    async fn exercise(store: &dyn ConfigStore) {
        assert!(!store.has_config().await);
        assert_eq!(store.load().await.unwrap(), None);

        store.save(&config()).await.unwrap();
        assert!(store.has_config().await);
        assert_eq!(store.load().await.unwrap(), Some(config()));

        store.clear().await.unwrap();
        assert!(!store.has_config().await);
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store() {
        exercise(&MemoryConfigStore::new()).await;
        let seeded = MemoryConfigStore::with_config(&config()).unwrap();
        assert_eq!(seeded.load().await.unwrap(), Some(config()));
    }

    #[tokio::test]
    async fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        exercise(&FileConfigStore::new(dir.path().join("state/storage.json"))).await;
    }

    #[tokio::test]
    async fn test_file_store_keeps_other_keys_and_wire_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, r#"{ "theme": "dark" }"#).unwrap();

        let store = FileConfigStore::new(&path);
        store.save(&config()).await.unwrap();
        store.clear().await.unwrap();
        let entries: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(entries.get("theme").map(String::as_str), Some("dark"));

        store.save(&config()).await.unwrap();
        let entries: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(entries[STORAGE_KEY].contains("\"baseURL\""));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, format!(r#"{{ "{}": "not json" }}"#, STORAGE_KEY)).unwrap();

        let store = FileConfigStore::new(&path);
        assert!(store.has_config().await);
        assert!(store.load().await.is_err());
    }
}
