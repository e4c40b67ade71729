use crate::core::settings::{GuildSettings, SettingsDocument, SettingsError, SettingsStore};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::{Mutex, RwLock};

/// JSON-file settings store. The whole document is cached in memory and
/// rewritten on every save:
/// { "global": GuildSettings, "guilds": { guild_id: GuildSettings } }
pub struct JsonSettingsStore {
    path: PathBuf,
    cache: RwLock<SettingsDocument>,
    /// One writer at a time for the temp file and the rename.
    persist_lock: Mutex<()>,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let cache = if path.exists() {
            let file = std::fs::File::open(&path)?;
            serde_json::from_reader(std::io::BufReader::new(file))?
        } else {
            SettingsDocument::default()
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
            persist_lock: Mutex::new(()),
        })
    }

    /// Writes to a sibling temp file first so a crash never leaves half a document.
    async fn persist(&self) -> Result<(), SettingsError> {
        // Snapshot under the lock so the last rename always carries the newest document
        let _persisting = self.persist_lock.lock().await;
        let bytes = {
            let cache = self.cache.read().await;
            serde_json::to_vec_pretty(&*cache)?
        };

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn load_global(&self) -> Result<GuildSettings, SettingsError> {
        Ok(self.cache.read().await.global.clone())
    }

    async fn save_global(&self, settings: GuildSettings) -> Result<(), SettingsError> {
        let mut cache = self.cache.write().await;
        cache.global = settings;
        drop(cache); // Release lock before persisting
        self.persist().await
    }

    async fn load_guild(&self, guild_id: u64) -> Result<GuildSettings, SettingsError> {
        let cache = self.cache.read().await;
        Ok(cache.guilds.get(&guild_id).cloned().unwrap_or_default())
    }

    async fn save_guild(
        &self,
        guild_id: u64,
        settings: GuildSettings,
    ) -> Result<(), SettingsError> {
        let mut cache = self.cache.write().await;
        if settings == GuildSettings::default() {
            cache.guilds.remove(&guild_id);
        } else {
            cache.guilds.insert(guild_id, settings);
        }
        drop(cache);
        self.persist().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image::ImageBackend;
    use crate::core::settings::{ChatDefaults, SettingsService};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_persists_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = JsonSettingsStore::new(&path).unwrap();
        let mut guild = GuildSettings::default();
        guild.image.backend = Some(ImageBackend::Horde);
        guild.opted_out.insert(7);
        store.save_guild(42, guild).await.unwrap();

        let mut global = GuildSettings::default();
        global.chat.temperature = Some(0.3);
        store.save_global(global).await.unwrap();

        let reloaded = JsonSettingsStore::new(&path).unwrap();
        let guild = reloaded.load_guild(42).await.unwrap();
        assert_eq!(guild.image.backend, Some(ImageBackend::Horde));
        assert!(guild.opted_out.contains(&7));
        assert_eq!(reloaded.load_global().await.unwrap().chat.temperature, Some(0.3));
        assert!(!dir.path().join("settings.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_unknown_guild_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.load_guild(1).await.unwrap(), GuildSettings::default());
    }

    #[tokio::test]
    async fn test_saving_default_drops_guild_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = JsonSettingsStore::new(&path).unwrap();

        let mut guild = GuildSettings::default();
        guild.opted_out.insert(1);
        store.save_guild(9, guild).await.unwrap();
        store.save_guild(9, GuildSettings::default()).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("\"9\""));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonSettingsStore::new(&path),
            Err(SettingsError::Serialization(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_opt_outs_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let service = Arc::new(SettingsService::new(
            JsonSettingsStore::new(&path).unwrap(),
            ChatDefaults {
                model: "gpt-4o-mini".to_string(),
                system_prompt: "sys".to_string(),
            },
        ));

        let tasks: Vec<_> = (0..64u64)
            .map(|user| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.opt_out(1, user).await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().unwrap());
        }

        let reloaded = JsonSettingsStore::new(&path).unwrap();
        assert_eq!(reloaded.load_guild(1).await.unwrap().opted_out.len(), 64);
        assert!(!dir.path().join("settings.json.tmp").exists());
    }
}
