// Settings service - resolves layered guild/global configuration.
//
// The store only knows how to load and save layers. Resolution (guild override,
// then global default, then built-in default) lives here so every feature gets
// the same behaviour.

use super::settings_models::{
    ChatDefaults, EffectiveChatSettings, EffectiveImageSettings, EffectiveReplySettings,
    GuildSettings,
};
use async_trait::async_trait;
use std::collections::BTreeSet;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Port for persisting settings layers.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load_global(&self) -> Result<GuildSettings, SettingsError>;
    async fn save_global(&self, settings: GuildSettings) -> Result<(), SettingsError>;
    /// Returns the default (empty) layer for guilds that never saved anything.
    async fn load_guild(&self, guild_id: u64) -> Result<GuildSettings, SettingsError>;
    async fn save_guild(&self, guild_id: u64, settings: GuildSettings)
        -> Result<(), SettingsError>;
}

pub struct SettingsService<S: SettingsStore> {
    store: S,
    chat_defaults: ChatDefaults,
    /// Held across load, mutate and save so concurrent updates can't drop each other.
    write_lock: Mutex<()>,
}

impl<S: SettingsStore> SettingsService<S> {
    pub fn new(store: S, chat_defaults: ChatDefaults) -> Self {
        Self {
            store,
            chat_defaults,
            write_lock: Mutex::new(()),
        }
    }

    async fn layers(
        &self,
        guild_id: Option<u64>,
    ) -> Result<(GuildSettings, GuildSettings), SettingsError> {
        let global = self.store.load_global().await?;
        let guild = match guild_id {
            Some(id) => self.store.load_guild(id).await?,
            None => GuildSettings::default(),
        };
        Ok((guild, global))
    }

    /// Image settings for a guild. DMs (`None`) only see the global layer.
    pub async fn image(
        &self,
        guild_id: Option<u64>,
    ) -> Result<EffectiveImageSettings, SettingsError> {
        let (guild, global) = self.layers(guild_id).await?;
        Ok(EffectiveImageSettings::resolve(&guild.image, &global.image))
    }

    pub async fn chat(
        &self,
        guild_id: Option<u64>,
    ) -> Result<EffectiveChatSettings, SettingsError> {
        let (guild, global) = self.layers(guild_id).await?;
        Ok(EffectiveChatSettings::resolve(
            &guild.chat,
            &global.chat,
            &self.chat_defaults,
        ))
    }

    pub async fn replies(&self, guild_id: u64) -> Result<EffectiveReplySettings, SettingsError> {
        let (guild, global) = self.layers(Some(guild_id)).await?;
        Ok(EffectiveReplySettings::resolve(&guild, &global))
    }

    /// Raw guild layer, for showing what a guild actually overrides.
    pub async fn guild_layer(&self, guild_id: u64) -> Result<GuildSettings, SettingsError> {
        self.store.load_guild(guild_id).await
    }

    pub async fn global_layer(&self) -> Result<GuildSettings, SettingsError> {
        self.store.load_global().await
    }

    pub async fn update_guild<F>(&self, guild_id: u64, f: F) -> Result<(), SettingsError>
    where
        F: FnOnce(&mut GuildSettings) + Send,
    {
        let _write = self.write_lock.lock().await;
        let mut settings = self.store.load_guild(guild_id).await?;
        f(&mut settings);
        self.store.save_guild(guild_id, settings).await
    }

    pub async fn update_global<F>(&self, f: F) -> Result<(), SettingsError>
    where
        F: FnOnce(&mut GuildSettings) + Send,
    {
        let _write = self.write_lock.lock().await;
        let mut settings = self.store.load_global().await?;
        f(&mut settings);
        self.store.save_global(settings).await
    }

    /// Returns `true` if the user was not already opted out.
    pub async fn opt_out(&self, guild_id: u64, user_id: u64) -> Result<bool, SettingsError> {
        let mut inserted = false;
        self.update_guild(guild_id, |s| inserted = s.opted_out.insert(user_id))
            .await?;
        Ok(inserted)
    }

    /// Returns `true` if the user had been opted out.
    pub async fn opt_in(&self, guild_id: u64, user_id: u64) -> Result<bool, SettingsError> {
        let mut removed = false;
        self.update_guild(guild_id, |s| removed = s.opted_out.remove(&user_id))
            .await?;
        Ok(removed)
    }

    pub async fn opted_out(&self, guild_id: Option<u64>) -> Result<BTreeSet<u64>, SettingsError> {
        match guild_id {
            Some(id) => Ok(self.store.load_guild(id).await?.opted_out),
            None => Ok(BTreeSet::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image::ImageBackend;
    use dashmap::DashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct MemoryStore {
        global: RwLock<GuildSettings>,
        guilds: DashMap<u64, GuildSettings>,
    }

    #[async_trait]
    impl SettingsStore for MemoryStore {
        async fn load_global(&self) -> Result<GuildSettings, SettingsError> {
            Ok(self.global.read().await.clone())
        }

        async fn save_global(&self, settings: GuildSettings) -> Result<(), SettingsError> {
            *self.global.write().await = settings;
            Ok(())
        }

        async fn load_guild(&self, guild_id: u64) -> Result<GuildSettings, SettingsError> {
            // Widen the gap between load and save like a real backend would
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok(self
                .guilds
                .get(&guild_id)
                .map(|s| s.clone())
                .unwrap_or_default())
        }

        async fn save_guild(
            &self,
            guild_id: u64,
            settings: GuildSettings,
        ) -> Result<(), SettingsError> {
            self.guilds.insert(guild_id, settings);
            Ok(())
        }
    }

    fn service() -> SettingsService<MemoryStore> {
        SettingsService::new(
            MemoryStore::default(),
            ChatDefaults {
                model: "gpt-4o-mini".to_string(),
                system_prompt: "You are helpful.".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_guild_override_then_global_then_default() {
        let service = service();
        service
            .update_global(|s| {
                s.image.backend = Some(ImageBackend::Horde);
                s.image.steps = Some(40);
            })
            .await
            .unwrap();
        service
            .update_guild(1, |s| s.image.steps = Some(12))
            .await
            .unwrap();

        let guild = service.image(Some(1)).await.unwrap();
        assert_eq!(guild.backend, ImageBackend::Horde);
        assert_eq!(guild.steps, 12);

        let other = service.image(Some(2)).await.unwrap();
        assert_eq!(other.steps, 40);

        let dm = service.image(None).await.unwrap();
        assert_eq!(dm.steps, 40);
        assert_eq!(dm.width, 512);
    }

    #[tokio::test]
    async fn test_opt_out_round() {
        let service = service();
        assert!(service.opt_out(1, 99).await.unwrap());
        assert!(!service.opt_out(1, 99).await.unwrap());
        assert!(service.opted_out(Some(1)).await.unwrap().contains(&99));
        assert!(service.opted_out(Some(2)).await.unwrap().is_empty());

        assert!(service.opt_in(1, 99).await.unwrap());
        assert!(!service.opt_in(1, 99).await.unwrap());
        assert!(service.opted_out(Some(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chat_uses_defaults() {
        let service = service();
        let chat = service.chat(Some(5)).await.unwrap();
        assert_eq!(chat.model, "gpt-4o-mini");
        assert_eq!(chat.history_limit, 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_opt_outs_are_all_kept() {
        let service = Arc::new(service());

        let tasks: Vec<_> = (0..64u64)
            .map(|user| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.opt_out(1, user).await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().unwrap());
        }

        assert_eq!(service.opted_out(Some(1)).await.unwrap().len(), 64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_global_updates_are_all_kept() {
        let service = Arc::new(service());

        let tasks: Vec<_> = (0..16u64)
            .map(|user| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .update_global(|s| {
                            s.sarcastic_targets.insert(user);
                        })
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(service.global_layer().await.unwrap().sarcastic_targets.len(), 16);
    }
}
