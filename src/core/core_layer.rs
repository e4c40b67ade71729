// The core module contains all business logic.
// Each feature gets its own submodule. Nothing in here knows about Discord.

#[path = "settings/mod.rs"]
pub mod settings;

#[path = "chat/mod.rs"]
pub mod chat;

#[path = "image/mod.rs"]
pub mod image;

#[path = "replies/mod.rs"]
pub mod replies;

#[path = "lights/light_service.rs"]
pub mod lights;

#[path = "audio/mod.rs"]
pub mod audio;
