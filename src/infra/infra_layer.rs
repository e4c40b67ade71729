// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "settings/mod.rs"]
pub mod settings;

#[path = "chat/mod.rs"]
pub mod chat;

#[path = "image/mod.rs"]
pub mod image;

#[path = "lights/mod.rs"]
pub mod lights;

#[path = "audio/mod.rs"]
pub mod audio;
