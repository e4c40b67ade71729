// Discord commands module.
// Each feature gets its own command file.

pub mod chat;

pub mod lights;

pub mod audio;

pub mod settings;

pub mod oneletter;

// Bot presence management
pub mod presence;

use super::{Data, Error};

/// Every slash command the bot registers.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        chat::chat(),
        chat::ai(),
        super::image::imagine::imagine(),
        lights::light(),
        audio::join(),
        audio::leave(),
        audio::tts(),
        audio::sfx(),
        settings::settings(),
        oneletter::oneletter(),
    ]
}
