// Reply and moderation utilities. All pure functions; the Discord layer decides
// when to call them based on the guild's reply settings.

pub mod ai_emote;
pub mod one_letter;
pub mod sarcastic;
pub mod where_reply;

pub use ai_emote::{emote_instructions, pick_emoji};
pub use one_letter::trim_nickname;
pub use sarcastic::{sarcastify, should_reply};
pub use where_reply::{find_reply_target, is_where_question, RecentMessage};
