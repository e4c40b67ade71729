// AI emoji reactions: the chat model picks one emoji from the guild's allowed
// list that fits a message, and the bot reacts with it.

/// System instructions for the emoji-picking request.
pub fn emote_instructions(choices: &[String]) -> String {
    format!(
        "You react to Discord messages with a single emoji. \
         Choose the one emoji from this list that best fits the message: {}. \
         Reply with only that emoji. If none fit, reply with NONE.",
        choices.join(" ")
    )
}

/// Returns the allowed emoji that appears earliest in the model response.
pub fn pick_emoji(response: &str, allowed: &[String]) -> Option<String> {
    allowed
        .iter()
        .filter(|e| !e.is_empty())
        .filter_map(|e| response.find(e.as_str()).map(|pos| (pos, e)))
        .min_by_key(|(pos, e)| (*pos, std::cmp::Reverse(e.len())))
        .map(|(_, e)| e.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        ["😂", "👍", "🔥"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_picks_allowed_emoji() {
        assert_eq!(pick_emoji("🔥", &allowed()), Some("🔥".to_string()));
    }

    #[test]
    fn test_picks_earliest_when_several() {
        assert_eq!(
            pick_emoji("Probably 👍 or maybe 😂", &allowed()),
            Some("👍".to_string())
        );
    }

    #[test]
    fn test_rejects_unlisted_emoji() {
        assert_eq!(pick_emoji("🤡", &allowed()), None);
        assert_eq!(pick_emoji("NONE", &allowed()), None);
    }

    #[test]
    fn test_prefers_longer_match_at_same_position() {
        let allowed: Vec<String> = ["❤", "❤️"].iter().map(|s| s.to_string()).collect();
        assert_eq!(pick_emoji("❤️", &allowed), Some("❤️".to_string()));
    }

    #[test]
    fn test_instructions_list_choices() {
        let text = emote_instructions(&allowed());
        assert!(text.contains("😂 👍 🔥"));
    }
}
