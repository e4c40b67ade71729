//! Formatting helpers for sending model output to Discord.

/// Discord's hard limit for message content.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Splits text into chunks of at most `limit` characters.
///
/// Prefers to break on the last newline inside the window, then the last space,
/// and only cuts mid-word when a single word is longer than the limit.
pub fn split_for_discord(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut rest: Vec<char> = text.trim().chars().collect();

    while rest.len() > limit {
        let window = &rest[..limit];
        let cut = window
            .iter()
            .rposition(|c| *c == '\n')
            .or_else(|| window.iter().rposition(|c| c.is_whitespace()))
            .filter(|&i| i > 0)
            .unwrap_or(limit);

        let chunk: String = rest[..cut].iter().collect();
        let chunk = chunk.trim_end().to_string();
        if !chunk.is_empty() {
            chunks.push(chunk);
        }

        // Drop the separator we broke on
        let next = if cut < limit { cut + 1 } else { cut };
        rest.drain(..next);
    }

    let tail: String = rest.into_iter().collect();
    if !tail.trim().is_empty() {
        chunks.push(tail);
    }

    chunks
}

/// Shortens text for an embed field, appending an ellipsis when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        assert_eq!(split_for_discord("hello", 2000), vec!["hello"]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(split_for_discord("   ", 2000).is_empty());
    }

    #[test]
    fn test_prefers_newline_breaks() {
        let text = "line one\nline two\nline three";
        let chunks = split_for_discord(text, 18);
        assert_eq!(chunks, vec!["line one\nline two", "line three"]);
    }

    #[test]
    fn test_long_word_is_cut() {
        let text = "a".repeat(25);
        let chunks = split_for_discord(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn test_multibyte_safe() {
        let text = "é".repeat(30);
        let chunks = split_for_discord(&text, 7);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdef", 10), "abcdef");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }
}
