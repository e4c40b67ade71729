// "where?" finder: when someone asks "where", point them at the most recent
// message in the channel that replied to or mentioned them.

/// The parts of a channel message the finder looks at.
#[derive(Debug, Clone)]
pub struct RecentMessage {
    pub message_id: u64,
    pub author_id: u64,
    /// Author of the message this one replies to, if it is a reply.
    pub replied_to_author: Option<u64>,
    pub mentioned: Vec<u64>,
    pub timestamp_ms: i64,
}

/// True for "where", "where?", "WHERE??", "where." and the like.
pub fn is_where_question(content: &str) -> bool {
    let normalized = content
        .trim()
        .trim_end_matches(|c: char| c == '?' || c == '!' || c == '.')
        .trim()
        .to_lowercase();
    matches!(normalized.as_str(), "where" | "wher" | "where reply" | "where ping")
}

/// Newest message addressed to `asker_id`, ignoring the asker's own messages.
pub fn find_reply_target(asker_id: u64, recent: &[RecentMessage]) -> Option<&RecentMessage> {
    recent
        .iter()
        .filter(|m| m.author_id != asker_id)
        .filter(|m| m.replied_to_author == Some(asker_id) || m.mentioned.contains(&asker_id))
        .max_by_key(|m| (m.timestamp_ms, m.message_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: u64, author: u64, reply_to: Option<u64>, mentions: &[u64]) -> RecentMessage {
        RecentMessage {
            message_id: id,
            author_id: author,
            replied_to_author: reply_to,
            mentioned: mentions.to_vec(),
            timestamp_ms: id as i64 * 1000,
        }
    }

    #[test]
    fn test_where_variants() {
        assert!(is_where_question("where"));
        assert!(is_where_question("  Where??  "));
        assert!(is_where_question("WHERE!"));
        assert!(is_where_question("where reply?"));
        assert!(!is_where_question("where is the party"));
        assert!(!is_where_question("nowhere"));
    }

    #[test]
    fn test_finds_latest_reply_or_mention() {
        let recent = vec![
            message(1, 2, Some(10), &[]),
            message(2, 3, None, &[10]),
            message(3, 4, None, &[]),
            message(4, 10, Some(10), &[10]),
        ];

        let found = find_reply_target(10, &recent).unwrap();
        assert_eq!(found.message_id, 2);
    }

    #[test]
    fn test_nothing_found() {
        let recent = vec![message(1, 2, Some(99), &[98])];
        assert!(find_reply_target(10, &recent).is_none());
    }
}
