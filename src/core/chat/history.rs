// =============================================================================
// HISTORY ASSEMBLY
// =============================================================================
//
// Turns a window of recent channel messages plus the message that summoned the
// bot into a prompt list:
//
//   [earlier messages, oldest first] -> [system prompt] -> [trigger message]
//
// Opted-out authors never appear. The trigger is always the final entry.

use super::models::{AiMessage, HistoryEntry};
use std::collections::BTreeSet;

/// Builds the ordered prompt for a chat completion.
///
/// # Arguments
/// * `entries` - Recent channel messages in any order; may contain the trigger
/// * `trigger` - The message the bot is answering
/// * `system_prompt` - Persona / instructions, inserted once right before the trigger
/// * `opted_out` - Authors whose messages must not be sent to the model
/// * `limit` - Maximum number of earlier messages to keep (newest are kept)
pub fn build_history(
    entries: &[HistoryEntry],
    trigger: &HistoryEntry,
    system_prompt: &str,
    opted_out: &BTreeSet<u64>,
    limit: usize,
) -> Vec<AiMessage> {
    let mut earlier: Vec<&HistoryEntry> = entries
        .iter()
        .filter(|e| e.message_id != trigger.message_id)
        .filter(|e| is_before(e, trigger))
        .filter(|e| !opted_out.contains(&e.author_id))
        .filter(|e| !e.content.trim().is_empty())
        .collect();

    // Message ids are snowflakes, so they order same-millisecond messages
    earlier.sort_by_key(|e| (e.timestamp_ms, e.message_id));

    let skip = earlier.len().saturating_sub(limit);

    let mut messages: Vec<AiMessage> = earlier
        .into_iter()
        .skip(skip)
        .map(HistoryEntry::to_ai_message)
        .collect();

    messages.push(AiMessage::system(system_prompt));
    messages.push(trigger.to_ai_message());
    messages
}

fn is_before(entry: &HistoryEntry, trigger: &HistoryEntry) -> bool {
    entry.timestamp_ms < trigger.timestamp_ms
        || (entry.timestamp_ms == trigger.timestamp_ms && entry.message_id < trigger.message_id)
}
