// One-letter nicknames: members' display names are cut down to their first
// `max_len` characters while the rule is enabled in a guild.

/// Returns the nickname to apply, or `None` when `name` already complies.
pub fn trim_nickname(name: &str, max_len: usize) -> Option<String> {
    let max_len = max_len.max(1);
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return None;
    }

    let count = trimmed.chars().count();
    if count <= max_len && trimmed.len() == name.len() {
        return None;
    }

    Some(trimmed.chars().take(max_len).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_name_trimmed() {
        assert_eq!(trim_nickname("Alice", 1), Some("A".to_string()));
        assert_eq!(trim_nickname("Alice", 3), Some("Ali".to_string()));
    }

    #[test]
    fn test_compliant_name_untouched() {
        assert_eq!(trim_nickname("A", 1), None);
        assert_eq!(trim_nickname("Al", 2), None);
    }

    #[test]
    fn test_padding_is_removed() {
        assert_eq!(trim_nickname(" B ", 1), Some("B".to_string()));
    }

    #[test]
    fn test_multibyte_first_letter() {
        assert_eq!(trim_nickname("Émile", 1), Some("É".to_string()));
    }

    #[test]
    fn test_blank_name_ignored() {
        assert_eq!(trim_nickname("   ", 1), None);
    }
}
