// sArCaStIc replies.

use std::collections::BTreeSet;

/// Alternates letter case, starting lowercase. Non-letters don't advance the
/// alternation, and mentions, emoji tags and links are left untouched so they
/// still render.
pub fn sarcastify(text: &str) -> String {
    let mut upper = false;
    let mut out = String::with_capacity(text.len());

    for (i, token) in text.split(' ').enumerate() {
        if i > 0 {
            out.push(' ');
        }
        if is_verbatim(token) {
            out.push_str(token);
            continue;
        }
        for c in token.chars() {
            if c.is_alphabetic() {
                if upper {
                    out.extend(c.to_uppercase());
                } else {
                    out.extend(c.to_lowercase());
                }
                upper = !upper;
            } else {
                out.push(c);
            }
        }
    }

    out
}

fn is_verbatim(token: &str) -> bool {
    token.starts_with("http://")
        || token.starts_with("https://")
        || (token.starts_with('<') && token.ends_with('>'))
}

/// Targets always get a reply; everyone else gets one with `chance`.
/// `roll` is a uniform sample in `[0, 1)`.
pub fn should_reply(author_id: u64, targets: &BTreeSet<u64>, chance: f64, roll: f64) -> bool {
    targets.contains(&author_id) || roll < chance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternates_case() {
        assert_eq!(sarcastify("hello"), "hElLo");
        assert_eq!(sarcastify("I LOVE mondays"), "i LoVe MoNdAyS");
    }

    #[test]
    fn test_punctuation_does_not_advance() {
        assert_eq!(sarcastify("a.b,c"), "a.B,c");
    }

    #[test]
    fn test_mentions_and_links_preserved() {
        assert_eq!(
            sarcastify("hi <@123> see https://Example.com ok"),
            "hI <@123> sEe https://Example.com Ok"
        );
    }

    #[test]
    fn test_should_reply() {
        let targets: BTreeSet<u64> = [5].into_iter().collect();
        assert!(should_reply(5, &targets, 0.0, 0.99));
        assert!(!should_reply(6, &targets, 0.0, 0.0));
        assert!(should_reply(6, &targets, 0.5, 0.2));
        assert!(!should_reply(6, &targets, 0.5, 0.7));
    }
}
