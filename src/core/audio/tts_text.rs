// Text preparation for speech synthesis. The TTS endpoint caps each request,
// so long text is split into pieces that each fit.

/// Per-request character cap of the translate TTS endpoint.
pub const TTS_CHUNK_LIMIT: usize = 100;

/// Longest text accepted by `/tts` at all.
pub const TTS_MAX_CHARS: usize = 1000;

/// Splits `text` into chunks of at most `limit` characters.
///
/// Breaks after sentence punctuation when possible, then on whitespace, and
/// hard-cuts only words longer than the limit. Chunks are trimmed and never empty.
pub fn chunk_tts_text(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let cleaned = clean_for_speech(text);
    let mut chunks = Vec::new();
    let mut rest: Vec<char> = cleaned.chars().collect();

    while rest.len() > limit {
        let window = &rest[..limit];
        let cut = window
            .iter()
            .rposition(|c| matches!(c, '.' | '!' | '?' | ';' | ':' | ',' | '\n'))
            .map(|i| i + 1)
            .or_else(|| window.iter().rposition(|c| c.is_whitespace()))
            .filter(|&i| i > 0)
            .unwrap_or(limit);

        let chunk: String = rest[..cut].iter().collect();
        push_chunk(&mut chunks, &chunk);
        rest.drain(..cut);
    }

    let tail: String = rest.into_iter().collect();
    push_chunk(&mut chunks, &tail);
    chunks
}

fn push_chunk(chunks: &mut Vec<String>, chunk: &str) {
    let chunk = chunk.trim();
    if !chunk.is_empty() {
        chunks.push(chunk.to_string());
    }
}

/// Collapses whitespace and drops Discord markup that sounds silly read aloud.
pub fn clean_for_speech(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| !(word.starts_with("<") && word.ends_with(">")))
        .map(|word| word.trim_matches(|c| c == '*' || c == '_' || c == '`' || c == '~'))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
