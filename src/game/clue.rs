//! Clue admission policy
//!
//! Pure checks run on every submitted clue, in a fixed order where the
//! first failing check wins:
//! 1. trimmed text (clamped to [`MAX_CLUE_CHARS`]) must not be empty
//! 2. submitter must be the current speaker
//! 3. submitter must not already have a clue this round
//! 4. no denylisted word
//! 5. no leak of the secret word
//!
//! Leak detection is a heuristic. Secrets shorter than six characters
//! produce three-character chunks that can reject harmless clues, and
//! misspelled or spaced-out secrets slip through.

use unicode_normalization::UnicodeNormalization;

use crate::error::GameError;
use crate::types::MAX_CLUE_CHARS;

/// Normalized substrings that make a clue unacceptable
const DENYLIST: &[&str] = &[
    "küfür",
    "salak",
    "aptal",
    "gerizekalı",
    "idiot",
    "stupid",
    "moron",
];

/// Shortest secret fragment that counts as a leak
const MIN_CHUNK_CHARS: usize = 3;

/// What the room knows about the submitter when a clue arrives
#[derive(Debug, Clone, Copy)]
pub struct ClueContext<'a> {
    pub submitter: &'a str,
    pub expected_speaker: Option<&'a str>,
    pub already_submitted: bool,
    pub secret: &'a str,
}

/// Run every check and return the cleaned clue text
pub fn validate_clue(ctx: &ClueContext<'_>, raw: &str) -> Result<String, GameError> {
    let text = clamp_clue(raw);
    if text.is_empty() {
        return Err(GameError::EmptyClue);
    }
    if ctx.expected_speaker != Some(ctx.submitter) {
        return Err(GameError::NotYourTurn);
    }
    if ctx.already_submitted {
        return Err(GameError::AlreadySubmitted);
    }
    if contains_profanity(&text) {
        return Err(GameError::Profanity);
    }
    if reveals_secret(&text, ctx.secret) {
        return Err(GameError::LeaksSecret);
    }
    Ok(text)
}

/// Trim and cut to the maximum clue length
pub fn clamp_clue(raw: &str) -> String {
    let clamped: String = raw.trim().chars().take(MAX_CLUE_CHARS).collect();
    clamped.trim_end().to_string()
}

/// Lowercase and strip combining diacritical marks
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfkd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect()
}

pub fn contains_profanity(text: &str) -> bool {
    let text = normalize(text);
    DENYLIST.iter().any(|word| text.contains(&normalize(word)))
}

/// True if the clue embeds the secret or a large enough fragment of it.
///
/// Chunks are `max(3, len / 2)` characters long, taken from every offset
/// that leaves room for at least three characters; chunks at the tail are
/// cut short by the end of the word.
pub fn reveals_secret(clue: &str, secret: &str) -> bool {
    let clue = normalize(clue);
    let secret = normalize(secret);
    if secret.is_empty() {
        return false;
    }
    if clue.contains(&secret) {
        return true;
    }

    let chars: Vec<char> = secret.chars().collect();
    let chunk_len = MIN_CHUNK_CHARS.max(chars.len() / 2);

    (0..chars.len().saturating_sub(MIN_CHUNK_CHARS - 1)).any(|start| {
        let end = (start + chunk_len).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        end - start >= MIN_CHUNK_CHARS && clue.contains(&chunk)
    })
}
