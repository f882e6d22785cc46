//! Text chunking: split prose into post-sized pieces.
//!
//! Sentences are the preferred unit: a reader should never see a sentence cut
//! in half when it fits in one post. Only sentences longer than the budget
//! are packed word by word, and every cut is marked with `...` at the end of
//! the closed chunk and at the start of the continuation.
//!
//! Lengths are counted in Unicode scalar values, not bytes.

use tracing::debug;

/// Marker appended to a cut chunk and prepended to its continuation.
pub const ELLIPSIS: &str = "...";

/// Abbreviations whose trailing period never ends a sentence.
///
/// Compared case-insensitively against the token before the period, with
/// internal periods kept (`e.g`, `u.s`).
pub const DEFAULT_ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "st", "no", "nos", "vol", "vols", "art", "arts", "para",
    "fig", "figs", "e.g", "i.e", "etc", "cf", "vs", "inc", "ltd", "co", "corp", "jr", "sr",
    "rev", "gen", "gov", "sen", "rep", "amb", "u.s", "u.k", "u.n", "approx", "est", "dept",
    "ch", "sect", "sec", "op", "cit", "ibid", "jan", "feb", "mar", "apr", "jun", "jul", "aug",
    "sep", "sept", "oct", "nov", "dec",
];

/// Character length as the platforms count it.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split `text` into chunks of at most `max_length` characters using the
/// default abbreviation list extended with `p`, `pp` and `paras`.
pub fn chunk(text: &str, max_length: usize) -> Vec<String> {
    let extra = ["paras".to_string(), "pp".to_string(), "p".to_string()];
    chunk_with(text, max_length, &extra)
}

/// Split `text` into chunks of at most `max_length` characters.
///
/// `abbreviations` extends [`DEFAULT_ABBREVIATIONS`]. The result is empty
/// only for blank input. A word longer than `max_length - 4` cannot be split
/// and is emitted as its own, oversized chunk.
pub fn chunk_with(text: &str, max_length: usize, abbreviations: &[String]) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if char_len(trimmed) <= max_length {
        return vec![trimmed.to_string()];
    }

    let mut chunks = Vec::new();
    for sentence in split_sentences(trimmed, abbreviations) {
        if char_len(sentence) <= max_length {
            chunks.push(sentence.to_string());
        } else {
            pack_words(sentence, max_length, &mut chunks);
        }
    }
    debug!(
        "Chunked {} chars into {} pieces (max {})",
        char_len(trimmed),
        chunks.len(),
        max_length
    );
    chunks
}

/// Greedily pack the words of one over-long sentence.
fn pack_words(sentence: &str, max_length: usize, chunks: &mut Vec<String>) {
    // Room for the trailing marker plus its separating space.
    let budget = max_length.saturating_sub(ELLIPSIS.len() + 1);
    let mut current = String::new();
    let mut current_len = 0;

    for word in sentence.split_whitespace() {
        let word_len = char_len(word);
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
            continue;
        }
        if current_len + 1 + word_len > budget {
            current.push_str(ELLIPSIS);
            chunks.push(std::mem::take(&mut current));
            if ELLIPSIS.len() + word_len <= budget {
                current.push_str(ELLIPSIS);
                current_len = ELLIPSIS.len();
            } else {
                current_len = 0;
            }
            current.push_str(word);
            current_len += word_len;
        } else {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
}

/// Split text into trimmed sentences.
///
/// A sentence ends at `.`, `!` or `?` (with any trailing closing quotes or
/// brackets) followed by whitespace and a sentence opener. A single period
/// after a known abbreviation or a one-letter initial does not end one.
pub fn split_sentences<'a>(text: &'a str, abbreviations: &[String]) -> Vec<&'a str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let byte_at = |i: usize| chars.get(i).map_or(text.len(), |(b, _)| *b);

    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if !is_terminal(c) {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && is_terminal(chars[j].1) {
            j += 1;
        }
        let single_period = c == '.' && j == i + 1;
        while j < chars.len() && is_closer(chars[j].1) {
            j += 1;
        }
        if j < chars.len() && !chars[j].1.is_whitespace() {
            i = j;
            continue;
        }

        let mut k = j;
        while k < chars.len() && chars[k].1.is_whitespace() {
            k += 1;
        }

        let at_end = k >= chars.len();
        let breaks = at_end
            || (is_opener(chars[k].1)
                && !(single_period && is_abbreviation(&text[token_start(&chars, i)..pos], abbreviations)));

        if breaks {
            let sentence = text[start..byte_at(j)].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = byte_at(k);
        }
        i = k.max(i + 1);
    }

    let tail = text[start.min(text.len())..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '”' | '’' | '»')
}

fn is_opener(c: char) -> bool {
    c.is_uppercase() || c.is_ascii_digit() || matches!(c, '"' | '\'' | '(' | '[' | '“' | '‘' | '«')
}

/// Byte offset where the word ending at char index `end` begins.
fn token_start(chars: &[(usize, char)], end: usize) -> usize {
    let mut s = end;
    while s > 0 && (chars[s - 1].1.is_alphanumeric() || chars[s - 1].1 == '.') {
        s -= 1;
    }
    chars.get(s).map_or(0, |(b, _)| *b)
}

fn is_abbreviation(token: &str, extra: &[String]) -> bool {
    let token = token.trim_matches('.');
    if token.is_empty() {
        return false;
    }
    let mut letters = token.chars();
    if let (Some(first), None) = (letters.next(), letters.next()) {
        if first.is_alphabetic() && first.is_uppercase() {
            return true;
        }
    }
    let lower = token.to_lowercase();
    DEFAULT_ABBREVIATIONS.contains(&lower.as_str())
        || extra.iter().any(|a| a.eq_ignore_ascii_case(&lower))
}
