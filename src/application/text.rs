//! Filler text for messages created without explicit content

use crate::infrastructure::traits::RandomSource;

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat", "duis", "aute", "irure", "in",
    "reprehenderit", "voluptate", "velit", "esse", "cillum", "fugiat", "nulla", "pariatur",
];

const MIN_WORDS: usize = 12;
const MAX_WORDS: usize = 40;

/// Build a sentence-cased block of filler words.
pub fn random_text(rng: &dyn RandomSource) -> String {
    let count = MIN_WORDS + rng.index(MAX_WORDS - MIN_WORDS + 1);
    let mut text = String::new();
    let mut capitalize = true;

    for i in 0..count {
        if i > 0 {
            text.push(' ');
        }
        let word = WORDS[rng.index(WORDS.len())];
        if capitalize {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                text.extend(first.to_uppercase());
                text.push_str(chars.as_str());
            }
            capitalize = false;
        } else {
            text.push_str(word);
        }
        // close a sentence roughly every eight words
        if (i + 1) % 8 == 0 && i + 1 < count {
            text.push('.');
            capitalize = true;
        }
    }
    text.push('.');
    text
}

/// Lowercase hex key of `len` characters.
pub fn random_key(rng: &dyn RandomSource, len: usize) -> String {
    let mut key = String::with_capacity(len);
    while key.len() < len {
        key.push_str(&format!("{:016x}", rng.next_u64()));
    }
    key.truncate(len);
    key
}
