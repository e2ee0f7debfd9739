// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decides whether a chat line is shouted.

use std::collections::HashSet;

/// Shortest line, in characters, that can count as loud.
pub const MIN_LOUD_LEN: usize = 11;

/// Share of the line that must be uppercase ASCII letters.
pub const MIN_UPPERCASE_RATIO: f64 = 0.60;

/// Bounds on the share of letters that are vowels. Keyboard mashing falls
/// outside them.
pub const MIN_VOWEL_RATIO: f64 = 0.10;
pub const MAX_VOWEL_RATIO: f64 = 0.90;

/// Share of words that must be distinct.
pub const MIN_DISTINCT_WORD_RATIO: f64 = 0.5;

/// A line needs at least this many words of [`LONG_WORD_LETTERS`] or more.
pub const MIN_LONG_WORDS: usize = 2;
pub const LONG_WORD_LETTERS: usize = 3;

/// Loudness check with a configurable word blocklist.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    /// Lowercased; matched as substrings.
    blocked_words: Vec<String>,
}

impl Classifier {
    pub fn new<I, S>(blocked_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            blocked_words: blocked_words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// True when `text` is shouted and contains no blocked word.
    pub fn is_loud(&self, text: &str) -> bool {
        if !is_shouted(text) {
            return false;
        }
        let lowered = text.to_lowercase();
        !self.blocked_words.iter().any(|w| lowered.contains(w.as_str()))
    }
}

/// The shape test alone, without the blocklist.
///
/// A line is shouted when it has no lowercase ASCII letter, is at least
/// [`MIN_LOUD_LEN`] characters long, contains whitespace, is at least
/// [`MIN_UPPERCASE_RATIO`] uppercase ASCII letters and reads like words
/// (see [`has_real_words`]).
pub fn is_shouted(text: &str) -> bool {
    if text.bytes().any(|b| b.is_ascii_lowercase()) {
        return false;
    }

    let len = text.chars().count();
    let uppercase = text.chars().filter(char::is_ascii_uppercase).count();
    let has_space = text.chars().any(char::is_whitespace);

    len >= MIN_LOUD_LEN
        && has_space
        && uppercase as f64 >= len as f64 * MIN_UPPERCASE_RATIO
        && has_real_words(text)
}

/// Rejects lines that are caps but not speech.
///
/// Words are the ASCII letters of each whitespace-separated token. The
/// vowel share must lie within [`MIN_VOWEL_RATIO`]..=[`MAX_VOWEL_RATIO`],
/// at least [`MIN_DISTINCT_WORD_RATIO`] of the words must differ, and at
/// least [`MIN_LONG_WORDS`] words must have [`LONG_WORD_LETTERS`] letters.
pub fn has_real_words(text: &str) -> bool {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|token| token.chars().filter(char::is_ascii_alphabetic).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect();
    if words.is_empty() {
        return false;
    }

    let letters: usize = words.iter().map(String::len).sum();
    let vowels = words
        .iter()
        .flat_map(|word| word.bytes())
        .filter(|b| b"AEIOU".contains(b))
        .count();
    let vowel_ratio = vowels as f64 / letters as f64;
    if !(MIN_VOWEL_RATIO..=MAX_VOWEL_RATIO).contains(&vowel_ratio) {
        return false;
    }

    let distinct: HashSet<&str> = words.iter().map(String::as_str).collect();
    if (distinct.len() as f64) < words.len() as f64 * MIN_DISTINCT_WORD_RATIO {
        return false;
    }

    words.iter().filter(|w| w.len() >= LONG_WORD_LETTERS).count() >= MIN_LONG_WORDS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(["retard"])
    }

    #[test]
    fn plain_shouting_is_loud() {
        assert!(classifier().is_loud("WHAT IS GOING ON"));
        assert!(classifier().is_loud("I LOVE THIS BOT!!"));
    }

    #[test]
    fn any_lowercase_letter_disqualifies() {
        assert!(!classifier().is_loud("WHAT IS GOING On"));
    }

    #[test]
    fn short_lines_are_not_loud() {
        // Ten characters.
        assert!(!classifier().is_loud("ABCD EFGHI"));
        assert!(classifier().is_loud("ABCD EFGHIJ"));
    }

    #[test]
    fn a_space_is_required() {
        assert!(!classifier().is_loud("AAAAAAAAAAAAAAAA"));
        assert!(classifier().is_loud("ABRACADABRA\tKAZAM"));
    }

    #[test]
    fn mostly_punctuation_is_not_loud() {
        assert!(!classifier().is_loud("!!!! ???? 1234 AB"));
        assert!(!classifier().is_loud(":) :) :) :) :) :)"));
    }

    #[test]
    fn non_ascii_letters_count_toward_length_only() {
        // No ASCII lowercase, but the accented capitals do not count as uppercase.
        assert!(!classifier().is_loud("ÉÉÉÉÉÉ ÉÉÉÉÉÉ"));
        assert!(classifier().is_loud("ÇA VA BIEN MERCI"));
    }

    #[test]
    fn blocked_words_are_case_insensitive() {
        assert!(!classifier().is_loud("WHAT A RETARD THING"));
        assert!(Classifier::default().is_loud("WHAT A RETARD THING"));
    }

    #[test]
    fn caps_that_are_not_speech_are_rejected() {
        let rejected = [
            "IT'S ONLY VALID IF ALL WORDS ARE UPPERCASE COMPLETELy",
            "LOUD SHORT",
            "TBBSSSDDDFFF FDDSSDJJKLLM FRTGBNMV",
            "AEIOUOUAEU AUIOEEIUO AUIOUA",
            "BINARY BINARY BINARY BINARY BOO",
            "IS IT VALID NO",
            "THIS                                         ISN'T                                   VALID",
        ];
        for text in rejected {
            assert!(!classifier().is_loud(text), "{text:?} should not be loud");
        }
        assert!(classifier().is_loud("THIS ISN'T FUNNY, BUT AT LEAST IT'S VALID!"));
    }

    #[test]
    fn word_checks_ignore_punctuation() {
        assert!(has_real_words("WHO, ME?! NEVER."));
        assert!(!has_real_words("!!! ??? ..."));
        assert!(!has_real_words("NO NO NO NO YES"));
    }

    #[test]
    fn blank_blocklist_entries_are_dropped() {
        let classifier = Classifier::new(["", "  "]);
        assert!(classifier.is_loud("STILL VERY LOUD"));
    }
}
