//! Shared fixtures for integration tests.

#![allow(dead_code)]

use enigma_analyzer::{Corpus, EnigmaMachine, EnigmaSettings, ReflectorId, RotorId};

/// Plain English used to train the test corpus.
pub const TRAINING_TEXT: &str = "\
the enemy fleet will move north at dawn and the weather over the channel is clear. \
the weather report for the north sea is clear with light wind from the west. \
all ships will hold position until the signal is given at dawn. \
the convoy is expected to pass the channel before the storm arrives. \
report the position of the enemy fleet and the weather every hour. \
the signal station in the north will report the wind and the sea state. \
no ship will leave the harbour before the convoy is ready to move. \
the attack will begin at dawn if the weather over the sea is clear.";

/// Splits `text` into lowercase words without punctuation.
pub fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| w.chars().filter(char::is_ascii_alphabetic).collect::<String>().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Corpus with unigrams, bigrams and trigrams of [`TRAINING_TEXT`], compiled.
pub fn corpus() -> Corpus {
    let mut corpus = Corpus::new();
    for sentence in TRAINING_TEXT.split('.') {
        let words = words(sentence);
        for w in &words {
            corpus.add_unigram(w);
        }
        for pair in words.windows(2) {
            corpus.add_bigram(&pair.join(" "));
        }
        for triple in words.windows(3) {
            corpus.add_trigram(&triple.join(" "));
        }
    }
    corpus.compile();
    corpus
}

/// Three-rotor settings with rings at `A` and no plugboard.
pub fn settings(rotors: [RotorId; 3], reflector: ReflectorId, positions: &str) -> EnigmaSettings {
    EnigmaSettings::builder()
        .rotors(rotors)
        .reflector(reflector)
        .positions(positions)
        .build()
        .unwrap()
}

/// Enciphers `text` from the start positions of `settings`.
pub fn encipher(settings: &EnigmaSettings, text: &str) -> String {
    EnigmaMachine::new(settings.clone()).encode(text).unwrap()
}
