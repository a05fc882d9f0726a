//! Candidate decoding and scoring shared by all stages.

use crate::config::Crib;
use crate::corpus::Corpus;
use crate::error::{ConfigurationError, EnigmaResult, InputError};
use crate::machine::EnigmaMachine;
use crate::scorer::{ScoreScratch, Scorer};
use crate::settings::EnigmaSettings;

#[derive(Debug, Clone, Copy)]
enum Glyph {
    Letter,
    Other(char),
}

/// Ciphertext split into letter offsets plus the layout needed to put
/// non-letters back.
#[derive(Debug)]
pub(crate) struct Ciphertext {
    letters: Vec<u8>,
    layout: Vec<Glyph>,
}

impl Ciphertext {
    pub fn parse(text: &str) -> EnigmaResult<Self> {
        let mut letters = Vec::with_capacity(text.len());
        let mut layout = Vec::with_capacity(text.len());
        for (index, ch) in text.chars().enumerate() {
            if ch.is_ascii_alphabetic() {
                letters.push(ch.to_ascii_uppercase() as u8 - b'A');
                layout.push(Glyph::Letter);
            } else if ch.is_alphabetic() {
                return Err(InputError::UnsupportedCharacter { ch, index }.into());
            } else {
                layout.push(Glyph::Other(ch));
            }
        }
        Ok(Self { letters, layout })
    }

    pub fn letters(&self) -> &[u8] {
        &self.letters
    }

    /// Writes lowercase plaintext for `decoded` (one offset per letter) into `out`.
    pub fn render_into(&self, decoded: &[u8], out: &mut String) {
        out.clear();
        let mut next = decoded.iter();
        for glyph in &self.layout {
            match glyph {
                Glyph::Letter => {
                    if let Some(&c) = next.next() {
                        out.push(char::from(b'a' + c));
                    }
                }
                Glyph::Other(ch) => out.push(*ch),
            }
        }
    }
}

/// Crib prepared against one ciphertext.
#[derive(Debug)]
pub(crate) struct CribPlan {
    crib: Vec<u8>,
    offsets: Vec<usize>,
    pub min_match: f64,
    pub weight: f64,
}

impl CribPlan {
    /// Resolves where the crib may sit.
    ///
    /// With an unknown offset every position is kept where no crib letter
    /// faces the same ciphertext letter, since Enigma never enciphers a letter
    /// to itself.
    pub fn new(crib: &Crib, cipher: &[u8]) -> EnigmaResult<Self> {
        let letters = crib.letter_indices();
        let fits = |offset: usize| offset + letters.len() <= cipher.len();
        let offsets = match crib.offset {
            Some(offset) if fits(offset) => vec![offset],
            Some(offset) => {
                return Err(ConfigurationError::InvalidSearchParameter {
                    field: "crib.offset".to_string(),
                    reason: format!(
                        "crib of {} letters at {offset} does not fit {} ciphertext letters",
                        letters.len(),
                        cipher.len()
                    ),
                }
                .into())
            }
            None => (0..=cipher.len().saturating_sub(letters.len()))
                .filter(|&o| fits(o))
                .filter(|&o| letters.iter().zip(&cipher[o..]).all(|(p, c)| p != c))
                .collect(),
        };
        Ok(Self {
            crib: letters,
            offsets,
            min_match: crib.min_match,
            weight: crib.weight,
        })
    }

    pub fn has_offsets(&self) -> bool {
        !self.offsets.is_empty()
    }

    /// Letters that must be decoded to test every offset.
    pub fn span(&self) -> usize {
        self.offsets.last().map_or(0, |o| o + self.crib.len())
    }

    /// Best fraction of crib letters matched over the admissible offsets.
    pub fn best_match(&self, decoded: &[u8]) -> f64 {
        let len = self.crib.len();
        if len == 0 {
            return 0.0;
        }
        let mut best = 0usize;
        for &o in &self.offsets {
            let Some(window) = decoded.get(o..o + len) else {
                continue;
            };
            let hits = window.iter().zip(&self.crib).filter(|(a, b)| a == b).count();
            best = best.max(hits);
            if best == len {
                break;
            }
        }
        best as f64 / len as f64
    }
}

/// Decodes and scores full settings. Owns its buffers; one per thread.
pub(crate) struct Evaluator<'a> {
    cipher: &'a Ciphertext,
    corpus: &'a Corpus,
    scorer: Scorer,
    crib: Option<&'a CribPlan>,
    decoded: Vec<u8>,
    plain: String,
    scratch: ScoreScratch,
}

impl<'a> Evaluator<'a> {
    pub fn new(cipher: &'a Ciphertext, corpus: &'a Corpus, scorer: Scorer, crib: Option<&'a CribPlan>) -> Self {
        Self {
            cipher,
            corpus,
            scorer,
            crib,
            decoded: Vec::with_capacity(cipher.letters.len()),
            plain: String::with_capacity(cipher.layout.len()),
            scratch: ScoreScratch::default(),
        }
    }

    /// Full score of `settings`: statistical score (0.0 when pruned) plus the
    /// weighted crib match.
    pub fn score(&mut self, settings: &EnigmaSettings) -> f64 {
        let mut machine = EnigmaMachine::new(settings.clone());
        machine.encode_indices(&self.cipher.letters, &mut self.decoded);
        self.score_decoded()
    }

    /// Statistical score of the current decode, `None` when pruned.
    pub fn statistical(&mut self) -> Option<f64> {
        self.cipher.render_into(&self.decoded, &mut self.plain);
        self.scorer.evaluate_in(&mut self.scratch, &self.plain, self.corpus)
    }

    fn score_decoded(&mut self) -> f64 {
        let statistical = self.statistical().unwrap_or(0.0);
        match self.crib {
            Some(plan) => statistical + plan.weight * plan.best_match(&self.decoded),
            None => statistical,
        }
    }

    /// Decodes with a prepared machine (stage 1 hot path).
    pub fn decode_with(&mut self, machine: &mut EnigmaMachine, letters: usize) {
        let end = letters.min(self.cipher.letters.len());
        machine.encode_indices(&self.cipher.letters[..end], &mut self.decoded);
    }

    pub fn decoded(&self) -> &[u8] {
        &self.decoded
    }
}
