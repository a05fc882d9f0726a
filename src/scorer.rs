//! Plaintext fitness scoring.
//!
//! Scoring runs in two passes. The coarse pass counts how many whitespace
//! tokens are known words; a text with no known word is pruned before the
//! n-gram and letter passes run.

use serde::{Deserialize, Serialize};

use crate::corpus::{Corpus, GramKind, LETTER_FLOOR};

/// Weights of the score components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Weight of the known-word fraction (0..1).
    pub membership: f64,
    /// Weight of the mean log-weighted n-gram count per token.
    pub ngram: f64,
    /// Weight of the normalized letter-trigram likelihood (0..1).
    pub letters: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            membership: 1.0,
            ngram: 0.25,
            letters: 1.0,
        }
    }
}

/// Individual score components of one text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Tokens considered.
    pub tokens: usize,
    /// Fraction of tokens found in the unigram table.
    pub membership: f64,
    /// Mean log-weighted n-gram evidence per token.
    pub ngram: f64,
    /// Letter-trigram likelihood mapped to 0..1.
    pub letters: f64,
    /// Weighted total.
    pub total: f64,
}

/// Reusable buffers so repeated scoring does not allocate.
#[derive(Debug, Default)]
pub(crate) struct ScoreScratch {
    letters: String,
    spans: Vec<(usize, usize)>,
    key: String,
}

impl ScoreScratch {
    /// Splits `text` into lowercase letter-only tokens.
    fn tokenize(&mut self, text: &str) {
        self.letters.clear();
        self.spans.clear();
        for raw in text.split_whitespace() {
            let start = self.letters.len();
            self.letters
                .extend(raw.chars().filter(char::is_ascii_alphabetic).map(|c| c.to_ascii_lowercase()));
            if self.letters.len() > start {
                self.spans.push((start, self.letters.len()));
            }
        }
    }

    fn token(&self, i: usize) -> &str {
        let (start, end) = self.spans[i];
        &self.letters[start..end]
    }

    fn joined_count(&mut self, corpus: &Corpus, kind: GramKind, first: usize, len: usize) -> u64 {
        self.key.clear();
        for i in first..first + len {
            if i > first {
                self.key.push(' ');
            }
            let (start, end) = self.spans[i];
            self.key.push_str(&self.letters[start..end]);
        }
        corpus.count_normalized(kind, &self.key)
    }
}

/// Scores candidate plaintexts against a corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scorer {
    weights: ScoreWeights,
}

impl Scorer {
    /// Creates a scorer with custom weights.
    #[must_use]
    pub const fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// Component weights.
    #[must_use]
    pub const fn weights(&self) -> ScoreWeights {
        self.weights
    }

    /// Scores `text`, returning 0.0 for pruned texts.
    #[must_use]
    pub fn score(&self, text: &str, corpus: &Corpus) -> f64 {
        self.evaluate(text, corpus).unwrap_or(0.0)
    }

    /// Scores `text`, or `None` when it has no tokens or no known word.
    ///
    /// A corpus without unigrams gives every text the neutral score 0.0.
    #[must_use]
    pub fn evaluate(&self, text: &str, corpus: &Corpus) -> Option<f64> {
        self.evaluate_in(&mut ScoreScratch::default(), text, corpus)
    }

    /// Full component breakdown, `None` under the same conditions as
    /// [`evaluate`](Self::evaluate).
    #[must_use]
    pub fn breakdown(&self, text: &str, corpus: &Corpus) -> Option<ScoreBreakdown> {
        self.breakdown_in(&mut ScoreScratch::default(), text, corpus)
    }

    pub(crate) fn evaluate_in(&self, scratch: &mut ScoreScratch, text: &str, corpus: &Corpus) -> Option<f64> {
        self.breakdown_in(scratch, text, corpus).map(|b| b.total)
    }

    fn breakdown_in(&self, scratch: &mut ScoreScratch, text: &str, corpus: &Corpus) -> Option<ScoreBreakdown> {
        scratch.tokenize(text);
        let tokens = scratch.spans.len();
        if tokens == 0 {
            return None;
        }
        if corpus.total(GramKind::Unigram) == 0 {
            return Some(ScoreBreakdown {
                tokens,
                membership: 0.0,
                ngram: 0.0,
                letters: 0.0,
                total: 0.0,
            });
        }

        let mut known = 0usize;
        let mut evidence = 0.0;
        for i in 0..tokens {
            let c = corpus.count_normalized(GramKind::Unigram, scratch.token(i));
            if c > 0 {
                known += 1;
                evidence += log_weight(c);
            }
        }
        if known == 0 {
            return None;
        }
        let membership = known as f64 / tokens as f64;

        for i in 0..tokens.saturating_sub(1) {
            evidence += 2.0 * log_weight(scratch.joined_count(corpus, GramKind::Bigram, i, 2));
        }
        for i in 0..tokens.saturating_sub(2) {
            evidence += 3.0 * log_weight(scratch.joined_count(corpus, GramKind::Trigram, i, 3));
        }
        let ngram = evidence / tokens as f64;

        let letters = letter_fitness(scratch, corpus);
        let w = self.weights;
        Some(ScoreBreakdown {
            tokens,
            membership,
            ngram,
            letters,
            total: w.membership * membership + w.ngram * ngram + w.letters * letters,
        })
    }
}

#[inline]
fn log_weight(count: u64) -> f64 {
    (1.0 + count as f64).log10()
}

fn letter_fitness(scratch: &ScoreScratch, corpus: &Corpus) -> f64 {
    let model = corpus.letter_model();
    if model.is_empty() {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut n = 0usize;
    for i in 0..scratch.spans.len() {
        let (s, k) = model.word_log_prob(scratch.token(i));
        sum += s;
        n += k;
    }
    if n == 0 {
        return 0.0;
    }
    let mean = sum / n as f64;
    ((mean - LETTER_FLOOR) / -LETTER_FLOOR).clamp(0.0, 1.0)
}

/// Scores `text` with default weights.
#[must_use]
pub fn score(text: &str, corpus: &Corpus) -> f64 {
    Scorer::default().score(text, corpus)
}
