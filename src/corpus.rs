//! N-gram frequency corpus.
//!
//! The corpus has two phases. During ingestion grams are counted in hash
//! tables; [`Corpus::compile`] then builds the descending orderings and the
//! letter model used for scoring. Queries after further mutation still answer
//! correctly but rank from the live tables and log a warning.

use std::collections::HashMap;
use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::letter::ALPHABET_LEN;

/// Which n-gram table to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GramKind {
    /// Single words.
    Unigram,
    /// Two-word phrases.
    Bigram,
    /// Three-word phrases.
    Trigram,
}

impl GramKind {
    /// All kinds in table order.
    pub const ALL: [Self; 3] = [Self::Unigram, Self::Bigram, Self::Trigram];

    const fn slot(self) -> usize {
        match self {
            Self::Unigram => 0,
            Self::Bigram => 1,
            Self::Trigram => 2,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Unigram => "Unigrams",
            Self::Bigram => "Bigrams",
            Self::Trigram => "Trigrams",
        }
    }
}

impl fmt::Display for GramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of a ranked query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedGram {
    /// Normalized gram.
    pub gram: String,
    /// Times the gram was ingested.
    pub count: u64,
    /// `count` as a percentage of all grams of this kind.
    pub percent: f64,
}

/// Log10 probability assigned to letter trigrams never seen in the corpus.
pub const LETTER_FLOOR: f64 = -6.0;

const TRIGRAMS: usize = ALPHABET_LEN * ALPHABET_LEN * ALPHABET_LEN;

/// Letter-trigram log probabilities derived from the unigram table.
///
/// Counts come from consecutive letters inside each word, weighted by how
/// often the word was ingested.
#[derive(Debug, Clone)]
pub struct LetterModel {
    log_probs: Vec<f32>,
    observed: u64,
}

impl Default for LetterModel {
    fn default() -> Self {
        Self {
            log_probs: vec![LETTER_FLOOR as f32; TRIGRAMS],
            observed: 0,
        }
    }
}

impl LetterModel {
    fn from_unigrams(table: &HashMap<String, u64>) -> Self {
        let mut counts = vec![0u64; TRIGRAMS];
        let mut observed = 0u64;
        let mut letters = Vec::new();
        for (word, &count) in table {
            letters.clear();
            letters.extend(word.bytes().filter(u8::is_ascii_lowercase).map(|b| b - b'a'));
            for w in letters.windows(3) {
                counts[trigram_index(w[0], w[1], w[2])] += count;
                observed += count;
            }
        }
        if observed == 0 {
            return Self::default();
        }
        let total = observed as f64;
        let log_probs = counts
            .into_iter()
            .map(|c| {
                if c == 0 {
                    LETTER_FLOOR as f32
                } else {
                    (c as f64 / total).log10().max(LETTER_FLOOR) as f32
                }
            })
            .collect();
        Self { log_probs, observed }
    }

    /// Returns true when no letter trigram was observed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.observed == 0
    }

    /// Number of letter trigrams the model was built from.
    #[must_use]
    pub const fn observed(&self) -> u64 {
        self.observed
    }

    /// Log10 probability of the trigram `a b c` (letter offsets).
    #[inline]
    #[must_use]
    pub fn log_prob(&self, a: u8, b: u8, c: u8) -> f64 {
        f64::from(self.log_probs[trigram_index(a, b, c)])
    }

    /// Sum of trigram log probabilities over lowercase `word`, with the
    /// number of trigrams summed.
    #[must_use]
    pub fn word_log_prob(&self, word: &str) -> (f64, usize) {
        let bytes = word.as_bytes();
        let mut sum = 0.0;
        let mut n = 0;
        for w in bytes.windows(3) {
            if w.iter().all(u8::is_ascii_lowercase) {
                sum += self.log_prob(w[0] - b'a', w[1] - b'a', w[2] - b'a');
                n += 1;
            }
        }
        (sum, n)
    }
}

#[inline]
fn trigram_index(a: u8, b: u8, c: u8) -> usize {
    (usize::from(a) * ALPHABET_LEN + usize::from(b)) * ALPHABET_LEN + usize::from(c)
}

/// Lowercases and collapses whitespace so `"The  Cat"` and `"the cat"` are
/// the same bigram.
fn normalize(gram: &str) -> String {
    let mut out = String::with_capacity(gram.len());
    for (i, part) in gram.split_whitespace().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.extend(part.chars().flat_map(char::to_lowercase));
    }
    out
}

/// Unigram, bigram and trigram frequency tables.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    tables: [HashMap<String, u64>; 3],
    totals: [u64; 3],
    ranked: [Vec<String>; 3],
    letters: LetterModel,
    stale: bool,
}

impl Corpus {
    /// Creates an empty corpus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one occurrence of `word`.
    pub fn add_unigram(&mut self, word: &str) {
        self.add(GramKind::Unigram, word);
    }

    /// Counts one occurrence of a two-word phrase.
    pub fn add_bigram(&mut self, phrase: &str) {
        self.add(GramKind::Bigram, phrase);
    }

    /// Counts one occurrence of a three-word phrase.
    pub fn add_trigram(&mut self, phrase: &str) {
        self.add(GramKind::Trigram, phrase);
    }

    fn add(&mut self, kind: GramKind, gram: &str) {
        let gram = normalize(gram);
        if gram.is_empty() {
            return;
        }
        *self.tables[kind.slot()].entry(gram).or_insert(0) += 1;
        self.totals[kind.slot()] += 1;
        self.stale = true;
    }

    /// Rebuilds the descending orderings and the letter model.
    pub fn compile(&mut self) {
        for kind in GramKind::ALL {
            self.ranked[kind.slot()] = rank(&self.tables[kind.slot()]);
        }
        self.letters = LetterModel::from_unigrams(&self.tables[GramKind::Unigram.slot()]);
        self.stale = false;
        debug!(
            unigrams = self.distinct(GramKind::Unigram),
            bigrams = self.distinct(GramKind::Bigram),
            trigrams = self.distinct(GramKind::Trigram),
            letter_trigrams = self.letters.observed(),
            "corpus compiled"
        );
    }

    /// Returns true when grams were added after the last [`compile`](Self::compile).
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.stale
    }

    /// Returns true if the lowercased `word` was ingested as a unigram.
    #[must_use]
    pub fn test_membership(&self, word: &str) -> bool {
        let table = &self.tables[GramKind::Unigram.slot()];
        if word.chars().any(|c| c.is_uppercase() || c.is_whitespace()) {
            table.contains_key(&normalize(word))
        } else {
            table.contains_key(word)
        }
    }

    /// Returns true if `text` has at least one whitespace token and every
    /// token is a known unigram.
    #[must_use]
    pub fn test_string(&self, text: &str) -> bool {
        let mut tokens = text.split_whitespace().peekable();
        tokens.peek().is_some() && tokens.all(|t| self.test_membership(t))
    }

    /// Count of a gram, zero when never ingested.
    #[must_use]
    pub fn count(&self, kind: GramKind, gram: &str) -> u64 {
        let table = &self.tables[kind.slot()];
        table
            .get(gram)
            .or_else(|| table.get(&normalize(gram)))
            .copied()
            .unwrap_or(0)
    }

    /// Count of an already normalized gram.
    #[inline]
    pub(crate) fn count_normalized(&self, kind: GramKind, gram: &str) -> u64 {
        self.tables[kind.slot()].get(gram).copied().unwrap_or(0)
    }

    /// Total grams ingested for `kind`, duplicates included.
    #[must_use]
    pub const fn total(&self, kind: GramKind) -> u64 {
        self.totals[kind.slot()]
    }

    /// Number of distinct grams of `kind`.
    #[must_use]
    pub fn distinct(&self, kind: GramKind) -> usize {
        self.tables[kind.slot()].len()
    }

    /// Returns true when nothing has been ingested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.totals.iter().all(|&t| t == 0)
    }

    /// Letter model from the last compile.
    #[must_use]
    pub const fn letter_model(&self) -> &LetterModel {
        &self.letters
    }

    /// The `n` most frequent grams of `kind`.
    ///
    /// Higher counts rank first, equal counts in lexicographic order. The
    /// corpus is not modified.
    #[must_use]
    pub fn top_n(&self, kind: GramKind, n: usize) -> Vec<RankedGram> {
        let table = &self.tables[kind.slot()];
        let total = self.totals[kind.slot()];
        let to_ranked = |gram: &String| {
            let count = table.get(gram).copied().unwrap_or(0);
            RankedGram {
                gram: gram.clone(),
                count,
                percent: percent(count, total),
            }
        };
        if self.stale {
            warn!(kind = %kind, "ranked query on a corpus modified since compile");
            rank(table).iter().take(n).map(to_ranked).collect()
        } else {
            self.ranked[kind.slot()].iter().take(n).map(to_ranked).collect()
        }
    }

    /// Human readable top-`n` table for every gram kind.
    #[must_use]
    pub fn report(&self, n: usize) -> String {
        let mut out = String::new();
        for kind in GramKind::ALL {
            let _ = writeln!(out, "\nTop {n} {kind}:");
            for (i, entry) in self.top_n(kind, n).iter().enumerate() {
                let _ = writeln!(out, "#{}: {} - {:.4}%", i + 1, entry.gram, entry.percent);
            }
        }
        out
    }
}

fn percent(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

fn rank(table: &HashMap<String, u64>) -> Vec<String> {
    let mut entries: Vec<(&String, u64)> = table.iter().map(|(g, &c)| (g, c)).collect();
    entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries.into_iter().map(|(g, _)| g.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Corpus {
        let mut corpus = Corpus::new();
        for w in ["the", "the", "the", "cat", "cat", "sat", "mat", "The"] {
            corpus.add_unigram(w);
        }
        corpus.add_bigram("the cat");
        corpus.add_bigram("The  Cat");
        corpus.add_bigram("cat sat");
        corpus.add_trigram("the cat sat");
        corpus.compile();
        corpus
    }

    #[test]
    fn counts_and_totals() {
        let corpus = sample();
        assert_eq!(corpus.count(GramKind::Unigram, "the"), 4);
        assert_eq!(corpus.count(GramKind::Unigram, "THE"), 4);
        assert_eq!(corpus.count(GramKind::Bigram, "the cat"), 2);
        assert_eq!(corpus.total(GramKind::Unigram), 8);
        assert_eq!(corpus.distinct(GramKind::Unigram), 4);
        assert_eq!(corpus.total(GramKind::Trigram), 1);
        assert_eq!(corpus.count(GramKind::Trigram, "dog"), 0);
    }

    #[test]
    fn top_n_ranks_by_count_then_name() {
        let corpus = sample();
        let top = corpus.top_n(GramKind::Unigram, 3);
        let grams: Vec<&str> = top.iter().map(|g| g.gram.as_str()).collect();
        assert_eq!(grams, vec!["the", "cat", "mat"]);
        assert!((top[0].percent - 50.0).abs() < 1e-9);
        assert_eq!(corpus.top_n(GramKind::Unigram, 100).len(), 4);
        // Queries do not consume the ordering.
        assert_eq!(corpus.top_n(GramKind::Unigram, 3), top);
    }

    #[test]
    fn membership_is_case_insensitive() {
        let corpus = sample();
        assert!(corpus.test_membership("cat"));
        assert!(corpus.test_membership("CaT"));
        assert!(!corpus.test_membership("dog"));
        assert!(corpus.test_string("The cat sat"));
        assert!(!corpus.test_string("the dog sat"));
        assert!(!corpus.test_string("   "));
    }

    #[test]
    fn membership_lowercases_non_ascii_capitals() {
        let mut corpus = Corpus::new();
        corpus.add_unigram("Über");
        corpus.add_unigram("ÉTÉ");
        corpus.compile();
        assert!(corpus.test_membership("über"));
        assert!(corpus.test_membership("Über"));
        assert!(corpus.test_membership("ÜBER"));
        assert!(corpus.test_membership("Été"));
        assert!(!corpus.test_membership("uber"));
    }

    #[test]
    fn stale_queries_rank_live_tables() {
        let mut corpus = sample();
        assert!(!corpus.is_stale());
        for _ in 0..10 {
            corpus.add_unigram("mat");
        }
        assert!(corpus.is_stale());
        assert_eq!(corpus.top_n(GramKind::Unigram, 1)[0].gram, "mat");
        corpus.compile();
        assert!(!corpus.is_stale());
        assert_eq!(corpus.top_n(GramKind::Unigram, 1)[0].gram, "mat");
    }

    #[test]
    fn empty_corpus_is_harmless() {
        let mut corpus = Corpus::new();
        corpus.add_unigram("   ");
        corpus.compile();
        assert!(corpus.is_empty());
        assert!(corpus.top_n(GramKind::Bigram, 5).is_empty());
        assert!(corpus.letter_model().is_empty());
        assert!(!corpus.test_membership("a"));
        assert!(corpus.report(10).contains("Top 10 Unigrams"));
    }

    #[test]
    fn letter_model_prefers_seen_trigrams() {
        let corpus = sample();
        let model = corpus.letter_model();
        assert!(!model.is_empty());
        let (seen, n) = model.word_log_prob("the");
        assert_eq!(n, 1);
        let (unseen, _) = model.word_log_prob("qzx");
        assert!(seen > unseen);
        assert!((unseen - LETTER_FLOOR).abs() < 1e-6);
        assert_eq!(model.word_log_prob("at").1, 0);
    }

    #[test]
    fn report_lists_each_kind() {
        let report = sample().report(2);
        assert!(report.contains("Top 2 Unigrams:"));
        assert!(report.contains("#1: the - 50.0000%"));
        assert!(report.contains("Top 2 Trigrams:"));
        assert!(report.contains("#1: the cat sat - 100.0000%"));
    }
}
