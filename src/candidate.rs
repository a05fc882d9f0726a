//! Ranked attack results.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::settings::EnigmaSettings;

/// One recovered key with its decryption and score.
///
/// Candidates sort best first: higher score, then ascending settings, so equal
/// scores always come out in the same order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    /// Recovered settings.
    pub settings: EnigmaSettings,
    /// Ciphertext decoded with `settings`.
    pub plaintext: String,
    /// Fitness assigned by the scorer.
    pub score: f64,
}

impl CandidateResult {
    /// Creates a result.
    #[must_use]
    pub const fn new(settings: EnigmaSettings, plaintext: String, score: f64) -> Self {
        Self {
            settings,
            plaintext,
            score,
        }
    }
}

/// Best-first ordering on (score, settings) pairs.
pub(crate) fn rank_order(a_score: f64, a: &EnigmaSettings, b_score: f64, b: &EnigmaSettings) -> Ordering {
    b_score.total_cmp(&a_score).then_with(|| a.cmp(b))
}

impl PartialEq for CandidateResult {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CandidateResult {}

impl PartialOrd for CandidateResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CandidateResult {
    fn cmp(&self, other: &Self) -> Ordering {
        rank_order(self.score, &self.settings, other.score, &other.settings)
    }
}
