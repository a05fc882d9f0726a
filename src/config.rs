//! Search configuration.
//!
//! A [`SearchConfig`] describes which part of the key space an attack covers
//! and how hard each stage works. Values are plain data (serde friendly);
//! [`SearchConfig::validate`] is run by the builder and again by the engine
//! before any work starts, so deserialized configurations are checked too.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::{ReflectorId, RotorId};
use crate::error::ConfigurationError;
use crate::model::MachineModel;
use crate::plugboard::MAX_PAIRS;
use crate::scorer::ScoreWeights;
use crate::text::letters_only;

/// Largest ring offset explored on either side of the baseline.
pub const MAX_RING_SPAN: u8 = 13;

/// Ring-setting neighbourhood explored in stage 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingSearch {
    /// How many of the rightmost stepping rotors get their ring varied (0..=2).
    pub rotors: usize,
    /// Ring offsets tried on either side of the current ring.
    pub span: u8,
}

impl Default for RingSearch {
    fn default() -> Self {
        Self { rotors: 2, span: 3 }
    }
}

/// Limits on how much work an attack may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Budget {
    /// Wall-clock limit measured from the start of the attack.
    pub max_duration: Option<Duration>,
    /// Maximum number of stage 1 candidates decoded.
    pub max_candidates: Option<u64>,
}

impl Budget {
    /// No limits.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_duration: None,
            max_candidates: None,
        }
    }
}

/// Known plaintext expected somewhere in the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crib {
    /// Expected plaintext. Only its letters are compared.
    pub text: String,
    /// Letter offset of the crib in the ciphertext, `None` when unknown.
    pub offset: Option<usize>,
    /// Minimum fraction of crib letters that must match in stage 1.
    pub min_match: f64,
    /// Weight of the crib match fraction added to the statistical score in
    /// stages 2 and 3.
    pub weight: f64,
}

impl Crib {
    /// Crib with unknown position and default thresholds.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            offset: None,
            min_match: 0.7,
            weight: 1.0,
        }
    }

    /// Pins the crib to a letter offset.
    #[must_use]
    pub fn at(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets the stage 1 match threshold.
    #[must_use]
    pub fn min_match(mut self, fraction: f64) -> Self {
        self.min_match = fraction;
        self
    }

    /// Crib letters as offsets.
    #[must_use]
    pub fn letter_indices(&self) -> Vec<u8> {
        letters_only(&self.text).bytes().map(|b| b - b'A').collect()
    }
}

/// Everything an attack needs to know besides the ciphertext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Rotors in the machine (3 or 4).
    pub rotor_count: usize,
    /// Eligible stepping rotors.
    pub rotor_pool: Vec<RotorId>,
    /// Eligible static rotors for the leftmost slot of a 4-rotor machine.
    pub static_pool: Vec<RotorId>,
    /// Eligible reflectors.
    pub reflector_pool: Vec<ReflectorId>,
    /// Stage 2 neighbourhood.
    pub ring_search: RingSearch,
    /// Maximum plugboard changes made by the stage 3 hill climb.
    pub plugboard_depth: usize,
    /// Results returned.
    pub result_count: usize,
    /// Capacity of the stage 1 top-K.
    pub stage_one_capacity: usize,
    /// Candidates carried into the plugboard hill climb.
    pub refine_count: usize,
    /// Stage 1 candidates scoring below this are dropped.
    pub plausibility_threshold: f64,
    /// Time and candidate limits.
    pub budget: Budget,
    /// Optional known plaintext.
    pub crib: Option<Crib>,
    /// Stage 1 worker threads, 0 for the available parallelism.
    pub workers: usize,
    /// Scorer weights.
    pub weights: ScoreWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::for_model(MachineModel::EnigmaI)
    }
}

impl SearchConfig {
    /// Creates a new builder, seeded with the defaults.
    #[must_use]
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Default configuration covering every key the model can express.
    #[must_use]
    pub fn for_model(model: MachineModel) -> Self {
        let rotor_count = model.default_rotor_count();
        Self {
            rotor_count,
            rotor_pool: model.stepping_rotors().to_vec(),
            static_pool: model.static_rotors().to_vec(),
            reflector_pool: model
                .reflectors()
                .iter()
                .copied()
                .filter(|r| r.fits(rotor_count))
                .collect(),
            ring_search: RingSearch::default(),
            plugboard_depth: MAX_PAIRS,
            result_count: 10,
            stage_one_capacity: 100,
            refine_count: 8,
            plausibility_threshold: 0.0,
            budget: Budget::unlimited(),
            crib: None,
            workers: 0,
            weights: ScoreWeights::default(),
        }
    }

    /// Worker threads to use for stage 1.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        }
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigurationError` found.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.rotor_count != 3 && self.rotor_count != 4 {
            return Err(ConfigurationError::RotorCount {
                count: self.rotor_count,
            });
        }
        if self.rotor_pool.is_empty() {
            return Err(ConfigurationError::EmptyRotorPool);
        }
        ensure_unique(&self.rotor_pool)?;
        if let Some(&rotor) = self.rotor_pool.iter().find(|r| r.is_static()) {
            return Err(invalid("rotor_pool", format!("{rotor} does not step")));
        }
        if self.rotor_pool.len() < 3 {
            return Err(ConfigurationError::PoolTooSmall {
                needed: 3,
                available: self.rotor_pool.len(),
            });
        }
        if self.rotor_count == 4 {
            if self.static_pool.is_empty() {
                return Err(invalid("static_pool", "a 4-rotor search needs Beta or Gamma"));
            }
            ensure_unique(&self.static_pool)?;
            if let Some(&rotor) = self.static_pool.iter().find(|r| !r.is_static()) {
                return Err(invalid("static_pool", format!("{rotor} is not a static rotor")));
            }
        }
        if self.reflector_pool.is_empty() {
            return Err(ConfigurationError::EmptyReflectorPool);
        }
        if let Some(&reflector) = self.reflector_pool.iter().find(|r| !r.fits(self.rotor_count)) {
            return Err(ConfigurationError::IncompatibleReflector {
                reflector,
                rotor_count: self.rotor_count,
            });
        }
        if self.ring_search.rotors > 2 {
            return Err(invalid("ring_search.rotors", "at most the two rightmost rotors"));
        }
        if self.ring_search.span > MAX_RING_SPAN {
            return Err(invalid(
                "ring_search.span",
                format!("at most {MAX_RING_SPAN}"),
            ));
        }
        if self.plugboard_depth > MAX_PAIRS {
            return Err(invalid("plugboard_depth", format!("at most {MAX_PAIRS}")));
        }
        if self.result_count == 0 {
            return Err(invalid("result_count", "must be at least 1"));
        }
        if self.stage_one_capacity == 0 {
            return Err(invalid("stage_one_capacity", "must be at least 1"));
        }
        if !self.plausibility_threshold.is_finite() {
            return Err(invalid("plausibility_threshold", "must be finite"));
        }
        let w = self.weights;
        if ![w.membership, w.ngram, w.letters].iter().all(|v| v.is_finite() && *v >= 0.0) {
            return Err(invalid("weights", "must be finite and non-negative"));
        }
        if let Some(crib) = &self.crib {
            validate_crib(crib)?;
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidSearchParameter {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn ensure_unique(pool: &[RotorId]) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::with_capacity(pool.len());
    match pool.iter().find(|r| !seen.insert(**r)) {
        Some(&rotor) => Err(ConfigurationError::DuplicateRotor { rotor }),
        None => Ok(()),
    }
}

fn validate_crib(crib: &Crib) -> Result<(), ConfigurationError> {
    if letters_only(&crib.text).is_empty() {
        return Err(invalid("crib.text", "must contain letters"));
    }
    if !(0.0..=1.0).contains(&crib.min_match) {
        return Err(invalid("crib.min_match", "must be within 0..=1"));
    }
    if !crib.weight.is_finite() || crib.weight < 0.0 {
        return Err(invalid("crib.weight", "must be finite and non-negative"));
    }
    Ok(())
}

/// Builder for [`SearchConfig`].
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Replaces pools and rotor count with those of `model`.
    #[must_use]
    pub fn model(mut self, model: MachineModel) -> Self {
        let base = SearchConfig::for_model(model);
        self.config.rotor_count = base.rotor_count;
        self.config.rotor_pool = base.rotor_pool;
        self.config.static_pool = base.static_pool;
        self.config.reflector_pool = base.reflector_pool;
        self
    }

    /// Sets the rotor count.
    #[must_use]
    pub fn rotor_count(mut self, count: usize) -> Self {
        self.config.rotor_count = count;
        self
    }

    /// Sets the stepping rotor pool.
    #[must_use]
    pub fn rotor_pool(mut self, pool: impl IntoIterator<Item = RotorId>) -> Self {
        self.config.rotor_pool = pool.into_iter().collect();
        self
    }

    /// Sets the static rotor pool.
    #[must_use]
    pub fn static_pool(mut self, pool: impl IntoIterator<Item = RotorId>) -> Self {
        self.config.static_pool = pool.into_iter().collect();
        self
    }

    /// Sets the reflector pool.
    #[must_use]
    pub fn reflector_pool(mut self, pool: impl IntoIterator<Item = ReflectorId>) -> Self {
        self.config.reflector_pool = pool.into_iter().collect();
        self
    }

    /// Sets the stage 2 ring neighbourhood.
    #[must_use]
    pub fn ring_search(mut self, rotors: usize, span: u8) -> Self {
        self.config.ring_search = RingSearch { rotors, span };
        self
    }

    /// Sets the plugboard hill-climb depth.
    #[must_use]
    pub fn plugboard_depth(mut self, depth: usize) -> Self {
        self.config.plugboard_depth = depth;
        self
    }

    /// Sets how many results are returned.
    #[must_use]
    pub fn result_count(mut self, count: usize) -> Self {
        self.config.result_count = count;
        self
    }

    /// Sets the stage 1 top-K capacity.
    #[must_use]
    pub fn stage_one_capacity(mut self, capacity: usize) -> Self {
        self.config.stage_one_capacity = capacity;
        self
    }

    /// Sets how many candidates enter the plugboard hill climb.
    #[must_use]
    pub fn refine_count(mut self, count: usize) -> Self {
        self.config.refine_count = count;
        self
    }

    /// Sets the stage 1 plausibility threshold.
    #[must_use]
    pub fn plausibility_threshold(mut self, threshold: f64) -> Self {
        self.config.plausibility_threshold = threshold;
        self
    }

    /// Sets a wall-clock limit.
    #[must_use]
    pub fn max_duration(mut self, duration: Duration) -> Self {
        self.config.budget.max_duration = Some(duration);
        self
    }

    /// Sets a stage 1 candidate limit.
    #[must_use]
    pub fn max_candidates(mut self, candidates: u64) -> Self {
        self.config.budget.max_candidates = Some(candidates);
        self
    }

    /// Sets a known-plaintext crib.
    #[must_use]
    pub fn crib(mut self, crib: Crib) -> Self {
        self.config.crib = Some(crib);
        self
    }

    /// Sets the stage 1 worker count (0 for the available parallelism).
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Sets scorer weights.
    #[must_use]
    pub fn weights(mut self, weights: ScoreWeights) -> Self {
        self.config.weights = weights;
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if any field is invalid.
    pub fn build(self) -> Result<SearchConfig, ConfigurationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_for_every_model() {
        assert!(SearchConfig::default().validate().is_ok());
        for model in MachineModel::ALL {
            let config = SearchConfig::for_model(model);
            assert!(config.validate().is_ok(), "{model}: {:?}", config.validate());
        }
        let m4 = SearchConfig::for_model(MachineModel::M4R1);
        assert_eq!(m4.rotor_count, 4);
        assert_eq!(m4.static_pool, vec![RotorId::Beta]);
        assert_eq!(m4.reflector_pool, vec![ReflectorId::BThin]);
    }

    #[test]
    fn empty_pools_fail_fast() {
        let err = SearchConfig::builder().rotor_pool([]).build().unwrap_err();
        assert_eq!(err, ConfigurationError::EmptyRotorPool);
        let err = SearchConfig::builder().reflector_pool([]).build().unwrap_err();
        assert_eq!(err, ConfigurationError::EmptyReflectorPool);
        let err = SearchConfig::builder().rotor_count(0).build().unwrap_err();
        assert_eq!(err, ConfigurationError::RotorCount { count: 0 });
    }

    #[test]
    fn pools_must_fit_the_machine() {
        let err = SearchConfig::builder()
            .rotor_pool([RotorId::I, RotorId::II])
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigurationError::PoolTooSmall { needed: 3, available: 2 });

        let err = SearchConfig::builder()
            .rotor_pool([RotorId::I, RotorId::II, RotorId::Beta])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidSearchParameter { .. }));

        let err = SearchConfig::builder()
            .reflector_pool([ReflectorId::BThin])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::IncompatibleReflector { .. }));

        let err = SearchConfig::builder()
            .model(MachineModel::M4Naval)
            .static_pool([])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidSearchParameter { .. }));
    }

    #[test]
    fn numeric_limits() {
        assert!(SearchConfig::builder().plugboard_depth(11).build().is_err());
        assert!(SearchConfig::builder().ring_search(3, 1).build().is_err());
        assert!(SearchConfig::builder().ring_search(2, 14).build().is_err());
        assert!(SearchConfig::builder().result_count(0).build().is_err());
        assert!(SearchConfig::builder().plausibility_threshold(f64::NAN).build().is_err());
        assert!(SearchConfig::builder().crib(Crib::new("123")).build().is_err());
        assert!(SearchConfig::builder()
            .crib(Crib::new("WETTER").min_match(1.5))
            .build()
            .is_err());
    }

    #[test]
    fn serde_round_trip_then_validate() {
        let config = SearchConfig::builder()
            .max_duration(Duration::from_millis(1500))
            .crib(Crib::new("wetter bericht").at(4))
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: SearchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert!(back.validate().is_ok());
        assert_eq!(back.crib.unwrap().letter_indices().len(), 13);
    }

    #[test]
    fn effective_workers_is_positive() {
        assert!(SearchConfig::default().effective_workers() >= 1);
        assert_eq!(SearchConfig::builder().workers(3).build().unwrap().effective_workers(), 3);
    }
}
