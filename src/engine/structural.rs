//! Stage 1: rotor order, reflector and start position search.
//!
//! Rings are fixed at `A` and the plugboard is empty. With the ring fixed,
//! every wiring offset a rotor can present is reached by some start position,
//! so the true key is found up to ring/position equivalence and left for
//! stage 2 to sharpen.

use crate::catalog::{ReflectorId, RotorId};
use crate::config::SearchConfig;
use crate::corpus::Corpus;
use crate::error::EnigmaResult;
use crate::letter::{Letter, ALPHABET_LEN};
use crate::machine::EnigmaMachine;
use crate::plugboard::Plugboard;
use crate::scorer::Scorer;
use crate::settings::EnigmaSettings;

use super::budget::BudgetTracker;
use super::evaluate::{Ciphertext, CribPlan, Evaluator};
use super::top_k::{Scored, TopK};

/// One unit of stage 1 work: a rotor order with a reflector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Structure {
    pub rotors: Vec<RotorId>,
    pub reflector: ReflectorId,
}

/// Every rotor order (without repetition) crossed with every reflector, in
/// pool order.
pub(crate) fn enumerate(config: &SearchConfig) -> Vec<Structure> {
    let pool = &config.rotor_pool;
    let mut stepping = Vec::new();
    for (i, &a) in pool.iter().enumerate() {
        for (j, &b) in pool.iter().enumerate() {
            if j == i {
                continue;
            }
            for (k, &c) in pool.iter().enumerate() {
                if k == i || k == j {
                    continue;
                }
                stepping.push([a, b, c]);
            }
        }
    }
    let leftmost: Vec<Option<RotorId>> = if config.rotor_count == 4 {
        config.static_pool.iter().copied().map(Some).collect()
    } else {
        vec![None]
    };

    let mut out = Vec::with_capacity(leftmost.len() * stepping.len() * config.reflector_pool.len());
    for &head in &leftmost {
        for order in &stepping {
            for &reflector in &config.reflector_pool {
                let rotors = head.into_iter().chain(order.iter().copied()).collect();
                out.push(Structure { rotors, reflector });
            }
        }
    }
    out
}

/// Read-only context shared by all stage 1 tasks.
pub(crate) struct StageOne<'a> {
    pub cipher: &'a Ciphertext,
    pub corpus: &'a Corpus,
    pub scorer: Scorer,
    pub crib: Option<&'a CribPlan>,
    pub budget: &'a BudgetTracker,
    pub threshold: f64,
    pub capacity: usize,
}

impl StageOne<'_> {
    /// Scans every start position of `structure`, returning the task-local
    /// best candidates.
    pub fn run(&self, structure: &Structure) -> EnigmaResult<TopK> {
        let n = structure.rotors.len();
        let base = EnigmaSettings::new(
            structure.rotors.clone(),
            structure.reflector,
            vec![Letter::A; n],
            vec![Letter::A; n],
            Plugboard::empty(),
        )?;
        let mut machine = EnigmaMachine::new(base.clone());
        let mut evaluator = Evaluator::new(self.cipher, self.corpus, self.scorer, self.crib);
        let mut top = TopK::new(self.capacity);
        let span = self.crib.map_or(self.cipher.letters().len(), CribPlan::span);

        let mut positions = vec![0u8; n];
        loop {
            if !self.budget.try_claim() {
                break;
            }
            machine.set_position_indices(&positions);
            evaluator.decode_with(&mut machine, span);

            let score = match self.crib {
                Some(plan) => Some(plan.best_match(evaluator.decoded())).filter(|&m| m >= plan.min_match),
                None => evaluator.statistical().filter(|&s| s >= self.threshold),
            };
            if let Some(score) = score {
                if top.admits(score) {
                    let letters = Letter::from_offsets("positions", &positions)?;
                    top.push(Scored {
                        score,
                        settings: base.with_positions(&letters),
                    });
                }
            }

            if !next_positions(&mut positions) {
                break;
            }
        }
        Ok(top)
    }
}

/// Odometer increment, rightmost slot fastest. Returns false after the last
/// combination.
fn next_positions(positions: &mut [u8]) -> bool {
    for p in positions.iter_mut().rev() {
        *p += 1;
        if usize::from(*p) < ALPHABET_LEN {
            return true;
        }
        *p = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::model::MachineModel;

    #[test]
    fn enumerates_orders_times_reflectors() {
        let config = SearchConfig::builder()
            .rotor_pool([RotorId::I, RotorId::II, RotorId::III, RotorId::IV])
            .reflector_pool([ReflectorId::B, ReflectorId::C])
            .build()
            .unwrap();
        let structures = enumerate(&config);
        assert_eq!(structures.len(), 4 * 3 * 2 * 2);
        assert_eq!(structures[0].rotors, vec![RotorId::I, RotorId::II, RotorId::III]);
        assert_eq!(structures[0].reflector, ReflectorId::B);
        assert_eq!(structures[1].reflector, ReflectorId::C);
    }

    #[test]
    fn four_rotor_orders_lead_with_static_rotor() {
        let config = SearchConfig::builder()
            .model(MachineModel::M4R2)
            .rotor_pool([RotorId::I, RotorId::II, RotorId::III])
            .build()
            .unwrap();
        let structures = enumerate(&config);
        assert_eq!(structures.len(), 2 * 6);
        assert!(structures.iter().all(|s| s.rotors.len() == 4 && s.rotors[0].is_static()));
        assert!(structures.iter().all(|s| s.reflector == ReflectorId::CThin));
    }

    #[test]
    fn odometer_covers_every_combination() {
        let mut positions = vec![0u8; 2];
        let mut count = 1;
        while next_positions(&mut positions) {
            count += 1;
        }
        assert_eq!(count, ALPHABET_LEN * ALPHABET_LEN);
        assert_eq!(positions, vec![0, 0]);
    }
}
