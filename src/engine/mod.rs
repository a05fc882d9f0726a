//! Cryptanalysis engine.
//!
//! An attack runs in stages over a shrinking candidate set:
//!
//! 1. structural search over rotor orders, reflectors and start positions,
//!    one task per order and reflector on a pool of worker threads;
//! 2. ring-setting refinement of the stage 1 survivors;
//! 3. plugboard hill climbing on the best few;
//! 4. merge, dedupe, rank and decode.
//!
//! Workers only share the compiled corpus (read-only) and a bounded top-K,
//! which is locked just long enough to merge a finished task's local results.

mod budget;
mod evaluate;
mod refine;
mod structural;
mod top_k;

/// Background attack runtime with cancellable handles.
pub mod runtime;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossbeam_channel::bounded;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::candidate::CandidateResult;
use crate::config::SearchConfig;
use crate::corpus::Corpus;
use crate::error::{EnigmaError, EnigmaResult};
use crate::machine::EnigmaMachine;
use crate::scorer::Scorer;

pub use budget::CancelToken;

use budget::BudgetTracker;
use evaluate::{Ciphertext, CribPlan, Evaluator};
use structural::{StageOne, Structure};
use top_k::{Scored, TopK};

/// Bookkeeping of one attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackStats {
    /// Unique attack identifier, also used in log events.
    pub attack_id: Uuid,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Letters in the ciphertext.
    pub ciphertext_letters: usize,
    /// Rotor order and reflector combinations searched in stage 1.
    pub structures: usize,
    /// Stage 1 candidates decoded.
    pub evaluated: u64,
    /// Candidates kept by stage 1.
    pub stage_one_survivors: usize,
    /// Candidates whose ring settings were refined.
    pub ring_refined: usize,
    /// Plugboard changes accepted by stage 3, summed over candidates.
    pub plugboard_changes: usize,
    /// Stage 1 tasks that panicked and were skipped.
    pub failed_tasks: usize,
    /// A time or candidate limit stopped the search early.
    pub budget_exhausted: bool,
    /// The caller cancelled the attack.
    pub cancelled: bool,
    /// Total duration.
    pub elapsed: Duration,
}

impl AttackStats {
    fn new(ciphertext_letters: usize) -> Self {
        Self {
            attack_id: Uuid::new_v4(),
            started_at: Utc::now(),
            ciphertext_letters,
            structures: 0,
            evaluated: 0,
            stage_one_survivors: 0,
            ring_refined: 0,
            plugboard_changes: 0,
            failed_tasks: 0,
            budget_exhausted: false,
            cancelled: false,
            elapsed: Duration::ZERO,
        }
    }
}

/// Ranked results plus statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Candidates, best first.
    pub candidates: Vec<CandidateResult>,
    /// Attack bookkeeping.
    pub stats: AttackStats,
}

/// Recovers Enigma keys from ciphertext by statistical search.
#[derive(Debug, Clone)]
pub struct CryptanalysisEngine {
    corpus: Arc<Corpus>,
}

impl CryptanalysisEngine {
    /// Creates an engine scoring against `corpus`.
    ///
    /// The corpus should be compiled; a stale corpus still works but ranks
    /// with the letter model of its last compile.
    #[must_use]
    pub fn new(corpus: Corpus) -> Self {
        Self::from_shared(Arc::new(corpus))
    }

    /// Creates an engine over an already shared corpus.
    #[must_use]
    pub fn from_shared(corpus: Arc<Corpus>) -> Self {
        Self { corpus }
    }

    /// The scoring corpus.
    #[must_use]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Runs an attack and returns the ranked candidates.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid `config`, an input error
    /// for letters outside A-Z, or an internal error if a worker cannot be
    /// started.
    pub fn attack(&self, ciphertext: &str, config: &SearchConfig) -> EnigmaResult<Vec<CandidateResult>> {
        self.attack_with(ciphertext, config, &CancelToken::new())
            .map(|outcome| outcome.candidates)
    }

    /// Runs an attack that `cancel` can stop early.
    ///
    /// # Errors
    ///
    /// Same as [`attack`](Self::attack).
    pub fn attack_with(
        &self,
        ciphertext: &str,
        config: &SearchConfig,
        cancel: &CancelToken,
    ) -> EnigmaResult<AttackOutcome> {
        config.validate()?;
        let cipher = Ciphertext::parse(ciphertext)?;
        let clock = Instant::now();
        let mut stats = AttackStats::new(cipher.letters().len());

        if cipher.letters().is_empty() {
            debug!(attack_id = %stats.attack_id, "ciphertext has no letters");
            return Ok(finish(Vec::new(), stats, clock));
        }
        if self.corpus.is_stale() {
            warn!(attack_id = %stats.attack_id, "corpus modified since last compile");
        }
        let crib = config
            .crib
            .as_ref()
            .map(|c| CribPlan::new(c, cipher.letters()))
            .transpose()?;
        if crib.as_ref().is_some_and(|plan| !plan.has_offsets()) {
            debug!(attack_id = %stats.attack_id, "no crib position is consistent with the ciphertext");
            return Ok(finish(Vec::new(), stats, clock));
        }

        let structures = structural::enumerate(config);
        let workers = config.effective_workers().min(structures.len()).max(1);
        let budget = BudgetTracker::new(config.budget, clock, cancel.clone());
        let scorer = Scorer::new(config.weights);
        stats.structures = structures.len();
        info!(
            attack_id = %stats.attack_id,
            letters = stats.ciphertext_letters,
            structures = structures.len(),
            workers,
            crib = crib.is_some(),
            "attack started"
        );

        let stage_one = StageOne {
            cipher: &cipher,
            corpus: &self.corpus,
            scorer,
            crib: crib.as_ref(),
            budget: &budget,
            threshold: config.plausibility_threshold,
            capacity: config.stage_one_capacity,
        };
        let (survivors, failed_tasks) = run_stage_one(&stage_one, &structures, workers)?;
        stats.evaluated = budget.evaluated();
        stats.failed_tasks = failed_tasks;
        stats.stage_one_survivors = survivors.len();
        debug!(
            attack_id = %stats.attack_id,
            evaluated = stats.evaluated,
            survivors = survivors.len(),
            failed_tasks,
            "stage 1 finished"
        );
        if budget.exhausted() {
            warn!(attack_id = %stats.attack_id, evaluated = stats.evaluated, "attack budget exhausted");
        }

        let mut evaluator = Evaluator::new(&cipher, &self.corpus, scorer, crib.as_ref());
        let mut refined: Vec<Scored> = survivors
            .into_sorted_vec()
            .iter()
            .map(|candidate| refine::refine_rings(&mut evaluator, candidate, config.ring_search, &budget))
            .collect();
        refined.sort();
        stats.ring_refined = refined.len();
        debug!(attack_id = %stats.attack_id, candidates = refined.len(), "stage 2 finished");

        let mut merged = Vec::with_capacity(refined.len() + config.refine_count);
        for candidate in refined.iter().take(config.refine_count) {
            let (climbed, changes) =
                refine::climb_plugboard(&mut evaluator, candidate.clone(), config.plugboard_depth, &budget);
            stats.plugboard_changes += changes;
            merged.push(climbed);
        }
        debug!(
            attack_id = %stats.attack_id,
            climbed = merged.len(),
            changes = stats.plugboard_changes,
            "stage 3 finished"
        );
        merged.extend(refined);

        merged.sort();
        merged.dedup_by(|a, b| a.settings == b.settings);
        merged.truncate(config.result_count);

        let candidates = merged
            .into_iter()
            .map(|scored| {
                let plaintext = EnigmaMachine::new(scored.settings.clone()).encode(ciphertext)?;
                Ok(CandidateResult::new(scored.settings, plaintext, scored.score))
            })
            .collect::<EnigmaResult<Vec<_>>>()?;

        stats.budget_exhausted = budget.exhausted();
        stats.cancelled = budget.cancelled();
        let outcome = finish(candidates, stats, clock);
        info!(
            attack_id = %outcome.stats.attack_id,
            results = outcome.candidates.len(),
            best_score = outcome.candidates.first().map(|c| c.score),
            elapsed_ms = u64::try_from(outcome.stats.elapsed.as_millis()).unwrap_or(u64::MAX),
            "attack finished"
        );
        Ok(outcome)
    }
}

fn finish(candidates: Vec<CandidateResult>, mut stats: AttackStats, clock: Instant) -> AttackOutcome {
    stats.elapsed = clock.elapsed();
    AttackOutcome { candidates, stats }
}

/// Runs every structure on `workers` named threads, merging each task's
/// local top-K into the shared one. A panicking task is logged, counted and
/// skipped.
fn run_stage_one(
    stage: &StageOne<'_>,
    structures: &[Structure],
    workers: usize,
) -> EnigmaResult<(TopK, usize)> {
    let shared = Mutex::new(TopK::new(stage.capacity));
    let failed = AtomicUsize::new(0);

    let (tx, rx) = bounded::<&Structure>(structures.len().max(1));
    for structure in structures {
        tx.send(structure)
            .map_err(|_| EnigmaError::internal("stage 1 job queue disconnected"))?;
    }
    drop(tx);

    thread::scope(|scope| -> EnigmaResult<()> {
        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let rx = rx.clone();
            let shared = &shared;
            let failed = &failed;
            let handle = thread::Builder::new()
                .name(format!("enigma-search-{idx}"))
                .spawn_scoped(scope, move || -> EnigmaResult<()> {
                    while let Ok(structure) = rx.recv() {
                        match panic::catch_unwind(AssertUnwindSafe(|| stage.run(structure))) {
                            Ok(Ok(local)) => shared
                                .lock()
                                .map_err(|_| EnigmaError::internal("top-k lock poisoned"))?
                                .merge(local),
                            Ok(Err(err)) => return Err(err),
                            Err(_) => {
                                failed.fetch_add(1, Ordering::Relaxed);
                                warn!(
                                    rotors = ?structure.rotors,
                                    reflector = %structure.reflector,
                                    "stage 1 task panicked; skipped"
                                );
                            }
                        }
                    }
                    Ok(())
                })
                .map_err(|e| EnigmaError::internal(format!("failed to spawn search worker: {e}")))?;
            handles.push(handle);
        }
        for handle in handles {
            handle
                .join()
                .map_err(|_| EnigmaError::internal("search worker panicked"))??;
        }
        Ok(())
    })?;

    let top = shared
        .into_inner()
        .map_err(|_| EnigmaError::internal("top-k lock poisoned"))?;
    Ok((top, failed.into_inner()))
}
