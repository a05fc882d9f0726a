//! Background attack runtime.
//!
//! Attacks can run for minutes. The runtime keeps a small pool of named
//! worker threads behind a bounded queue so callers submit work, keep a
//! cancellable handle and collect the outcome later. A full queue is reported
//! immediately instead of blocking the caller.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SearchConfig;
use crate::error::{EngineError, EnigmaError, EnigmaResult};

use super::{AttackOutcome, CancelToken, CryptanalysisEngine};

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct AttackRuntimeConfig {
    /// Number of attack workers. Each attack also fans out over its own
    /// search threads.
    pub workers: usize,
    /// Maximum queued attacks.
    pub queue_capacity: usize,
}

impl Default for AttackRuntimeConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            queue_capacity: 16,
        }
    }
}

enum Job {
    Attack {
        id: Uuid,
        ciphertext: String,
        config: SearchConfig,
        cancel: CancelToken,
        reply: Sender<EnigmaResult<AttackOutcome>>,
    },

    #[cfg(test)]
    Sleep {
        duration: Duration,
        started: Sender<()>,
    },
}

fn run_job(engine: &CryptanalysisEngine, job: Job) {
    match job {
        Job::Attack {
            id,
            ciphertext,
            config,
            cancel,
            reply,
        } => {
            debug!(job = %id, "attack job started");
            let result = panic::catch_unwind(AssertUnwindSafe(|| engine.attack_with(&ciphertext, &config, &cancel)))
                .unwrap_or_else(|_| {
                    warn!(job = %id, "attack job panicked");
                    Err(EnigmaError::internal("attack panicked"))
                });
            let _ = reply.send(result);
        }

        #[cfg(test)]
        Job::Sleep { duration, started } => {
            let _ = started.send(());
            thread::sleep(duration);
        }
    }
}

/// Handle to a submitted attack.
#[derive(Debug)]
pub struct AttackHandle {
    id: Uuid,
    cancel: CancelToken,
    rx: Receiver<EnigmaResult<AttackOutcome>>,
}

impl AttackHandle {
    /// Job identifier, as logged by the worker.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Asks the attack to stop. A queued attack returns immediately with no
    /// candidates once it is picked up.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the attack to finish.
    ///
    /// # Errors
    ///
    /// Returns the attack's own error, or `Disconnected` if the worker went
    /// away without replying.
    pub fn join(self) -> EnigmaResult<AttackOutcome> {
        self.rx
            .recv()
            .map_err(|_| EnigmaError::Engine(EngineError::Disconnected))?
    }

    /// Waits at most `timeout` for the attack to finish.
    ///
    /// # Errors
    ///
    /// Same as [`join`](Self::join), plus `Timeout` when the attack is still
    /// running. The attack itself keeps going; cancel it separately.
    pub fn join_timeout(&self, timeout: Duration) -> EnigmaResult<AttackOutcome> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => EnigmaError::Engine(EngineError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            RecvTimeoutError::Disconnected => EnigmaError::Engine(EngineError::Disconnected),
        })?
    }
}

/// Pool of attack workers sharing one engine.
pub struct AttackRuntime {
    engine: Arc<CryptanalysisEngine>,
    tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    queue_capacity: usize,
}

impl AttackRuntime {
    /// Starts the worker threads.
    ///
    /// # Errors
    ///
    /// Returns an internal error if a worker thread cannot be spawned; any
    /// workers already started are shut down first.
    pub fn new(engine: CryptanalysisEngine, config: &AttackRuntimeConfig) -> EnigmaResult<Self> {
        let engine = Arc::new(engine);
        let queue_capacity = config.queue_capacity.max(1);
        let (tx, rx) = bounded::<Job>(queue_capacity);

        let mut runtime = Self {
            engine,
            tx: Some(tx),
            workers: Vec::with_capacity(config.workers.max(1)),
            queue_capacity,
        };
        for idx in 0..config.workers.max(1) {
            let rx: Receiver<Job> = rx.clone();
            let engine = Arc::clone(&runtime.engine);
            let handle = thread::Builder::new()
                .name(format!("enigma-attack-{idx}"))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        run_job(&engine, job);
                    }
                })
                .map_err(|e| EnigmaError::internal(format!("failed to spawn attack worker: {e}")))?;
            runtime.workers.push(handle);
        }
        Ok(runtime)
    }

    /// Queues an attack.
    ///
    /// # Errors
    ///
    /// Returns `QueueFull` when `queue_capacity` attacks are already waiting.
    pub fn submit(&self, ciphertext: impl Into<String>, config: SearchConfig) -> EnigmaResult<AttackHandle> {
        let id = Uuid::new_v4();
        let cancel = CancelToken::new();
        let (reply, rx) = bounded::<EnigmaResult<AttackOutcome>>(1);
        self.try_submit(Job::Attack {
            id,
            ciphertext: ciphertext.into(),
            config,
            cancel: cancel.clone(),
            reply,
        })?;
        Ok(AttackHandle { id, cancel, rx })
    }

    /// Runs an attack on the pool and waits for it.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit) and [`AttackHandle::join`].
    pub fn attack(&self, ciphertext: impl Into<String>, config: SearchConfig) -> EnigmaResult<AttackOutcome> {
        self.submit(ciphertext, config)?.join()
    }

    /// The shared engine.
    #[must_use]
    pub fn engine(&self) -> &CryptanalysisEngine {
        &self.engine
    }

    fn try_submit(&self, job: Job) -> EnigmaResult<()> {
        let tx = self.tx.as_ref().ok_or(EngineError::Disconnected)?;
        match tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(EngineError::QueueFull {
                capacity: self.queue_capacity,
            }
            .into()),
            Err(TrySendError::Disconnected(_)) => Err(EngineError::Disconnected.into()),
        }
    }

    #[cfg(test)]
    fn submit_sleep(&self, duration: Duration) -> EnigmaResult<Receiver<()>> {
        let (started, rx) = bounded::<()>(1);
        self.try_submit(Job::Sleep { duration, started })?;
        Ok(rx)
    }
}

impl Drop for AttackRuntime {
    fn drop(&mut self) {
        // Closing the queue lets workers drain it and exit.
        drop(self.tx.take());
        for handle in std::mem::take(&mut self.workers) {
            let _ = handle.join();
        }
    }
}
