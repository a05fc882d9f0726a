//! # enigma-analyzer - Enigma simulation and statistical cryptanalysis
//!
//! The crate has two halves. The simulator models the Enigma family (three
//! and four rotor machines, ring settings, reflectors, plugboard) exactly,
//! double-step included. The analyzer recovers a key from ciphertext alone by
//! a staged search scored against an n-gram corpus.
//!
//! ## Core Concepts
//!
//! - **EnigmaSettings**: An immutable, validated machine key
//! - **EnigmaMachine**: A live machine owning its rotor positions
//! - **Corpus**: Word n-gram frequencies with an explicit compile step
//! - **Scorer**: How English-like a candidate plaintext is
//! - **CryptanalysisEngine**: Structural search, ring refinement, plugboard climbing
//!
//! ## Usage
//!
//! ```rust,ignore
//! use enigma_analyzer::{Corpus, CryptanalysisEngine, EnigmaMachine, EnigmaSettings, SearchConfig};
//!
//! let settings = EnigmaSettings::builder()
//!     .rotors([RotorId::I, RotorId::II, RotorId::III])
//!     .reflector(ReflectorId::B)
//!     .positions("JKQ")
//!     .plugboard("AB CE FI")
//!     .build()?;
//! let cipher = EnigmaMachine::new(settings).encode("attack at dawn")?;
//!
//! let mut corpus = Corpus::new();
//! for word in training_text.split_whitespace() {
//!     corpus.add_unigram(word);
//! }
//! corpus.compile();
//!
//! let engine = CryptanalysisEngine::new(corpus);
//! let best = engine.attack(&cipher, &SearchConfig::default())?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Machine
pub mod catalog;
pub mod error;
pub mod letter;
pub mod machine;
pub mod model;
pub mod plugboard;
pub mod settings;
pub mod text;

// Analysis
pub mod candidate;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod scorer;

pub use candidate::CandidateResult;
pub use catalog::{ReflectorId, ReflectorWiring, RotorId, RotorWiring};
pub use config::{Budget, Crib, RingSearch, SearchConfig, SearchConfigBuilder};
pub use corpus::{Corpus, GramKind, LetterModel, RankedGram};
pub use engine::runtime::{AttackHandle, AttackRuntime, AttackRuntimeConfig};
pub use engine::{AttackOutcome, AttackStats, CancelToken, CryptanalysisEngine};
pub use error::{ConfigurationError, EngineError, EnigmaError, EnigmaResult, InputError};
pub use letter::Letter;
pub use machine::{EnigmaMachine, MachineEvent};
pub use model::MachineModel;
pub use plugboard::Plugboard;
pub use scorer::{ScoreBreakdown, ScoreWeights, Scorer};
pub use settings::{EnigmaSettings, EnigmaSettingsBuilder};
pub use text::{format_text, letters_only, SpacingMode};
