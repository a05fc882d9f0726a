//! End-to-end attacks on small key spaces.

mod common;

use std::time::Duration;

use enigma_analyzer::{
    CancelToken, ConfigurationError, Crib, CryptanalysisEngine, EnigmaError, EnigmaMachine, EnigmaSettings,
    InputError, ReflectorId, RotorId, SearchConfig,
};

const PLAINTEXT: &str = "the enemy fleet will move north at dawn and the weather over the channel is clear";

fn small_search() -> SearchConfig {
    SearchConfig::builder()
        .rotor_pool([RotorId::I, RotorId::II, RotorId::III])
        .reflector_pool([ReflectorId::B])
        .plugboard_depth(2)
        .refine_count(3)
        .result_count(5)
        .workers(2)
        .build()
        .unwrap()
}

#[test]
fn recovers_key_from_ciphertext_alone() {
    let key = common::settings([RotorId::II, RotorId::III, RotorId::I], ReflectorId::B, "DQR");
    let cipher = common::encipher(&key, PLAINTEXT);
    assert_ne!(cipher, PLAINTEXT);

    let engine = CryptanalysisEngine::new(common::corpus());
    let outcome = engine
        .attack_with(&cipher, &small_search(), &CancelToken::new())
        .unwrap();

    assert!(!outcome.candidates.is_empty());
    assert!(outcome.candidates.len() <= 5);
    assert_eq!(outcome.candidates[0].plaintext, PLAINTEXT);
    assert_eq!(outcome.candidates[0].settings.rotors(), key.rotors());
    assert!(outcome
        .candidates
        .windows(2)
        .all(|w| w[0].score >= w[1].score));
    assert_eq!(outcome.stats.structures, 6);
    assert_eq!(outcome.stats.evaluated, 6 * 26 * 26 * 26);
    assert_eq!(outcome.stats.failed_tasks, 0);
    assert!(!outcome.stats.budget_exhausted);

    // Every candidate's plaintext is what its own settings decode.
    for candidate in &outcome.candidates {
        let decoded = EnigmaMachine::new(candidate.settings.clone())
            .encode(&cipher)
            .unwrap();
        assert_eq!(decoded, candidate.plaintext);
    }
}

#[test]
fn recovers_ring_offsets_and_plugboard() {
    let plaintext = common::words(&common::TRAINING_TEXT.split('.').take(5).collect::<String>()).join(" ");
    let key = EnigmaSettings::builder()
        .rotors([RotorId::II, RotorId::III, RotorId::I])
        .reflector(ReflectorId::B)
        .rings("ABC")
        .positions("DQR")
        .plugboard("BP GY")
        .build()
        .unwrap();
    let cipher = common::encipher(&key, &plaintext);

    let config = SearchConfig {
        plugboard_depth: 4,
        refine_count: 5,
        ..small_search()
    };
    let engine = CryptanalysisEngine::new(common::corpus());
    let outcome = engine
        .attack_with(&cipher, &config, &CancelToken::new())
        .unwrap();

    let best = &outcome.candidates[0];
    assert_eq!(best.plaintext, plaintext, "best key {}", best.settings);
    assert_eq!(best.settings.rotors(), key.rotors());
    assert_eq!(best.settings.plugboard(), key.plugboard());
    assert!(outcome.stats.plugboard_changes >= 2);
}

#[test]
fn crib_guided_attack_finds_the_crib() {
    let key = common::settings([RotorId::III, RotorId::I, RotorId::II], ReflectorId::B, "KCW");
    let cipher = common::encipher(&key, PLAINTEXT);

    let config = SearchConfig {
        crib: Some(Crib::new("weather")),
        ..small_search()
    };
    let engine = CryptanalysisEngine::new(common::corpus());
    let results = engine.attack(&cipher, &config).unwrap();

    assert_eq!(results[0].plaintext, PLAINTEXT);
    assert_eq!(results[0].settings.positions(), key.positions());
}

#[test]
fn exhausted_time_budget_returns_empty_not_error() {
    let cipher = common::encipher(
        &common::settings([RotorId::I, RotorId::II, RotorId::III], ReflectorId::B, "ABC"),
        PLAINTEXT,
    );
    let config = SearchConfig {
        budget: enigma_analyzer::Budget {
            max_duration: Some(Duration::ZERO),
            max_candidates: None,
        },
        ..small_search()
    };
    let engine = CryptanalysisEngine::new(common::corpus());
    let outcome = engine
        .attack_with(&cipher, &config, &CancelToken::new())
        .unwrap();
    assert!(outcome.candidates.is_empty());
    assert!(outcome.stats.budget_exhausted);
    assert_eq!(outcome.stats.evaluated, 0);
}

#[test]
fn empty_ciphertext_yields_no_candidates() {
    let engine = CryptanalysisEngine::new(common::corpus());
    assert!(engine.attack("", &small_search()).unwrap().is_empty());
    assert!(engine.attack(" ,.; 42", &small_search()).unwrap().is_empty());
}

#[test]
fn invalid_configuration_is_rejected() {
    let engine = CryptanalysisEngine::new(common::corpus());
    let mut config = small_search();
    config.reflector_pool.clear();
    let err = engine.attack("ABC", &config).unwrap_err();
    assert_eq!(err, EnigmaError::Configuration(ConfigurationError::EmptyReflectorPool));

    let config = SearchConfig {
        rotor_pool: vec![RotorId::I, RotorId::II],
        ..small_search()
    };
    let err = engine.attack("ABC", &config).unwrap_err();
    let EnigmaError::Configuration(ConfigurationError::PoolTooSmall { needed, available }) = err else {
        panic!("expected PoolTooSmall, got {err:?}");
    };
    assert_eq!((needed, available), (3, 2));
}

#[test]
fn unsupported_letters_are_rejected() {
    let engine = CryptanalysisEngine::new(common::corpus());
    let err = engine.attack("STRAßE", &small_search()).unwrap_err();
    assert_eq!(
        err,
        EnigmaError::Input(InputError::UnsupportedCharacter { ch: 'ß', index: 4 })
    );
}

#[test]
fn outcome_serializes_to_json() {
    let engine = CryptanalysisEngine::new(common::corpus());
    let config = SearchConfig {
        budget: enigma_analyzer::Budget {
            max_duration: None,
            max_candidates: Some(2_000),
        },
        ..small_search()
    };
    let outcome = engine
        .attack_with("QBLTW LDAHH YEOEF PTWYB LENDP MKOXL DFAMU DWIJD XRJZ", &config, &CancelToken::new())
        .unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["stats"]["evaluated"], 2_000);
    assert!(json["candidates"].is_array());
}
