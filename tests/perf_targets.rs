use std::time::{Duration, Instant};

use enigma_analyzer::{
    CancelToken, Corpus, CryptanalysisEngine, EnigmaMachine, EnigmaSettings, ReflectorId, RotorId,
    SearchConfig,
};

fn per_sec(ops: u64, elapsed: Duration) -> f64 {
    if elapsed.is_zero() {
        return f64::INFINITY;
    }
    ops as f64 / elapsed.as_secs_f64()
}

fn corpus() -> Corpus {
    let mut corpus = Corpus::new();
    let text = "the enemy fleet will move north at dawn and the weather over the channel is clear \
                all ships will hold position until the signal is given";
    for w in text.split_whitespace() {
        corpus.add_unigram(w);
    }
    corpus.compile();
    corpus
}

/// Throughput figures are only meaningful in release builds.
///
/// Run manually:
/// - `cargo test --release --test perf_targets -- --ignored --nocapture`
///
/// To enforce thresholds (machine-dependent):
/// - `ENIGMA_ENFORCE_PERF=1 cargo test --release --test perf_targets -- --ignored --nocapture`
#[test]
#[ignore]
fn throughput_report() {
    assert!(!cfg!(debug_assertions), "throughput must be measured in --release");

    // Raw machine throughput.
    let settings = EnigmaSettings::builder()
        .rotors([RotorId::I, RotorId::II, RotorId::III])
        .reflector(ReflectorId::B)
        .plugboard("AB CD EF GH IJ")
        .build()
        .unwrap();
    let mut machine = EnigmaMachine::new(settings);
    let input: Vec<u8> = (0..10_000u32).map(|i| (i % 26) as u8).collect();
    let mut out = Vec::with_capacity(input.len());
    let rounds = 2_000u64;
    let started = Instant::now();
    for _ in 0..rounds {
        machine.encode_indices(&input, &mut out);
    }
    let letters_per_sec = per_sec(rounds * input.len() as u64, started.elapsed());
    println!("perf_targets: encode letters/s={letters_per_sec:.0}");

    // Stage 1 candidate throughput on all cores.
    let engine = CryptanalysisEngine::new(corpus());
    let config = SearchConfig::builder()
        .rotor_pool([RotorId::I, RotorId::II, RotorId::III, RotorId::IV, RotorId::V])
        .reflector_pool([ReflectorId::B])
        .max_candidates(2_000_000)
        .plugboard_depth(0)
        .build()
        .unwrap();
    let cipher = "QBLTWLDAHHYEOEFPTWYBLENDPMKOXLDFAMUDWIJDXRJZ".repeat(2);
    let started = Instant::now();
    let outcome = engine.attack_with(&cipher, &config, &CancelToken::new()).unwrap();
    let candidates_per_sec = per_sec(outcome.stats.evaluated, started.elapsed());
    println!(
        "perf_targets: stage1 candidates/s={candidates_per_sec:.0} (evaluated {}, workers {})",
        outcome.stats.evaluated,
        config.effective_workers()
    );

    if std::env::var("ENIGMA_ENFORCE_PERF").ok().as_deref() == Some("1") {
        let min_letters_per_sec = 50_000_000.0;
        let min_candidates_per_sec = 250_000.0;
        assert!(
            letters_per_sec >= min_letters_per_sec,
            "perf fail: encode letters/s={letters_per_sec:.0} < {min_letters_per_sec:.0}"
        );
        assert!(
            candidates_per_sec >= min_candidates_per_sec,
            "perf fail: stage1 candidates/s={candidates_per_sec:.0} < {min_candidates_per_sec:.0}"
        );
    }
}
