//! Stages 2 and 3: ring settings and plugboard.

use crate::config::RingSearch;
use crate::letter::{Letter, ALPHABET_LEN};
use crate::plugboard::Plugboard;

use super::budget::BudgetTracker;
use super::evaluate::Evaluator;
use super::top_k::Scored;

/// Coordinate search over the rings of the rightmost stepping rotors.
///
/// Each ring moves by `-span..=span` together with its start position, which
/// keeps the wiring offset and only moves the turnover point. Stage 1 ran
/// with every ring at `A`, so its best position for the next rotor to the
/// left may be one step off to absorb the wrong turnover; that neighbour's
/// position is moved by -1, 0 or +1 jointly with each ring. Passes repeat
/// until none improves. Only strict improvements are kept.
pub(crate) fn refine_rings(
    evaluator: &mut Evaluator<'_>,
    candidate: &Scored,
    search: RingSearch,
    budget: &BudgetTracker,
) -> Scored {
    let mut best = Scored {
        score: evaluator.score(&candidate.settings),
        settings: candidate.settings.clone(),
    };
    let n = best.settings.rotor_count();
    let first = n - search.rotors.min(2);
    let span = i32::from(search.span);
    loop {
        let mut improved = false;
        for slot in (first..n).rev() {
            if budget.should_stop() {
                return best;
            }
            // slot >= n - 2 >= 1, and slot - 1 always steps.
            let neighbour = slot - 1;
            let origin = best.settings.clone();
            let ring = origin.rings()[slot];
            let position = origin.positions()[slot];
            let carried = origin.positions()[neighbour];
            for delta in -span..=span {
                let shifted = origin.with_ring_and_position(slot, ring.shifted(delta), position.shifted(delta));
                for carry in -1..=1 {
                    if delta == 0 && carry == 0 {
                        continue;
                    }
                    let settings = shifted.with_position(neighbour, carried.shifted(carry));
                    let score = evaluator.score(&settings);
                    if score > best.score {
                        best = Scored { score, settings };
                        improved = true;
                    }
                }
            }
        }
        if !improved {
            return best;
        }
    }
}

/// Steepest-ascent plugboard hill climb.
///
/// Every step tries all single-pair changes: connecting two free letters,
/// removing a pair, or rewiring two letters into a new pair. The best strict
/// improvement is applied; the climb stops when nothing improves or `depth`
/// changes were made. Returns the result and the number of changes.
pub(crate) fn climb_plugboard(
    evaluator: &mut Evaluator<'_>,
    start: Scored,
    depth: usize,
    budget: &BudgetTracker,
) -> (Scored, usize) {
    let mut current = start;
    let mut changes = 0;
    while changes < depth && !budget.should_stop() {
        let board = *current.settings.plugboard();
        let mut best: Option<Scored> = None;
        for proposal in proposals(board) {
            let settings = current.settings.with_plugboard(proposal);
            let score = evaluator.score(&settings);
            let threshold = best.as_ref().map_or(current.score, |b| b.score);
            if score > threshold {
                best = Some(Scored { score, settings });
            }
        }
        match best {
            Some(next) => {
                current = next;
                changes += 1;
            }
            None => break,
        }
    }
    (current, changes)
}

/// All boards one cable change away from `board`.
fn proposals(board: Plugboard) -> impl Iterator<Item = Plugboard> {
    let letters: Vec<Letter> = Letter::all().collect();
    (0..ALPHABET_LEN).flat_map(move |i| {
        let letters = letters.clone();
        (i + 1..ALPHABET_LEN).filter_map(move |j| {
            let (a, b) = (letters[i], letters[j]);
            if board.partner(a) == b {
                Some(board.without(a))
            } else {
                board.without(a).without(b).with_pair(a, b).ok()
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Instant;

    use crate::catalog::{ReflectorId, RotorId};
    use crate::config::Budget;
    use crate::corpus::Corpus;
    use crate::engine::budget::CancelToken;
    use crate::engine::evaluate::Ciphertext;
    use crate::machine::EnigmaMachine;
    use crate::scorer::Scorer;
    use crate::settings::EnigmaSettings;

    const PLAINTEXT: &str = "the weather report for the north sea is clear with light wind from the west \
                             all ships will hold position until the signal is given at dawn \
                             the convoy is expected to pass the channel before the storm arrives";

    fn corpus() -> Corpus {
        let words: Vec<&str> = PLAINTEXT.split_whitespace().collect();
        let mut corpus = Corpus::new();
        for w in &words {
            corpus.add_unigram(w);
        }
        for pair in words.windows(2) {
            corpus.add_bigram(&pair.join(" "));
        }
        for triple in words.windows(3) {
            corpus.add_trigram(&triple.join(" "));
        }
        corpus.compile();
        corpus
    }

    fn key(rings: &str, positions: &str, plugboard: &str) -> EnigmaSettings {
        EnigmaSettings::builder()
            .rotors([RotorId::I, RotorId::II, RotorId::III])
            .reflector(ReflectorId::B)
            .rings(rings)
            .positions(positions)
            .plugboard(plugboard)
            .build()
            .unwrap()
    }

    fn decode(settings: &EnigmaSettings, cipher: &str) -> String {
        EnigmaMachine::new(settings.clone()).encode(cipher).unwrap()
    }

    fn unlimited() -> BudgetTracker {
        BudgetTracker::new(Budget::unlimited(), Instant::now(), CancelToken::new())
    }

    #[test]
    fn ring_search_corrects_right_ring_and_middle_position() {
        let truth = key("AAC", "DQR", "");
        let cipher_text = decode(&truth, PLAINTEXT);
        let cipher = Ciphertext::parse(&cipher_text).unwrap();
        let corpus = corpus();
        let mut evaluator = Evaluator::new(&cipher, &corpus, Scorer::default(), None);

        // Same wiring offsets with rings at A, the middle rotor one step back.
        let start = key("AAA", "DPP", "");
        assert_ne!(decode(&start, &cipher_text), PLAINTEXT);
        let start = Scored {
            score: evaluator.score(&start),
            settings: start,
        };

        let refined = refine_rings(&mut evaluator, &start, RingSearch::default(), &unlimited());
        assert!(refined.score > start.score);
        assert_eq!(decode(&refined.settings, &cipher_text), PLAINTEXT);
    }

    #[test]
    fn ring_search_without_rotors_only_rescores() {
        let truth = key("AAC", "DQR", "");
        let cipher = Ciphertext::parse(&decode(&truth, PLAINTEXT)).unwrap();
        let corpus = corpus();
        let mut evaluator = Evaluator::new(&cipher, &corpus, Scorer::default(), None);
        let start = Scored {
            score: 0.0,
            settings: key("AAA", "DPP", ""),
        };
        let search = RingSearch { rotors: 0, span: 3 };
        let refined = refine_rings(&mut evaluator, &start, search, &unlimited());
        assert_eq!(refined.settings, start.settings);
        assert!((refined.score - evaluator.score(&start.settings)).abs() < 1e-12);
    }

    #[test]
    fn climb_connects_the_missing_pair() {
        let truth = key("AAA", "KCW", "AE");
        let cipher_text = decode(&truth, PLAINTEXT);
        let cipher = Ciphertext::parse(&cipher_text).unwrap();
        let corpus = corpus();
        let mut evaluator = Evaluator::new(&cipher, &corpus, Scorer::default(), None);

        let start = key("AAA", "KCW", "");
        let start = Scored {
            score: evaluator.score(&start),
            settings: start,
        };
        let (climbed, changes) = climb_plugboard(&mut evaluator, start.clone(), 3, &unlimited());
        assert_eq!(changes, 1);
        assert!(climbed.score > start.score);
        assert_eq!(*climbed.settings.plugboard(), Plugboard::parse("AE").unwrap());
        assert_eq!(decode(&climbed.settings, &cipher_text), PLAINTEXT);
    }

    #[test]
    fn climb_respects_depth_zero() {
        let cipher = Ciphertext::parse(&decode(&key("AAA", "KCW", "AE"), PLAINTEXT)).unwrap();
        let corpus = corpus();
        let mut evaluator = Evaluator::new(&cipher, &corpus, Scorer::default(), None);
        let start = Scored {
            score: 0.0,
            settings: key("AAA", "KCW", ""),
        };
        let (climbed, changes) = climb_plugboard(&mut evaluator, start.clone(), 0, &unlimited());
        assert_eq!(changes, 0);
        assert_eq!(climbed.settings, start.settings);
    }

    #[test]
    fn proposals_cover_every_pair_once() {
        assert_eq!(proposals(Plugboard::empty()).count(), 325);
        let board = Plugboard::parse("AB").unwrap();
        let all: Vec<Plugboard> = proposals(board).collect();
        assert_eq!(all.len(), 325);
        assert!(all.contains(&Plugboard::empty()));
        assert!(all.contains(&Plugboard::parse("AC").unwrap()));
        assert!(all.contains(&Plugboard::parse("AB CD").unwrap()));
    }

    #[test]
    fn full_board_only_rewires() {
        let board = Plugboard::parse("AB CD EF GH IJ KL MN OP QR ST").unwrap();
        let all: Vec<Plugboard> = proposals(board).collect();
        assert!(all.iter().all(|p| p.len() <= 10));
        // Two free letters cannot be connected on a full board.
        assert!(!all.iter().any(|p| p.partner(Letter::from_char('U').unwrap()) == Letter::from_char('V').unwrap()));
    }
}
