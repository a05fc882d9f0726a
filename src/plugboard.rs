//! Plugboard (Steckerbrett).
//!
//! A plugboard is a partial involution of the alphabet: up to ten disjoint
//! letter pairs are swapped on the way into and out of the rotor stack, every
//! other letter passes through unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::letter::{Letter, ALPHABET_LEN};

/// Maximum number of cables on a historical plugboard.
pub const MAX_PAIRS: usize = 10;

const IDENTITY: [u8; ALPHABET_LEN] = {
    let mut map = [0u8; ALPHABET_LEN];
    let mut i = 0;
    while i < ALPHABET_LEN {
        map[i] = i as u8;
        i += 1;
    }
    map
};

/// Swap table with at most [`MAX_PAIRS`] disjoint pairs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Plugboard {
    map: [u8; ALPHABET_LEN],
}

impl Default for Plugboard {
    fn default() -> Self {
        Self::empty()
    }
}

impl Plugboard {
    /// A plugboard with no cables.
    #[must_use]
    pub const fn empty() -> Self {
        Self { map: IDENTITY }
    }

    /// Parses pairs such as `"AB CD EF"` or the concatenated form `"ABCDEF"`.
    ///
    /// Case and whitespace are ignored. Fails on an odd number of letters, a
    /// letter paired with itself, a letter used twice, more than ten pairs, or
    /// any character that is not an ASCII letter.
    pub fn parse(text: &str) -> Result<Self, ConfigurationError> {
        let mut letters = Vec::with_capacity(2 * MAX_PAIRS);
        for ch in text.chars().filter(|c| !c.is_whitespace()) {
            let letter = Letter::from_char(ch).ok_or_else(|| ConfigurationError::InvalidPlugboard {
                reason: format!("{ch:?} is not a letter"),
            })?;
            letters.push(letter);
        }
        if letters.len() % 2 != 0 {
            return Err(ConfigurationError::InvalidPlugboard {
                reason: format!("odd number of letters ({})", letters.len()),
            });
        }
        let pairs: Vec<(Letter, Letter)> = letters.chunks_exact(2).map(|p| (p[0], p[1])).collect();
        Self::from_pairs(&pairs)
    }

    /// Builds a plugboard from explicit pairs.
    pub fn from_pairs(pairs: &[(Letter, Letter)]) -> Result<Self, ConfigurationError> {
        if pairs.len() > MAX_PAIRS {
            return Err(ConfigurationError::InvalidPlugboard {
                reason: format!("{} pairs, at most {MAX_PAIRS} allowed", pairs.len()),
            });
        }
        let mut board = Self::empty();
        for &(a, b) in pairs {
            board = board.with_pair(a, b)?;
        }
        Ok(board)
    }

    /// Returns a copy with one more pair connected.
    pub fn with_pair(mut self, a: Letter, b: Letter) -> Result<Self, ConfigurationError> {
        if a == b {
            return Err(ConfigurationError::InvalidPlugboard {
                reason: format!("{a} cannot be paired with itself"),
            });
        }
        for letter in [a, b] {
            if self.is_plugged(letter) {
                return Err(ConfigurationError::InvalidPlugboard {
                    reason: format!("{letter} is used more than once"),
                });
            }
        }
        if self.len() >= MAX_PAIRS {
            return Err(ConfigurationError::InvalidPlugboard {
                reason: format!("at most {MAX_PAIRS} pairs allowed"),
            });
        }
        self.map[a.index() as usize] = b.index();
        self.map[b.index() as usize] = a.index();
        Ok(self)
    }

    /// Returns a copy with the cable on `letter` (if any) removed.
    #[must_use]
    pub fn without(mut self, letter: Letter) -> Self {
        let i = letter.index() as usize;
        let partner = self.map[i] as usize;
        self.map[i] = i as u8;
        self.map[partner] = partner as u8;
        self
    }

    /// Swaps a letter offset through the board.
    #[inline]
    #[must_use]
    pub const fn swap(&self, index: u8) -> u8 {
        self.map[index as usize]
    }

    /// Partner of `letter`, itself when unplugged.
    #[must_use]
    pub const fn partner(&self, letter: Letter) -> Letter {
        match Letter::from_index(self.map[letter.index() as usize]) {
            Some(l) => l,
            None => letter,
        }
    }

    /// Returns true when a cable is plugged into `letter`.
    #[must_use]
    pub const fn is_plugged(&self, letter: Letter) -> bool {
        self.map[letter.index() as usize] != letter.index()
    }

    /// Number of connected pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.iter().enumerate().filter(|&(i, &m)| i as u8 != m).count() / 2
    }

    /// Returns true when no cable is plugged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map == IDENTITY
    }

    /// Connected pairs, each ordered low letter first, sorted.
    #[must_use]
    pub fn pairs(&self) -> Vec<(Letter, Letter)> {
        Letter::all()
            .filter_map(|a| {
                let b = self.partner(a);
                (a < b).then_some((a, b))
            })
            .collect()
    }
}

impl fmt::Display for Plugboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (a, b)) in self.pairs().into_iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{a}{b}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Plugboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plugboard({self})")
    }
}

impl FromStr for Plugboard {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Plugboard {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Plugboard> for String {
    fn from(board: Plugboard) -> Self {
        board.to_string()
    }
}
