//! Alphabet letters as validated offsets.
//!
//! Every ring setting, rotor position and enciphered character is a value in
//! `0..26`. `Letter` keeps that invariant in the type so machines never have to
//! re-check ranges in the hot path.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Number of letters in the machine alphabet.
pub const ALPHABET_LEN: usize = 26;

/// A letter of the A-Z alphabet stored as its offset from `A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub struct Letter(u8);

impl Letter {
    /// The letter `A` (offset 0).
    pub const A: Self = Self(0);

    /// Builds a letter from an ASCII letter of either case.
    #[must_use]
    pub const fn from_char(ch: char) -> Option<Self> {
        match ch {
            'A'..='Z' => Some(Self(ch as u8 - b'A')),
            'a'..='z' => Some(Self(ch as u8 - b'a')),
            _ => None,
        }
    }

    /// Builds a letter from an offset in `0..26`.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        if (index as usize) < ALPHABET_LEN {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Offset from `A`.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Uppercase character for this letter.
    #[must_use]
    pub const fn to_char(self) -> char {
        (b'A' + self.0) as char
    }

    /// Lowercase character for this letter.
    #[must_use]
    pub const fn to_lowercase(self) -> char {
        (b'a' + self.0) as char
    }

    /// Letter `delta` places further along the alphabet, wrapping around.
    #[must_use]
    pub const fn shifted(self, delta: i32) -> Self {
        Self((self.0 as i32 + delta).rem_euclid(ALPHABET_LEN as i32) as u8)
    }

    /// Iterates `A..=Z`.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..ALPHABET_LEN as u8).map(Self)
    }

    /// Parses a run of letters such as `"JKQ"`, reporting `field` on failure.
    pub fn parse_run(field: &str, text: &str) -> Result<Vec<Self>, ConfigurationError> {
        text.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| {
                Self::from_char(c).ok_or_else(|| ConfigurationError::OutOfRange {
                    field: field.to_string(),
                    value: c.to_string(),
                })
            })
            .collect()
    }

    /// Converts raw offsets, rejecting anything outside `0..26`.
    pub fn from_offsets(field: &str, offsets: &[u8]) -> Result<Vec<Self>, ConfigurationError> {
        offsets
            .iter()
            .map(|&o| {
                Self::from_index(o).ok_or_else(|| ConfigurationError::OutOfRange {
                    field: field.to_string(),
                    value: o.to_string(),
                })
            })
            .collect()
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl TryFrom<char> for Letter {
    type Error = ConfigurationError;

    fn try_from(ch: char) -> Result<Self, Self::Error> {
        Self::from_char(ch).ok_or_else(|| ConfigurationError::OutOfRange {
            field: "letter".to_string(),
            value: ch.to_string(),
        })
    }
}

impl From<Letter> for char {
    fn from(letter: Letter) -> Self {
        letter.to_char()
    }
}

/// Renders letters as a compact string, e.g. `JKQ`.
pub(crate) fn render(letters: &[Letter]) -> String {
    letters.iter().map(|l| l.to_char()).collect()
}
