//! Rotor and reflector catalog.
//!
//! Wiring tables are the historical Enigma wirings, built at compile time and
//! shared as `&'static` data by every machine and search worker.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::letter::ALPHABET_LEN;

/// Identifier of a rotor in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RotorId {
    /// Rotor I, turnover at Q.
    I,
    /// Rotor II, turnover at E.
    II,
    /// Rotor III, turnover at V.
    III,
    /// Rotor IV, turnover at J.
    IV,
    /// Rotor V, turnover at Z.
    V,
    /// Naval rotor VI, turnovers at Z and M.
    VI,
    /// Naval rotor VII, turnovers at Z and M.
    VII,
    /// Naval rotor VIII, turnovers at Z and M.
    VIII,
    /// Static M4 rotor Beta.
    Beta,
    /// Static M4 rotor Gamma.
    Gamma,
}

impl RotorId {
    /// Every rotor in catalog order.
    pub const ALL: [Self; 10] = [
        Self::I,
        Self::II,
        Self::III,
        Self::IV,
        Self::V,
        Self::VI,
        Self::VII,
        Self::VIII,
        Self::Beta,
        Self::Gamma,
    ];

    /// Rotors that step.
    pub const STEPPING: [Self; 8] = [
        Self::I,
        Self::II,
        Self::III,
        Self::IV,
        Self::V,
        Self::VI,
        Self::VII,
        Self::VIII,
    ];

    /// Non-stepping rotors, only valid in the leftmost slot of a 4-rotor machine.
    pub const STATIC: [Self; 2] = [Self::Beta, Self::Gamma];

    /// Returns true for Beta and Gamma.
    #[must_use]
    pub const fn is_static(self) -> bool {
        matches!(self, Self::Beta | Self::Gamma)
    }

    /// Wiring table for this rotor.
    #[must_use]
    pub fn wiring(self) -> &'static RotorWiring {
        &ROTORS[self as usize]
    }

    /// Conventional name (`"I"` .. `"VIII"`, `"Beta"`, `"Gamma"`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::I => "I",
            Self::II => "II",
            Self::III => "III",
            Self::IV => "IV",
            Self::V => "V",
            Self::VI => "VI",
            Self::VII => "VII",
            Self::VIII => "VIII",
            Self::Beta => "Beta",
            Self::Gamma => "Gamma",
        }
    }
}

impl fmt::Display for RotorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RotorId {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ConfigurationError::UnknownRotor {
                name: trimmed.to_string(),
            })
    }
}

/// Identifier of a reflector in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReflectorId {
    /// Wide reflector B.
    B,
    /// Wide reflector C.
    C,
    /// Thin reflector B for the M4.
    BThin,
    /// Thin reflector C for the M4.
    CThin,
}

impl ReflectorId {
    /// Every reflector in catalog order.
    pub const ALL: [Self; 4] = [Self::B, Self::C, Self::BThin, Self::CThin];

    /// Thin reflectors fit only 4-rotor machines.
    #[must_use]
    pub const fn is_thin(self) -> bool {
        matches!(self, Self::BThin | Self::CThin)
    }

    /// Returns true when this reflector fits a machine with `rotor_count` rotors.
    #[must_use]
    pub const fn fits(self, rotor_count: usize) -> bool {
        match rotor_count {
            3 => !self.is_thin(),
            4 => self.is_thin(),
            _ => false,
        }
    }

    /// Wiring table for this reflector.
    #[must_use]
    pub fn wiring(self) -> &'static ReflectorWiring {
        &REFLECTORS[self as usize]
    }

    /// Conventional name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::B => "B",
            Self::C => "C",
            Self::BThin => "B-thin",
            Self::CThin => "C-thin",
        }
    }
}

impl fmt::Display for ReflectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReflectorId {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "b" => Ok(Self::B),
            "c" => Ok(Self::C),
            "bthin" => Ok(Self::BThin),
            "cthin" => Ok(Self::CThin),
            _ => Err(ConfigurationError::UnknownReflector {
                name: s.trim().to_string(),
            }),
        }
    }
}

/// Wiring of one rotor: a permutation of the alphabet plus its notches.
#[derive(Debug, PartialEq, Eq)]
pub struct RotorWiring {
    id: RotorId,
    forward: [u8; ALPHABET_LEN],
    inverse: [u8; ALPHABET_LEN],
    /// Bit `i` set when the rotor carries its neighbour over while showing letter `i`.
    notches: u32,
}

impl RotorWiring {
    /// Which rotor this is.
    #[must_use]
    pub const fn id(&self) -> RotorId {
        self.id
    }

    /// Right-to-left mapping of contact `index`.
    #[inline]
    #[must_use]
    pub const fn forward(&self, index: u8) -> u8 {
        self.forward[index as usize]
    }

    /// Left-to-right mapping of contact `index`.
    #[inline]
    #[must_use]
    pub const fn backward(&self, index: u8) -> u8 {
        self.inverse[index as usize]
    }

    /// Returns true when `position` is one of the rotor's turnover positions.
    #[inline]
    #[must_use]
    pub const fn is_notch(&self, position: u8) -> bool {
        self.notches & (1 << position) != 0
    }

    /// Turnover positions as letter offsets.
    #[must_use]
    pub fn notches(&self) -> Vec<u8> {
        (0..ALPHABET_LEN as u8).filter(|&p| self.is_notch(p)).collect()
    }
}

/// Wiring of one reflector: an involution without fixed points.
#[derive(Debug, PartialEq, Eq)]
pub struct ReflectorWiring {
    id: ReflectorId,
    map: [u8; ALPHABET_LEN],
}

impl ReflectorWiring {
    /// Which reflector this is.
    #[must_use]
    pub const fn id(&self) -> ReflectorId {
        self.id
    }

    /// Reflects contact `index`.
    #[inline]
    #[must_use]
    pub const fn reflect(&self, index: u8) -> u8 {
        self.map[index as usize]
    }
}

const fn parse_wiring(letters: &[u8; ALPHABET_LEN]) -> [u8; ALPHABET_LEN] {
    let mut out = [0u8; ALPHABET_LEN];
    let mut i = 0;
    while i < ALPHABET_LEN {
        out[i] = letters[i] - b'A';
        i += 1;
    }
    out
}

const fn invert(forward: &[u8; ALPHABET_LEN]) -> [u8; ALPHABET_LEN] {
    let mut out = [0u8; ALPHABET_LEN];
    let mut i = 0;
    while i < ALPHABET_LEN {
        out[forward[i] as usize] = i as u8;
        i += 1;
    }
    out
}

const fn notch_mask(letters: &[u8]) -> u32 {
    let mut mask = 0u32;
    let mut i = 0;
    while i < letters.len() {
        mask |= 1 << (letters[i] - b'A');
        i += 1;
    }
    mask
}

const fn rotor(id: RotorId, wiring: &[u8; ALPHABET_LEN], notches: &[u8]) -> RotorWiring {
    let forward = parse_wiring(wiring);
    RotorWiring {
        id,
        forward,
        inverse: invert(&forward),
        notches: notch_mask(notches),
    }
}

const fn reflector(id: ReflectorId, wiring: &[u8; ALPHABET_LEN]) -> ReflectorWiring {
    ReflectorWiring {
        id,
        map: parse_wiring(wiring),
    }
}

static ROTORS: [RotorWiring; 10] = [
    rotor(RotorId::I, b"EKMFLGDQVZNTOWYHXUSPAIBRCJ", b"Q"),
    rotor(RotorId::II, b"AJDKSIRUXBLHWTMCQGZNPYFVOE", b"E"),
    rotor(RotorId::III, b"BDFHJLCPRTXVZNYEIWGAKMUSQO", b"V"),
    rotor(RotorId::IV, b"ESOVPZJAYQUIRHXLNFTGKDCMWB", b"J"),
    rotor(RotorId::V, b"VZBRGITYUPSDNHLXAWMJQOFECK", b"Z"),
    rotor(RotorId::VI, b"JPGVOUMFYQBENHZRDKASXLICTW", b"ZM"),
    rotor(RotorId::VII, b"NZJHGRCXMYSWBOUFAIVLPEKQDT", b"ZM"),
    rotor(RotorId::VIII, b"FKQHTLXOCBJSPDZRAMEWNIUYGV", b"ZM"),
    rotor(RotorId::Beta, b"LEYJVCNIXWPBQMDRTAKZGFUHOS", b""),
    rotor(RotorId::Gamma, b"FSOKANUERHMBTIYCWLQPZXVGJD", b""),
];

static REFLECTORS: [ReflectorWiring; 4] = [
    reflector(ReflectorId::B, b"YRUHQSLDPXNGOKMIEBFZCWVJAT"),
    reflector(ReflectorId::C, b"FVPJIAOYEDRZXWGCTKUQSBNMHL"),
    reflector(ReflectorId::BThin, b"ENKQAUYWJICOPBLMDXZVFTHRGS"),
    reflector(ReflectorId::CThin, b"RDOBJNTKVEHMLFCWZAXGYIPSUQ"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotor_wirings_are_bijections() {
        for id in RotorId::ALL {
            let w = id.wiring();
            assert_eq!(w.id(), id);
            for i in 0..ALPHABET_LEN as u8 {
                assert_eq!(w.backward(w.forward(i)), i, "rotor {id} contact {i}");
            }
        }
    }

    #[test]
    fn reflectors_are_fixed_point_free_involutions() {
        for id in ReflectorId::ALL {
            let w = id.wiring();
            assert_eq!(w.id(), id);
            for i in 0..ALPHABET_LEN as u8 {
                let r = w.reflect(i);
                assert_ne!(r, i, "reflector {id} maps {i} to itself");
                assert_eq!(w.reflect(r), i);
            }
        }
    }

    #[test]
    fn notches_match_history() {
        assert_eq!(RotorId::I.wiring().notches(), vec![16]);
        assert_eq!(RotorId::III.wiring().notches(), vec![21]);
        assert_eq!(RotorId::VIII.wiring().notches(), vec![12, 25]);
        assert!(RotorId::Beta.wiring().notches().is_empty());
    }

    #[test]
    fn ids_parse_from_names() {
        assert_eq!("iii".parse::<RotorId>().unwrap(), RotorId::III);
        assert_eq!(" Gamma ".parse::<RotorId>().unwrap(), RotorId::Gamma);
        assert!("IX".parse::<RotorId>().is_err());
        assert_eq!("B thin".parse::<ReflectorId>().unwrap(), ReflectorId::BThin);
        assert_eq!("c-thin".parse::<ReflectorId>().unwrap(), ReflectorId::CThin);
        assert!("A".parse::<ReflectorId>().is_err());
    }

    #[test]
    fn reflector_fit_follows_rotor_count() {
        assert!(ReflectorId::B.fits(3));
        assert!(!ReflectorId::B.fits(4));
        assert!(ReflectorId::CThin.fits(4));
        assert!(!ReflectorId::CThin.fits(3));
        assert!(!ReflectorId::C.fits(0));
    }
}
