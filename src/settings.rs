//! Immutable, validated machine keys.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{ReflectorId, RotorId};
use crate::error::ConfigurationError;
use crate::letter::{render, Letter};
use crate::plugboard::Plugboard;

/// A complete Enigma key: rotor order, reflector, ring settings, start
/// positions and plugboard.
///
/// Slots are listed left to right. On a 4-rotor machine slot 0 holds the
/// static Beta or Gamma rotor. Construction validates every invariant, so a
/// value of this type always describes a buildable machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "SettingsRepr", into = "SettingsRepr")]
pub struct EnigmaSettings {
    rotors: Vec<RotorId>,
    reflector: ReflectorId,
    rings: Vec<Letter>,
    positions: Vec<Letter>,
    plugboard: Plugboard,
}

impl EnigmaSettings {
    /// Validates and assembles settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` when the rotor count is not 3 or 4, a rotor
    /// repeats, a static rotor is missing or misplaced, the reflector does not
    /// fit the rotor count, or rings/positions have the wrong length.
    pub fn new(
        rotors: Vec<RotorId>,
        reflector: ReflectorId,
        rings: Vec<Letter>,
        positions: Vec<Letter>,
        plugboard: Plugboard,
    ) -> Result<Self, ConfigurationError> {
        validate_rotors(&rotors)?;
        let count = rotors.len();
        if !reflector.fits(count) {
            return Err(ConfigurationError::IncompatibleReflector {
                reflector,
                rotor_count: count,
            });
        }
        check_len("rings", count, rings.len())?;
        check_len("positions", count, positions.len())?;
        Ok(Self {
            rotors,
            reflector,
            rings,
            positions,
            plugboard,
        })
    }

    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> EnigmaSettingsBuilder {
        EnigmaSettingsBuilder::default()
    }

    /// Rotor ids, left to right.
    #[must_use]
    pub fn rotors(&self) -> &[RotorId] {
        &self.rotors
    }

    /// Reflector id.
    #[must_use]
    pub const fn reflector(&self) -> ReflectorId {
        self.reflector
    }

    /// Ring settings, left to right.
    #[must_use]
    pub fn rings(&self) -> &[Letter] {
        &self.rings
    }

    /// Start positions, left to right.
    #[must_use]
    pub fn positions(&self) -> &[Letter] {
        &self.positions
    }

    /// Plugboard.
    #[must_use]
    pub const fn plugboard(&self) -> &Plugboard {
        &self.plugboard
    }

    /// Number of rotors (3 or 4).
    #[must_use]
    pub fn rotor_count(&self) -> usize {
        self.rotors.len()
    }

    /// Returns a copy with different start positions.
    pub(crate) fn with_positions(&self, positions: &[Letter]) -> Self {
        debug_assert_eq!(positions.len(), self.rotors.len());
        Self {
            positions: positions.to_vec(),
            ..self.clone()
        }
    }

    /// Returns a copy with one slot's ring and position replaced.
    pub(crate) fn with_ring_and_position(&self, slot: usize, ring: Letter, position: Letter) -> Self {
        let mut next = self.clone();
        next.rings[slot] = ring;
        next.positions[slot] = position;
        next
    }

    /// Returns a copy with one slot's position replaced.
    pub(crate) fn with_position(&self, slot: usize, position: Letter) -> Self {
        let mut next = self.clone();
        next.positions[slot] = position;
        next
    }

    /// Returns a copy with a different plugboard.
    pub(crate) fn with_plugboard(&self, plugboard: Plugboard) -> Self {
        Self {
            plugboard,
            ..self.clone()
        }
    }
}

impl fmt::Display for EnigmaSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rotors: Vec<&str> = self.rotors.iter().map(|r| r.name()).collect();
        write!(
            f,
            "{} | {} | rings {} | positions {}",
            rotors.join("-"),
            self.reflector,
            render(&self.rings),
            render(&self.positions)
        )?;
        if !self.plugboard.is_empty() {
            write!(f, " | plugboard {}", self.plugboard)?;
        }
        Ok(())
    }
}

fn check_len(field: &str, expected: usize, actual: usize) -> Result<(), ConfigurationError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ConfigurationError::LengthMismatch {
            field: field.to_string(),
            expected,
            actual,
        })
    }
}

fn validate_rotors(rotors: &[RotorId]) -> Result<(), ConfigurationError> {
    let count = rotors.len();
    if count != 3 && count != 4 {
        return Err(ConfigurationError::RotorCount { count });
    }
    let mut seen = HashSet::with_capacity(count);
    for &rotor in rotors {
        if !seen.insert(rotor) {
            return Err(ConfigurationError::DuplicateRotor { rotor });
        }
    }
    if count == 4 && !rotors[0].is_static() {
        return Err(ConfigurationError::StaticRotorRequired { found: rotors[0] });
    }
    let first_stepping = count - 3;
    for (slot, &rotor) in rotors.iter().enumerate().skip(first_stepping) {
        if rotor.is_static() {
            return Err(ConfigurationError::StaticRotorMisplaced { rotor, slot });
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
enum LetterInput {
    Text(String),
    Letters(Vec<Letter>),
}

impl LetterInput {
    fn resolve(self, field: &str) -> Result<Vec<Letter>, ConfigurationError> {
        match self {
            Self::Text(text) => Letter::parse_run(field, &text),
            Self::Letters(letters) => Ok(letters),
        }
    }
}

/// Builder for [`EnigmaSettings`].
///
/// Parsing of textual fields is deferred to [`build`](Self::build) so every
/// problem surfaces through a single `Result`. Rings and positions default to
/// all `A`, the plugboard defaults to empty.
#[derive(Debug, Clone, Default)]
pub struct EnigmaSettingsBuilder {
    rotors: Vec<RotorId>,
    reflector: Option<ReflectorId>,
    rings: Option<LetterInput>,
    positions: Option<LetterInput>,
    plugboard: Option<String>,
}

impl EnigmaSettingsBuilder {
    /// Sets the rotor order, left to right.
    #[must_use]
    pub fn rotors(mut self, rotors: impl IntoIterator<Item = RotorId>) -> Self {
        self.rotors = rotors.into_iter().collect();
        self
    }

    /// Sets the reflector.
    #[must_use]
    pub fn reflector(mut self, reflector: ReflectorId) -> Self {
        self.reflector = Some(reflector);
        self
    }

    /// Sets ring settings from letters such as `"AAA"`.
    #[must_use]
    pub fn rings(mut self, rings: impl Into<String>) -> Self {
        self.rings = Some(LetterInput::Text(rings.into()));
        self
    }

    /// Sets ring settings from letters.
    #[must_use]
    pub fn ring_letters(mut self, rings: Vec<Letter>) -> Self {
        self.rings = Some(LetterInput::Letters(rings));
        self
    }

    /// Sets start positions from letters such as `"JKQ"`.
    #[must_use]
    pub fn positions(mut self, positions: impl Into<String>) -> Self {
        self.positions = Some(LetterInput::Text(positions.into()));
        self
    }

    /// Sets start positions from letters.
    #[must_use]
    pub fn position_letters(mut self, positions: Vec<Letter>) -> Self {
        self.positions = Some(LetterInput::Letters(positions));
        self
    }

    /// Sets the plugboard from pair notation such as `"AB CD"`.
    #[must_use]
    pub fn plugboard(mut self, pairs: impl Into<String>) -> Self {
        self.plugboard = Some(pairs.into());
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the reflector is missing or any field
    /// is invalid.
    pub fn build(self) -> Result<EnigmaSettings, ConfigurationError> {
        let reflector = self
            .reflector
            .ok_or(ConfigurationError::MissingField { field: "reflector" })?;
        let count = self.rotors.len();
        let rings = match self.rings {
            Some(input) => input.resolve("rings")?,
            None => vec![Letter::A; count],
        };
        let positions = match self.positions {
            Some(input) => input.resolve("positions")?,
            None => vec![Letter::A; count],
        };
        let plugboard = match self.plugboard {
            Some(text) => Plugboard::parse(&text)?,
            None => Plugboard::empty(),
        };
        EnigmaSettings::new(self.rotors, reflector, rings, positions, plugboard)
    }
}

#[derive(Serialize, Deserialize)]
struct SettingsRepr {
    rotors: Vec<RotorId>,
    reflector: ReflectorId,
    rings: String,
    positions: String,
    #[serde(default)]
    plugboard: Plugboard,
}

impl TryFrom<SettingsRepr> for EnigmaSettings {
    type Error = ConfigurationError;

    fn try_from(repr: SettingsRepr) -> Result<Self, Self::Error> {
        Self::new(
            repr.rotors,
            repr.reflector,
            Letter::parse_run("rings", &repr.rings)?,
            Letter::parse_run("positions", &repr.positions)?,
            repr.plugboard,
        )
    }
}

impl From<EnigmaSettings> for SettingsRepr {
    fn from(settings: EnigmaSettings) -> Self {
        Self {
            rings: render(&settings.rings),
            positions: render(&settings.positions),
            rotors: settings.rotors,
            reflector: settings.reflector,
            plugboard: settings.plugboard,
        }
    }
}
