//! The Enigma machine state machine.
//!
//! An [`EnigmaMachine`] owns its rotor positions and is never shared between
//! threads; search workers each build their own. The wiring tables it points
//! at are `'static` and shared freely.

use serde::{Deserialize, Serialize};

use crate::catalog::{ReflectorId, ReflectorWiring, RotorId, RotorWiring};
use crate::error::{ConfigurationError, EnigmaResult, InputError};
use crate::letter::{Letter, ALPHABET_LEN};
use crate::plugboard::Plugboard;
use crate::settings::EnigmaSettings;

const N: u8 = ALPHABET_LEN as u8;

/// State change reported by the mutating machine operations.
///
/// Callers that mirror the machine state (a display, a log) react to the
/// returned value instead of registering observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineEvent {
    /// New settings were installed and the machine was reset to them.
    SettingsReplaced {
        /// Rotor positions after the change, left to right.
        positions: Vec<Letter>,
    },
    /// Rotors were returned to their initial positions.
    PositionsReset {
        /// Rotor positions after the change, left to right.
        positions: Vec<Letter>,
    },
}

impl MachineEvent {
    /// Positions carried by the event.
    #[must_use]
    pub fn positions(&self) -> &[Letter] {
        match self {
            Self::SettingsReplaced { positions } | Self::PositionsReset { positions } => positions,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    wiring: &'static RotorWiring,
    ring: u8,
    position: u8,
}

impl Slot {
    #[inline]
    const fn offset(&self) -> u8 {
        (self.position + N - self.ring) % N
    }

    #[inline]
    fn forward(&self, c: u8) -> u8 {
        let shift = self.offset();
        (self.wiring.forward((c + shift) % N) + N - shift) % N
    }

    #[inline]
    fn backward(&self, c: u8) -> u8 {
        let shift = self.offset();
        (self.wiring.backward((c + shift) % N) + N - shift) % N
    }

    #[inline]
    fn at_notch(&self) -> bool {
        self.wiring.is_notch(self.position)
    }

    #[inline]
    fn advance(&mut self) {
        self.position = (self.position + 1) % N;
    }
}

/// A live Enigma machine.
///
/// Slots are stored left to right. The signal enters at the rightmost rotor.
#[derive(Debug, Clone)]
pub struct EnigmaMachine {
    settings: EnigmaSettings,
    slots: Vec<Slot>,
    reflector: &'static ReflectorWiring,
    plugboard: Plugboard,
}

impl EnigmaMachine {
    /// Builds a machine set to the start positions of `settings`.
    #[must_use]
    pub fn new(settings: EnigmaSettings) -> Self {
        let slots = build_slots(&settings);
        Self {
            reflector: settings.reflector().wiring(),
            plugboard: *settings.plugboard(),
            slots,
            settings,
        }
    }

    /// Settings the machine was built from.
    #[must_use]
    pub const fn settings(&self) -> &EnigmaSettings {
        &self.settings
    }

    /// Current rotor positions, left to right.
    #[must_use]
    pub fn positions(&self) -> Vec<Letter> {
        self.slots
            .iter()
            .filter_map(|s| Letter::from_index(s.position))
            .collect()
    }

    /// Moves the rotors to `positions` without touching the initial settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::LengthMismatch` if `positions` does not
    /// have one entry per rotor.
    pub fn set_positions(&mut self, positions: &[Letter]) -> Result<(), ConfigurationError> {
        if positions.len() != self.slots.len() {
            return Err(ConfigurationError::LengthMismatch {
                field: "positions".to_string(),
                expected: self.slots.len(),
                actual: positions.len(),
            });
        }
        for (slot, p) in self.slots.iter_mut().zip(positions) {
            slot.position = p.index();
        }
        Ok(())
    }

    /// Same as [`set_positions`](Self::set_positions) for raw offsets already
    /// known to be in range.
    pub(crate) fn set_position_indices(&mut self, positions: &[u8]) {
        for (slot, &p) in self.slots.iter_mut().zip(positions) {
            slot.position = p % N;
        }
    }

    /// Restores the start positions of the current settings.
    pub fn reset(&mut self) -> MachineEvent {
        for (slot, p) in self.slots.iter_mut().zip(self.settings.positions()) {
            slot.position = p.index();
        }
        MachineEvent::PositionsReset {
            positions: self.positions(),
        }
    }

    /// Installs new settings and resets to their start positions.
    pub fn set_settings(&mut self, settings: EnigmaSettings) -> MachineEvent {
        *self = Self::new(settings);
        MachineEvent::SettingsReplaced {
            positions: self.positions(),
        }
    }

    /// Validates and installs a complete machine state in one step.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any component is invalid, in which
    /// case the machine is left exactly as it was.
    pub fn set_state(
        &mut self,
        rotors: Vec<RotorId>,
        reflector: ReflectorId,
        rings: Vec<Letter>,
        positions: Vec<Letter>,
        plugboard: Plugboard,
    ) -> EnigmaResult<MachineEvent> {
        let settings = EnigmaSettings::new(rotors, reflector, rings, positions, plugboard)?;
        Ok(self.set_settings(settings))
    }

    /// Steps the rotors `count` times without enciphering anything.
    pub fn advance(&mut self, count: usize) {
        for _ in 0..count {
            self.step();
        }
    }

    /// Enciphers text.
    ///
    /// Letters step the rotors and are enciphered, keeping their case. Any
    /// other non-alphabetic character is copied unchanged and does not step
    /// the rotors.
    ///
    /// # Errors
    ///
    /// Returns `InputError::UnsupportedCharacter` for alphabetic characters
    /// outside A-Z (such as `é`). The whole input is checked first, so on error
    /// the rotors have not moved.
    pub fn encode(&mut self, text: &str) -> EnigmaResult<String> {
        if let Some((index, ch)) = text
            .chars()
            .enumerate()
            .find(|(_, c)| c.is_alphabetic() && !c.is_ascii_alphabetic())
        {
            return Err(InputError::UnsupportedCharacter { ch, index }.into());
        }
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match Letter::from_char(ch) {
                Some(letter) => {
                    let encoded = self.encode_letter(letter);
                    out.push(if ch.is_ascii_lowercase() {
                        encoded.to_lowercase()
                    } else {
                        encoded.to_char()
                    });
                }
                None => out.push(ch),
            }
        }
        Ok(out)
    }

    /// Steps and enciphers one letter.
    pub fn encode_letter(&mut self, letter: Letter) -> Letter {
        let out = self.encode_index(letter.index());
        Letter::from_index(out).unwrap_or(letter)
    }

    /// Enciphers letter offsets into `out`, replacing its contents.
    ///
    /// Offsets are taken modulo 26. `out` is reused, so a warmed-up buffer
    /// makes this allocation free.
    pub fn encode_indices(&mut self, input: &[u8], out: &mut Vec<u8>) {
        out.clear();
        out.reserve(input.len());
        for &c in input {
            out.push(self.encode_index(c % N));
        }
    }

    #[inline]
    fn encode_index(&mut self, c: u8) -> u8 {
        self.step();
        let mut c = self.plugboard.swap(c);
        for slot in self.slots.iter().rev() {
            c = slot.forward(c);
        }
        c = self.reflector.reflect(c);
        for slot in &self.slots {
            c = slot.backward(c);
        }
        self.plugboard.swap(c)
    }

    /// Advances the stepping rotors, including the middle rotor's double step.
    #[inline]
    fn step(&mut self) {
        let n = self.slots.len();
        let (left, middle, right) = (n - 3, n - 2, n - 1);
        if self.slots[middle].at_notch() {
            self.slots[middle].advance();
            self.slots[left].advance();
        } else if self.slots[right].at_notch() {
            self.slots[middle].advance();
        }
        self.slots[right].advance();
    }
}

fn build_slots(settings: &EnigmaSettings) -> Vec<Slot> {
    settings
        .rotors()
        .iter()
        .zip(settings.rings())
        .zip(settings.positions())
        .map(|((rotor, ring), position)| Slot {
            wiring: rotor.wiring(),
            ring: ring.index(),
            position: position.index(),
        })
        .collect()
}
