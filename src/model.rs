//! Historical machine models.
//!
//! A model is tagged configuration: it names which rotors, static rotors and
//! reflectors a given Enigma variant shipped with, and how many rotors it
//! holds. Models restrict settings and seed search pools; they never change how
//! a machine enciphers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{ReflectorId, RotorId};
use crate::error::ConfigurationError;
use crate::settings::EnigmaSettings;

/// Enigma variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MachineModel {
    /// Any catalog rotor and reflector, 3 or 4 rotors.
    #[default]
    Unrestricted,
    /// Army and Air Force Enigma I: rotors I-V, reflectors B and C.
    EnigmaI,
    /// Army M3: rotors I-VIII, reflectors B and C.
    M3Army,
    /// Naval M4: rotors I-VIII, Beta or Gamma, thin reflectors.
    M4Naval,
    /// M4 with the first thin reflector only: Beta with B-thin.
    M4R1,
    /// M4 with the second thin reflector: Beta or Gamma with C-thin.
    M4R2,
}

impl MachineModel {
    /// All models.
    pub const ALL: [Self; 6] = [
        Self::Unrestricted,
        Self::EnigmaI,
        Self::M3Army,
        Self::M4Naval,
        Self::M4R1,
        Self::M4R2,
    ];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unrestricted => "Unrestricted",
            Self::EnigmaI => "Enigma I",
            Self::M3Army => "M3 Army",
            Self::M4Naval => "M4 Naval",
            Self::M4R1 => "M4 R1",
            Self::M4R2 => "M4 R2",
        }
    }

    /// Rotor counts the model supports.
    #[must_use]
    pub const fn rotor_counts(self) -> &'static [usize] {
        match self {
            Self::Unrestricted => &[3, 4],
            Self::EnigmaI | Self::M3Army => &[3],
            Self::M4Naval | Self::M4R1 | Self::M4R2 => &[4],
        }
    }

    /// Default rotor count for searches seeded from this model.
    #[must_use]
    pub const fn default_rotor_count(self) -> usize {
        match self {
            Self::Unrestricted | Self::EnigmaI | Self::M3Army => 3,
            Self::M4Naval | Self::M4R1 | Self::M4R2 => 4,
        }
    }

    /// Stepping rotors available to this model.
    #[must_use]
    pub const fn stepping_rotors(self) -> &'static [RotorId] {
        match self {
            Self::EnigmaI => &[RotorId::I, RotorId::II, RotorId::III, RotorId::IV, RotorId::V],
            _ => &RotorId::STEPPING,
        }
    }

    /// Static rotors available to this model (empty for 3-rotor models).
    #[must_use]
    pub const fn static_rotors(self) -> &'static [RotorId] {
        match self {
            Self::EnigmaI | Self::M3Army => &[],
            Self::M4R1 => &[RotorId::Beta],
            Self::Unrestricted | Self::M4Naval | Self::M4R2 => &RotorId::STATIC,
        }
    }

    /// Reflectors available to this model.
    #[must_use]
    pub const fn reflectors(self) -> &'static [ReflectorId] {
        match self {
            Self::Unrestricted => &ReflectorId::ALL,
            Self::EnigmaI | Self::M3Army => &[ReflectorId::B, ReflectorId::C],
            Self::M4Naval => &[ReflectorId::BThin, ReflectorId::CThin],
            Self::M4R1 => &[ReflectorId::BThin],
            Self::M4R2 => &[ReflectorId::CThin],
        }
    }

    /// Checks that `settings` can be expressed on this model.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::ModelRestriction` naming the first
    /// component the model does not carry.
    pub fn validate(self, settings: &EnigmaSettings) -> Result<(), ConfigurationError> {
        let restrict = |reason: String| ConfigurationError::ModelRestriction {
            model: self.name().to_string(),
            reason,
        };
        let count = settings.rotor_count();
        if !self.rotor_counts().contains(&count) {
            return Err(restrict(format!("{count} rotors not supported")));
        }
        for &rotor in settings.rotors() {
            let allowed = if rotor.is_static() {
                self.static_rotors()
            } else {
                self.stepping_rotors()
            };
            if !allowed.contains(&rotor) {
                return Err(restrict(format!("rotor {rotor} not available")));
            }
        }
        if !self.reflectors().contains(&settings.reflector()) {
            return Err(restrict(format!("reflector {} not available", settings.reflector())));
        }
        Ok(())
    }
}

impl fmt::Display for MachineModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
