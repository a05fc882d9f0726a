//! Output spacing policies.

use serde::{Deserialize, Serialize};

/// How enciphered text is spaced for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpacingMode {
    /// Whitespace removed.
    #[default]
    NoSpaces,
    /// Whitespace removed, then split into groups of this many characters.
    Groups(usize),
    /// Text left as produced.
    Original,
}

impl SpacingMode {
    /// The four choices of the classic front end, in menu order:
    /// no spaces, groups of 4, groups of 5, original spacing.
    #[must_use]
    pub const fn from_menu_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::NoSpaces),
            1 => Some(Self::Groups(4)),
            2 => Some(Self::Groups(5)),
            3 => Some(Self::Original),
            _ => None,
        }
    }
}

/// Applies a spacing policy to `text`.
///
/// `Groups(0)` behaves like `NoSpaces`.
#[must_use]
pub fn format_text(text: &str, mode: SpacingMode) -> String {
    match mode {
        SpacingMode::Original => text.to_string(),
        SpacingMode::NoSpaces | SpacingMode::Groups(0) => {
            text.chars().filter(|c| !c.is_whitespace()).collect()
        }
        SpacingMode::Groups(size) => {
            let mut out = String::with_capacity(text.len() + text.len() / size);
            for (i, ch) in text.chars().filter(|c| !c.is_whitespace()).enumerate() {
                if i > 0 && i % size == 0 {
                    out.push(' ');
                }
                out.push(ch);
            }
            out
        }
    }
}

/// Keeps only A-Z letters, uppercased.
#[must_use]
pub fn letters_only(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
