//! Key result types

use serde::{Deserialize, Serialize};

/// Number of distinct keys (12 major + 12 minor)
pub const KEY_COUNT: usize = 24;

/// Key index reported when no key is detected
pub const NO_KEY: u8 = 0;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Musical key
///
/// Detectors report keys as an index in `0..=24`: `0` means no key,
/// `1..=12` are C major to B major and `13..=24` are C minor to B minor.
/// Use [`Key::from_index`] and [`Key::index`] to move between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Major key (0 = C, 1 = C#, ..., 11 = B)
    Major(u32),
    /// Minor key (0 = C, 1 = C#, ..., 11 = B)
    Minor(u32),
}

impl Key {
    /// Decode a detector key index
    ///
    /// Returns `None` for `0` (no key) and for anything above `24`.
    ///
    /// # Example
    ///
    /// ```
    /// use keytrack::Key;
    ///
    /// assert_eq!(Key::from_index(0), None);
    /// assert_eq!(Key::from_index(1), Some(Key::Major(0)));   // C
    /// assert_eq!(Key::from_index(22), Some(Key::Minor(9)));  // Am
    /// assert_eq!(Key::from_index(25), None);
    /// ```
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1..=12 => Some(Key::Major(u32::from(index) - 1)),
            13..=24 => Some(Key::Minor(u32::from(index) - 13)),
            _ => None,
        }
    }

    /// Detector key index (`1..=24`)
    pub fn index(&self) -> u8 {
        match self {
            Key::Major(i) => (*i % 12) as u8 + 1,
            Key::Minor(i) => (*i % 12) as u8 + 13,
        }
    }

    /// Tonic pitch class (0 = C, ..., 11 = B)
    pub fn tonic(&self) -> u32 {
        match self {
            Key::Major(i) | Key::Minor(i) => *i % 12,
        }
    }

    /// True for minor keys
    pub fn is_minor(&self) -> bool {
        matches!(self, Key::Minor(_))
    }

    /// Relative key sharing the same pitch set (C major <-> A minor)
    pub fn relative(&self) -> Key {
        match self {
            Key::Major(i) => Key::Minor((*i + 9) % 12),
            Key::Minor(i) => Key::Major((*i + 3) % 12),
        }
    }

    /// Short name, sharps only, `m` suffix for minor
    ///
    /// ```
    /// use keytrack::Key;
    ///
    /// assert_eq!(Key::from_index(4).map(|k| k.name()), Some("D#".to_string()));
    /// assert_eq!(Key::from_index(22).map(|k| k.name()), Some("Am".to_string()));
    /// ```
    pub fn name(&self) -> String {
        match self {
            Key::Major(i) => NOTE_NAMES[*i as usize % 12].to_string(),
            Key::Minor(i) => format!("{}m", NOTE_NAMES[*i as usize % 12]),
        }
    }

    /// Long form with the mode spelled out (e.g., "C major", "A minor")
    pub fn label(&self) -> String {
        let tonic = NOTE_NAMES[self.tonic() as usize];
        if self.is_minor() {
            format!("{} minor", tonic)
        } else {
            format!("{} major", tonic)
        }
    }
}
