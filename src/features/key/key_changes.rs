//! Key change tracking
//!
//! Turns the per-block key indices of a detector into a sparse list of
//! changes (modulations), the form hosts usually want to display.
//!
//! # Algorithm
//!
//! 1. Each observed block advances time by one hop
//! 2. The first observation always opens a segment
//! 3. A new segment starts whenever the key index differs from the last one

use serde::{Deserialize, Serialize};

use crate::analysis::result::Key;

/// Key change information
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyChange {
    /// Start of the new segment (in seconds)
    pub timestamp: f64,

    /// Key before the change (`None` = no key, or start of stream)
    pub from_key: Option<Key>,

    /// Key after the change (`None` = no key)
    pub to_key: Option<Key>,

    /// Tonic pitch class differs from the previous key
    pub tonic_changed: bool,

    /// Mode (major/minor) differs from the previous key; never set when the
    /// new key is "no key"
    pub mode_changed: bool,
}

/// Follows a stream of key indices and reports where the key changes
#[derive(Debug, Clone)]
pub struct KeyChangeTracker {
    hop_seconds: f64,
    observed: u64,
    previous: Option<u8>,
}

impl KeyChangeTracker {
    /// Tracker for key indices produced every `hop_seconds`
    pub fn new(hop_seconds: f64) -> Self {
        Self {
            hop_seconds,
            observed: 0,
            previous: None,
        }
    }

    /// Observe the key index of the next block
    ///
    /// Returns a change on the first observation and whenever the index
    /// differs from the previous one.
    pub fn observe(&mut self, key_index: u8) -> Option<KeyChange> {
        let timestamp = self.observed as f64 * self.hop_seconds;
        self.observed += 1;

        let previous = self.previous.replace(key_index);
        if previous == Some(key_index) {
            return None;
        }

        let from_key = previous.and_then(Key::from_index);
        let to_key = Key::from_index(key_index);
        let tonic_changed = from_key.map(|k| k.tonic()) != to_key.map(|k| k.tonic());
        let mode_changed =
            to_key.is_some() && from_key.map(|k| k.is_minor()) != to_key.map(|k| k.is_minor());

        let change = KeyChange {
            timestamp,
            from_key,
            to_key,
            tonic_changed,
            mode_changed,
        };
        log::debug!(
            "Key change at {:.2}s: {:?} -> {:?}",
            change.timestamp,
            change.from_key,
            change.to_key
        );
        Some(change)
    }

    /// Number of key indices observed so far
    pub fn observed(&self) -> u64 {
        self.observed
    }

    /// Forget the stream position and the last key
    pub fn reset(&mut self) {
        self.observed = 0;
        self.previous = None;
    }
}

/// Collect the key changes of a whole sequence of key indices
///
/// # Arguments
///
/// * `key_indices` - Detector output, one index per block
/// * `hop_seconds` - Time between successive blocks
pub fn detect_key_changes(key_indices: &[u8], hop_seconds: f64) -> Vec<KeyChange> {
    let mut tracker = KeyChangeTracker::new(hop_seconds);
    key_indices
        .iter()
        .filter_map(|&k| tracker.observe(k))
        .collect()
}
