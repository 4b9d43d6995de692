//! Key estimation strategies
//!
//! Estimate the musical key from a stream of chroma frames using:
//! - Scale and chord-progression tracking ([`ProgressionTracker`])
//! - Key-profile correlation with median smoothing ([`ProfileCorrelator`])
//! - Key change tracking over the resulting index stream

pub mod key_changes;
pub mod profile;
pub mod progression;
pub mod strengths;
pub mod templates;

pub use key_changes::{detect_key_changes, KeyChange, KeyChangeTracker};
pub use profile::{ProfileCorrelator, PROFILE_BINS};
pub use progression::ProgressionTracker;
pub use strengths::strengths_in_fifths_order;
pub use templates::KeyTemplates;

use crate::analysis::result::KEY_COUNT;
use crate::config::KeyMethod;
use crate::features::chroma::ChromaNormalization;

/// One of the two key estimation strategies
#[derive(Debug, Clone)]
pub enum KeyStrategy {
    /// Key-profile correlation
    Profile(ProfileCorrelator),
    /// Scale and chord-progression tracking
    Progression(ProgressionTracker),
}

impl KeyStrategy {
    /// Build the strategy for `method`
    ///
    /// * `bins_per_octave` - Length of the chroma frames it will receive
    /// * `window_frames` - Smoothing window of the profile correlator, in
    ///   chroma frames
    pub fn new(method: KeyMethod, bins_per_octave: usize, window_frames: usize) -> Self {
        match method {
            KeyMethod::Profile => KeyStrategy::Profile(ProfileCorrelator::new(window_frames)),
            KeyMethod::Progression => {
                KeyStrategy::Progression(ProgressionTracker::new(bins_per_octave))
            }
        }
    }

    /// Chroma normalization the strategy expects from its front end
    pub fn normalization(method: KeyMethod) -> ChromaNormalization {
        match method {
            KeyMethod::Profile => ChromaNormalization::UnitMax,
            KeyMethod::Progression => ChromaNormalization::None,
        }
    }

    /// Method implemented by this strategy
    pub fn method(&self) -> KeyMethod {
        match self {
            KeyStrategy::Profile(_) => KeyMethod::Profile,
            KeyStrategy::Progression(_) => KeyMethod::Progression,
        }
    }

    /// Feed one chroma frame; returns the key index (`0..=24`)
    pub fn process(&mut self, chroma: &[f64]) -> u8 {
        match self {
            KeyStrategy::Profile(s) => s.process(chroma),
            KeyStrategy::Progression(s) => s.process(chroma),
        }
    }

    /// Per-key strengths of the last frame (`[0..12]` major, `[12..24]` minor)
    pub fn key_strengths(&self) -> [f64; KEY_COUNT] {
        match self {
            KeyStrategy::Profile(s) => s.key_strengths(),
            KeyStrategy::Progression(s) => s.key_strengths(),
        }
    }

    /// Return to the freshly constructed state
    pub fn reset(&mut self) {
        match self {
            KeyStrategy::Profile(s) => s.reset(),
            KeyStrategy::Progression(s) => s.reset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_dispatch() {
        let mut frame = vec![0.0; 36];
        frame[0] = 1.0;
        frame[12] = 1.0;
        frame[21] = 1.0;

        for method in [KeyMethod::Profile, KeyMethod::Progression] {
            let mut strategy = KeyStrategy::new(method, 36, 1);
            assert_eq!(strategy.method(), method);
            assert_eq!(strategy.process(&frame), 1);
            strategy.reset();
            assert!(strategy.key_strengths().iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_normalization_per_method() {
        assert_eq!(
            KeyStrategy::normalization(KeyMethod::Profile),
            ChromaNormalization::UnitMax
        );
        assert_eq!(
            KeyStrategy::normalization(KeyMethod::Progression),
            ChromaNormalization::None
        );
    }
}
