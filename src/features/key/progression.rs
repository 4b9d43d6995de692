//! Scale and chord-progression key tracker
//!
//! Follows a track's key by accumulating two kinds of evidence over time:
//!
//! - **Scale likelihood**: how well the in-tune pitch classes fit each of
//!   four minor scale variants (natural, melodic, harmonic, gypsy) at every
//!   transposition
//! - **Progression likelihood**: how likely the strongest chord of the frame
//!   is to occur in each of the 24 keys (tonic, subdominant and dominant
//!   chords count most), plus a "no key" entry fed by chordless frames
//!
//! Both accumulators are leaky integrators with a time constant of 172
//! frames (about 16 s at the default hop). The scale picks the major/relative
//! minor pair, the progression decides between the two.
//!
//! # Example
//!
//! ```
//! use keytrack::features::key::ProgressionTracker;
//!
//! let mut tracker = ProgressionTracker::new(36);
//! let mut frame = vec![0.0; 36];
//! frame[0] = 1.0; // C
//! frame[12] = 1.0; // E
//! frame[21] = 1.0; // G
//! assert_eq!(tracker.process(&frame), 1); // C major
//! ```

use super::templates::{
    CHORD_TO_MAJOR_KEY, CHORD_TO_MINOR_KEY, MAJOR_CHORD, MINOR_CHORD, MINOR_SCALES, NOTE_TO_KEY,
    RELATIVE_MAJOR_OFFSET,
};
use crate::analysis::result::{KEY_COUNT, NO_KEY};
use crate::features::chroma::normalization::{arg_max, max_value, zero_center_to_peak};
use crate::features::chroma::ChromaHistory;

/// Per-frame decay of every accumulator
const DECAY: f64 = 1.0 - 1.0 / 172.0;

/// Normalized floor for an in-tune semitone
const IN_TUNE_FLOOR: f64 = 0.25;

/// Raw energy below which a frame is treated as noise
const NOISE_FLOOR: f64 = 0.01;

/// Scale evidence below `total / SCALE_REJECT_DIVISOR` means no scale
const SCALE_REJECT_DIVISOR: f64 = 6.0;

/// Bias towards the scale implied by the progression, as a fraction of the
/// total evidence
const PROGRESSION_BIAS_DIVISOR: f64 = 60.0;

/// Frames averaged before normalization
const HISTORY_FRAMES: usize = 1;

const SCALE_COUNT: usize = MINOR_SCALES.len() * 12;

/// Strongest chord of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chord {
    Major(usize),
    Minor(usize),
    /// Single note or power chord, no third
    Note(usize),
}

impl Chord {
    fn root(self) -> usize {
        match self {
            Chord::Major(r) | Chord::Minor(r) | Chord::Note(r) => r,
        }
    }

    /// Weight of this chord in the major key on `tonic`
    fn major_key_weight(self, tonic: usize) -> f64 {
        let interval = (self.root() + 12 - tonic) % 12;
        match self {
            Chord::Major(_) => CHORD_TO_MAJOR_KEY[interval],
            Chord::Minor(_) => CHORD_TO_MAJOR_KEY[interval + 12],
            Chord::Note(_) => NOTE_TO_KEY[interval],
        }
    }

    /// Weight of this chord in the minor key on `tonic`
    fn minor_key_weight(self, tonic: usize) -> f64 {
        let interval = (self.root() + 12 - tonic) % 12;
        match self {
            Chord::Major(_) => CHORD_TO_MINOR_KEY[interval],
            Chord::Minor(_) => CHORD_TO_MINOR_KEY[interval + 12],
            // single notes are judged against the relative major
            Chord::Note(_) => NOTE_TO_KEY[(interval + 9) % 12],
        }
    }
}

/// Streaming key tracker driven by scale fit and chord progressions
#[derive(Debug, Clone)]
pub struct ProgressionTracker {
    bins_per_octave: usize,
    bins_per_semitone: usize,
    history: ChromaHistory,
    normalized: Vec<f64>,
    in_tune: [f64; 12],

    /// `[scale * 12 + k]`, `k` = relative major tonic
    scale_likelihood: [f64; SCALE_COUNT],

    /// Running sum of the evidence seen; never positive
    total_evidence: f64,

    /// `[0]` no key, `[1..=12]` major, `[13..=24]` minor
    progression_likelihood: [f64; KEY_COUNT + 1],

    major_correlation: [f64; 12],
    minor_correlation: [f64; 12],
}

impl ProgressionTracker {
    /// Tracker for chroma frames of `bins_per_octave` bins
    ///
    /// `bins_per_octave` is rounded down to a multiple of 12, with a minimum
    /// of 12.
    pub fn new(bins_per_octave: usize) -> Self {
        let bins_per_semitone = (bins_per_octave / 12).max(1);
        let bins_per_octave = bins_per_semitone * 12;

        log::debug!(
            "ProgressionTracker: {} bins per octave, history {} frame(s)",
            bins_per_octave,
            HISTORY_FRAMES
        );

        Self {
            bins_per_octave,
            bins_per_semitone,
            history: ChromaHistory::new(HISTORY_FRAMES, bins_per_octave),
            normalized: vec![0.0; bins_per_octave],
            in_tune: [0.0; 12],
            scale_likelihood: [0.0; SCALE_COUNT],
            total_evidence: 0.0,
            progression_likelihood: [0.0; KEY_COUNT + 1],
            major_correlation: [0.0; 12],
            minor_correlation: [0.0; 12],
        }
    }

    /// Bins per octave the tracker expects
    pub fn bins_per_octave(&self) -> usize {
        self.bins_per_octave
    }

    /// Feed one chroma frame and return the current key index (`0..=24`)
    pub fn process(&mut self, chroma: &[f64]) -> u8 {
        let frame = &chroma[..chroma.len().min(self.bins_per_octave)];
        let max_energy = max_value(frame);

        self.history.push(frame);
        self.history.mean_into(&mut self.normalized);
        zero_center_to_peak(&mut self.normalized, max_energy);

        let max_tuned = self.extract_in_tune(max_energy);
        let scale = self.update_scales(max_tuned);
        let chord = self.update_chords();
        self.update_progression(chord, max_tuned, max_energy);

        let (progression, _) = arg_max(&self.progression_likelihood);
        let key = self.decide(scale, progression);

        log::trace!(
            "chord {:?}, scale {}, progression {}, key {}",
            chord,
            scale,
            progression,
            key
        );
        key
    }

    /// Per-key chord correlations of the last frame
    ///
    /// `[0..12]` major triads on C..B, `[12..24]` minor triads.
    pub fn key_strengths(&self) -> [f64; KEY_COUNT] {
        let mut strengths = [0.0; KEY_COUNT];
        strengths[..12].copy_from_slice(&self.major_correlation);
        strengths[12..].copy_from_slice(&self.minor_correlation);
        strengths
    }

    /// Clear all accumulated evidence
    pub fn reset(&mut self) {
        self.history.clear();
        self.normalized.iter_mut().for_each(|x| *x = 0.0);
        self.in_tune = [0.0; 12];
        self.scale_likelihood = [0.0; SCALE_COUNT];
        self.total_evidence = 0.0;
        self.progression_likelihood = [0.0; KEY_COUNT + 1];
        self.major_correlation = [0.0; 12];
        self.minor_correlation = [0.0; 12];
    }

    /// Keep semitones whose center bin is a clear local peak; returns the
    /// largest kept value scaled back to raw energy
    fn extract_in_tune(&mut self, max_energy: f64) -> f64 {
        let bins = self.bins_per_octave;
        let mut max_tuned = 0.0;

        for (semitone, slot) in self.in_tune.iter_mut().enumerate() {
            let center = semitone * self.bins_per_semitone;
            let value = self.normalized[center];
            let flat = self.normalized[(center + bins - 1) % bins];
            let sharp = self.normalized[(center + 1) % bins];

            if value > IN_TUNE_FLOOR && max_energy > NOISE_FLOOR && value > flat && value > sharp
            {
                *slot = value;
                if value * max_energy > max_tuned {
                    max_tuned = value * max_energy;
                }
            } else {
                *slot = 0.0;
            }
        }

        max_tuned
    }

    /// Update the scale likelihoods; returns `1 + best scale` or 0
    fn update_scales(&mut self, max_tuned: f64) -> usize {
        for k in 0..12 {
            for (s, mask) in MINOR_SCALES.iter().enumerate() {
                let score: f64 = self
                    .in_tune
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| v * mask[(i + 12 + RELATIVE_MAJOR_OFFSET - k) % 12])
                    .sum();
                let entry = &mut self.scale_likelihood[s * 12 + k];
                *entry = *entry * DECAY + score * max_tuned;
            }
            self.total_evidence = self.total_evidence * DECAY - max_tuned;
        }

        // a rejected scale can become likely again within the time constant
        let floor = self.total_evidence / 2.0;
        for entry in self.scale_likelihood.iter_mut() {
            if *entry < floor {
                *entry = floor;
            }
        }

        let (best, value) = arg_max(&self.scale_likelihood);
        if value < self.total_evidence / SCALE_REJECT_DIVISOR {
            0
        } else {
            best + 1
        }
    }

    /// Correlate the in-tune chroma with triads on every root
    fn update_chords(&mut self) -> Option<Chord> {
        let mut best: Option<Chord> = None;
        let mut best_value = 0.0;

        for k in 0..12 {
            let mut major = 0.0;
            let mut minor = 0.0;
            for (i, &v) in self.in_tune.iter().enumerate() {
                let j = (i + 12 - k) % 12;
                major += v * MAJOR_CHORD[j];
                minor += v * MINOR_CHORD[j];
            }
            self.major_correlation[k] = major;
            self.minor_correlation[k] = minor;

            let (candidate, value) = if major > minor {
                (Chord::Major(k), major)
            } else if minor > major {
                (Chord::Minor(k), minor)
            } else {
                (Chord::Note(k), major)
            };
            if value > best_value {
                best_value = value;
                best = Some(candidate);
            }
        }

        best
    }

    fn update_progression(&mut self, chord: Option<Chord>, max_tuned: f64, max_energy: f64) {
        let (no_key, keys) = self.progression_likelihood.split_at_mut(1);

        match chord {
            Some(chord) => {
                let (major, minor) = keys.split_at_mut(12);
                for (tonic, entry) in major.iter_mut().enumerate() {
                    *entry = *entry * DECAY + max_tuned * chord.major_key_weight(tonic);
                }
                for (tonic, entry) in minor.iter_mut().enumerate() {
                    *entry = *entry * DECAY + max_tuned * chord.minor_key_weight(tonic);
                }
                no_key[0] = no_key[0] * DECAY - max_tuned;
            }
            None => {
                for entry in keys.iter_mut() {
                    *entry *= DECAY;
                }
                // silence still counts as at least noise-floor evidence
                no_key[0] = no_key[0] * DECAY + max_energy.max(NOISE_FLOOR);
            }
        }
    }

    fn decide(&self, scale: usize, progression: usize) -> u8 {
        if !(1..=11).contains(&scale) || progression == usize::from(NO_KEY) {
            return NO_KEY;
        }

        // tonic of the major key whose pitch set the progression implies
        let favoured = if progression <= 12 {
            progression - 1
        } else {
            (progression + 2) % 12
        };

        // natural minor entries come first
        let natural = &self.scale_likelihood[..12];
        let mut best = 0;
        let mut best_value = f64::NEG_INFINITY;
        for (k, &likelihood) in natural.iter().enumerate() {
            let mut value = likelihood;
            if k == favoured {
                value -= self.total_evidence / PROGRESSION_BIAS_DIVISOR;
            }
            if value > best_value {
                best_value = value;
                best = k;
            }
        }

        let major_key = best + 1;
        let minor_key = (major_key + 8) % 12 + 13;
        let key = if self.progression_likelihood[major_key] < self.progression_likelihood[minor_key]
        {
            minor_key
        } else {
            major_key
        };
        key as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 36-bin frame with 1.0 on the center bin of each pitch class
    fn triad(pitch_classes: &[usize]) -> Vec<f64> {
        let mut frame = vec![0.0; 36];
        for &p in pitch_classes {
            frame[p * 3] = 1.0;
        }
        frame
    }

    #[test]
    fn test_c_major_triad() {
        let mut tracker = ProgressionTracker::new(36);
        let frame = triad(&[0, 4, 7]);
        for _ in 0..20 {
            assert_eq!(tracker.process(&frame), 1);
        }
    }

    #[test]
    fn test_a_minor_triad() {
        let mut tracker = ProgressionTracker::new(36);
        let frame = triad(&[9, 0, 4]);
        let mut key = 0;
        for _ in 0..20 {
            key = tracker.process(&frame);
        }
        assert_eq!(key, 22);
    }

    #[test]
    fn test_minor_progression_outweighs_relative_major() {
        let mut tracker = ProgressionTracker::new(36);
        let a_minor = triad(&[9, 0, 4]);
        let c_major = triad(&[0, 4, 7]);
        let mut key = 0;
        for _ in 0..30 {
            for _ in 0..3 {
                tracker.process(&a_minor);
            }
            key = tracker.process(&c_major);
        }
        assert_eq!(key, 22);
    }

    #[test]
    fn test_g_major_triad() {
        let mut tracker = ProgressionTracker::new(36);
        let frame = triad(&[7, 11, 2]);
        let mut key = 0;
        for _ in 0..20 {
            key = tracker.process(&frame);
        }
        assert_eq!(key, 8);
    }

    #[test]
    fn test_silence_from_fresh_instance() {
        let mut tracker = ProgressionTracker::new(36);
        let frame = vec![0.0; 36];
        for _ in 0..200 {
            assert_eq!(tracker.process(&frame), 0);
        }
        assert!(tracker.key_strengths().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_noise_after_tonal_content_converges_to_no_key() {
        let mut tracker = ProgressionTracker::new(36);
        let chord = triad(&[0, 4, 7]);
        for _ in 0..50 {
            tracker.process(&chord);
        }

        let noise = vec![0.005; 36];
        let keys: Vec<u8> = (0..3000).map(|_| tracker.process(&noise)).collect();
        assert_eq!(keys[0], 1); // evidence is still fresh
        assert!(keys[2900..].iter().all(|&k| k == 0));
    }

    #[test]
    fn test_digital_silence_after_tonal_content_converges_to_no_key() {
        let mut tracker = ProgressionTracker::new(36);
        let chord = triad(&[0, 4, 7]);
        for _ in 0..50 {
            tracker.process(&chord);
        }

        let silence = vec![0.0; 36];
        let keys: Vec<u8> = (0..2000).map(|_| tracker.process(&silence)).collect();
        assert_eq!(keys[0], 1);
        assert!(keys[1200..].iter().all(|&k| k == NO_KEY));
        assert!(tracker.progression_likelihood[0] > tracker.progression_likelihood[1]);
    }

    #[test]
    fn test_scale_likelihood_stays_above_floor() {
        let mut tracker = ProgressionTracker::new(36);
        let c_major = triad(&[0, 4, 7]);
        for _ in 0..50 {
            tracker.process(&c_major);
        }
        // F# major shares no tone with the C major scale
        tracker.process(&triad(&[6, 10, 1]));

        let floor = tracker.total_evidence / 2.0;
        assert!(floor < 0.0);
        assert!(tracker.scale_likelihood.iter().all(|&v| v >= floor));
        assert!(tracker.scale_likelihood.iter().any(|&v| v == floor));
    }

    #[test]
    fn test_output_in_range() {
        let mut tracker = ProgressionTracker::new(36);
        for i in 0..500 {
            let frame: Vec<f64> = (0..36)
                .map(|b| ((i * 7 + b * 13) % 17) as f64 / 17.0)
                .collect();
            let key = tracker.process(&frame);
            assert!(key <= 24);
            assert!(tracker.key_strengths().iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_deterministic_replay() {
        let frames: Vec<Vec<f64>> = (0..100)
            .map(|i| triad(&[(i / 10) % 12, (i / 10 + 4) % 12, (i / 10 + 7) % 12]))
            .collect();

        let mut a = ProgressionTracker::new(36);
        let mut b = ProgressionTracker::new(36);
        let keys_a: Vec<u8> = frames.iter().map(|f| a.process(f)).collect();
        let keys_b: Vec<u8> = frames.iter().map(|f| b.process(f)).collect();
        assert_eq!(keys_a, keys_b);
    }

    #[test]
    fn test_reset_restores_fresh_state() {
        let frames = [triad(&[9, 0, 4]), triad(&[2, 5, 9]), triad(&[4, 7, 11])];

        let mut tracker = ProgressionTracker::new(36);
        let first: Vec<u8> = frames.iter().cycle().take(60).map(|f| tracker.process(f)).collect();
        tracker.reset();
        assert!(tracker.key_strengths().iter().all(|&v| v == 0.0));
        let second: Vec<u8> = frames.iter().cycle().take(60).map(|f| tracker.process(f)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_key_strengths_follow_chord() {
        let mut tracker = ProgressionTracker::new(36);
        tracker.process(&triad(&[0, 4, 7]));
        let strengths = tracker.key_strengths();
        assert!((strengths[0] - 2.4).abs() < 1e-9); // C major triad
        let (best, _) = arg_max(&strengths);
        assert_eq!(best, 0);
    }

    #[test]
    fn test_twelve_bins_per_octave() {
        let mut tracker = ProgressionTracker::new(12);
        let mut frame = vec![0.0; 12];
        frame[0] = 1.0;
        frame[4] = 1.0;
        frame[7] = 1.0;
        assert_eq!(tracker.process(&frame), 1);
    }
}
