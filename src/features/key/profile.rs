//! Key-profile correlation
//!
//! Averages recent chroma frames and correlates the mean against empirical
//! major and minor key profiles at every sub-semitone rotation. The best
//! rotation names the key; a median filter over recent decisions removes
//! short-lived flips.
//!
//! # Reference
//!
//! Krumhansl, C. L. (1990). *Cognitive Foundations of Musical Pitch*.
//! Oxford University Press. (profile correlation method)

use super::templates::KeyTemplates;
use crate::analysis::result::{KEY_COUNT, NO_KEY};
use crate::features::chroma::normalization::{arg_max, zero_center};
use crate::features::chroma::{ChromaHistory, MedianFilter};

/// Bins per octave of the key profiles
pub const PROFILE_BINS: usize = 36;

const BINS_PER_SEMITONE: usize = PROFILE_BINS / 12;

/// Pitch class of a profile bin, rounding to the nearest semitone center
fn pitch_class(bin: usize) -> usize {
    ((bin + BINS_PER_SEMITONE / 2) / BINS_PER_SEMITONE) % 12
}

/// Correlation of `data` with `profile` rotated up by `shift` bins
///
/// Returns 0 when either input has no energy.
fn correlate(data: &[f64], profile: &[f64], shift: usize) -> f64 {
    let len = data.len();
    let mut num = 0.0;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;

    for (i, &x) in data.iter().enumerate() {
        let y = profile[(i + len - shift % len) % len];
        num += x * y;
        sum_x += x * x;
        sum_y += y * y;
    }

    let den = (sum_x * sum_y).sqrt();
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Streaming key estimator based on key-profile correlation
#[derive(Debug, Clone)]
pub struct ProfileCorrelator {
    templates: KeyTemplates,
    history: ChromaHistory,
    median: MedianFilter,
    mean: Vec<f64>,

    /// `[0..36]` major rotations, `[36..72]` minor rotations
    correlations: Vec<f64>,
}

impl ProfileCorrelator {
    /// Correlator averaging over `window_frames` chroma frames
    ///
    /// The median filter spans the same number of decisions. Both are at
    /// least one frame long.
    pub fn new(window_frames: usize) -> Self {
        let window_frames = window_frames.max(1);

        log::debug!(
            "ProfileCorrelator: chroma history {} frames, median filter {} decisions",
            window_frames,
            window_frames
        );

        Self {
            templates: KeyTemplates::new(),
            history: ChromaHistory::new(window_frames, PROFILE_BINS),
            median: MedianFilter::new(window_frames),
            mean: vec![0.0; PROFILE_BINS],
            correlations: vec![0.0; 2 * PROFILE_BINS],
        }
    }

    /// Frames averaged per decision
    pub fn window_frames(&self) -> usize {
        self.history.capacity()
    }

    /// Feed one 36-bin chroma frame and return the smoothed key index
    /// (`0..=24`)
    pub fn process(&mut self, chroma: &[f64]) -> u8 {
        self.history.push(chroma);
        self.history.mean_into(&mut self.mean);
        zero_center(&mut self.mean);

        let (major, minor) = self.correlations.split_at_mut(PROFILE_BINS);
        for shift in 0..PROFILE_BINS {
            major[shift] = correlate(&self.mean, &self.templates.major, shift);
            minor[shift] = correlate(&self.mean, &self.templates.minor, shift);
        }

        let (best, value) = arg_max(&self.correlations);
        let raw = if value > 0.0 {
            let mode = best / PROFILE_BINS;
            let tonic = pitch_class(best % PROFILE_BINS);
            (1 + tonic + 12 * mode) as u8
        } else {
            NO_KEY
        };

        let key = self.median.push(raw);
        log::trace!("profile correlation {:.3}, raw key {}, key {}", value, raw, key);
        key
    }

    /// Strongest correlation per key for the last frame
    ///
    /// `[p]` is the best major correlation over the bins that round to pitch
    /// class `p`; `[12 + p]` the same for minor.
    pub fn key_strengths(&self) -> [f64; KEY_COUNT] {
        let mut strengths = [f64::NEG_INFINITY; KEY_COUNT];
        for (i, &c) in self.correlations.iter().enumerate() {
            let mode = i / PROFILE_BINS;
            let slot = &mut strengths[12 * mode + pitch_class(i % PROFILE_BINS)];
            if c > *slot {
                *slot = c;
            }
        }
        strengths
    }

    /// Clear the chroma history and the median filter
    pub fn reset(&mut self) {
        self.history.clear();
        self.median.clear();
        self.mean.iter_mut().for_each(|x| *x = 0.0);
        self.correlations.iter_mut().for_each(|x| *x = 0.0);
    }
}
