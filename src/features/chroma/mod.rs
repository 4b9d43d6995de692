//! Chroma front end
//!
//! Turns raw sample blocks into pitch-class energy vectors:
//! - Anti-alias decimation (factor 8)
//! - Constant-Q transform over four octaves from C3
//! - Octave folding into `bins_per_octave` sub-semitone bins
//!
//! The key strategies only see the folded vector, through [`ChromaFrontEnd`].

pub mod constant_q;
pub mod decimator;
pub mod extractor;
pub mod normalization;
pub mod smoothing;

pub use extractor::{ChromaExtractor, Chromagram};
pub use normalization::ChromaNormalization;
pub use smoothing::{ChromaHistory, MedianFilter};

/// Decimation applied before the constant-Q transform
pub const DECIMATION_FACTOR: usize = 8;

/// Sub-semitone resolution of the default front end (3 bins per semitone)
pub const DEFAULT_BINS_PER_OCTAVE: usize = 36;

/// Lowest analysed pitch (MIDI 48 = C3); bin 0 is centered on it
pub const MIN_PITCH: i32 = 48;

/// Exclusive upper analysed pitch (MIDI 96 = C7)
pub const MAX_PITCH: i32 = 96;

/// Spectral kernel magnitude threshold
pub const CQ_THRESHOLD: f64 = 0.0054;

/// Highest input sample rate; faster or non-finite rates are analysed as this
pub const MAX_SAMPLE_RATE: f64 = 768_000.0;

/// Source of chroma frames for the key strategies
///
/// A front end consumes blocks of [`block_size`](Self::block_size) samples
/// at the caller's sample rate, advancing by [`hop_size`](Self::hop_size)
/// between calls, and produces one nonnegative vector of
/// [`bins_per_octave`](Self::bins_per_octave) values per block. Bin
/// `s * bins_per_octave / 12` must be centered on pitch class `s` (0 = C).
pub trait ChromaFrontEnd {
    /// Samples per input block
    fn block_size(&self) -> usize;

    /// Advance between successive blocks, in samples
    fn hop_size(&self) -> usize;

    /// Length of each chroma frame; a multiple of 12
    fn bins_per_octave(&self) -> usize;

    /// Chroma frames produced per second of input
    fn frame_rate(&self) -> f64;

    /// Compute the chroma frame for one block of `block_size` samples
    ///
    /// The frame must hold exactly `bins_per_octave` values; debug builds
    /// of [`KeyDetector`](crate::KeyDetector) assert this.
    fn process(&mut self, block: &[f64]) -> &[f64];

    /// Drop any state carried between blocks
    fn reset(&mut self) {}
}

/// Frequency in Hz of a MIDI pitch for a given concert-A tuning
///
/// # Example
///
/// ```
/// use keytrack::features::chroma::frequency_for_pitch;
///
/// assert!((frequency_for_pitch(69, 440.0) - 440.0).abs() < 1e-9);
/// assert!((frequency_for_pitch(60, 440.0) - 261.6256).abs() < 1e-3);
/// ```
pub fn frequency_for_pitch(midi_pitch: i32, tuning_frequency: f64) -> f64 {
    tuning_frequency * 2f64.powf(f64::from(midi_pitch - 69) / 12.0)
}

/// Parameters of the constant-Q chromagram
#[derive(Debug, Clone, PartialEq)]
pub struct ChromaConfig {
    /// Sample rate seen by the chromagram, after decimation (Hz, 1..=96000)
    pub sample_rate: f64,

    /// Lowest constant-Q bin center (Hz)
    pub min_frequency: f64,

    /// Exclusive upper frequency (Hz)
    pub max_frequency: f64,

    /// Bins per octave (default: 36)
    pub bins_per_octave: usize,

    /// Spectral kernel threshold (default: 0.0054)
    pub cq_threshold: f64,

    /// Normalization applied to each folded frame
    pub normalization: ChromaNormalization,
}

impl ChromaConfig {
    /// Chromagram settings for an input at `sample_rate` tuned to
    /// `tuning_frequency`
    ///
    /// The decimated rate is clamped to `1..=MAX_SAMPLE_RATE / 8` Hz, so
    /// pathological sample rates degrade accuracy instead of failing.
    pub fn for_input(
        sample_rate: f64,
        tuning_frequency: f64,
        normalization: ChromaNormalization,
    ) -> Self {
        let mut decimated = sample_rate / DECIMATION_FACTOR as f64;
        if decimated.is_nan() || decimated < 1.0 {
            log::warn!(
                "Sample rate {} too low for decimation by {}, clamping chroma rate to 1 Hz",
                sample_rate,
                DECIMATION_FACTOR
            );
            decimated = 1.0;
        } else if decimated > MAX_SAMPLE_RATE / DECIMATION_FACTOR as f64 {
            log::warn!(
                "Sample rate {} above {} Hz, clamping",
                sample_rate,
                MAX_SAMPLE_RATE
            );
            decimated = MAX_SAMPLE_RATE / DECIMATION_FACTOR as f64;
        }

        Self {
            sample_rate: decimated,
            min_frequency: frequency_for_pitch(MIN_PITCH, tuning_frequency),
            max_frequency: frequency_for_pitch(MAX_PITCH, tuning_frequency),
            bins_per_octave: DEFAULT_BINS_PER_OCTAVE,
            cq_threshold: CQ_THRESHOLD,
            normalization,
        }
    }
}
