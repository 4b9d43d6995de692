//! Streaming key detector
//!
//! [`KeyDetector`] ties a chroma front end to one of the key strategies.
//! Callers feed it overlapping blocks of [`block_size`](KeyDetector::block_size)
//! samples, advancing by [`hop_size`](KeyDetector::hop_size), and get the
//! current key estimate back for every block.

use crate::analysis::result::{Key, KEY_COUNT};
use crate::config::{DetectorConfig, KeyMethod};
use crate::error::KeyError;
use crate::features::chroma::{ChromaExtractor, ChromaFrontEnd};
use crate::features::key::{KeyStrategy, PROFILE_BINS};

/// Streaming musical key detector
///
/// # Example
///
/// ```
/// use keytrack::{DetectorConfig, KeyDetector, KeyMethod};
///
/// let config = DetectorConfig::new(KeyMethod::Progression, 44100.0);
/// let mut detector = KeyDetector::new(config)?;
///
/// let block = vec![0.0; detector.block_size()];
/// assert_eq!(detector.process(&block)?, 0); // silence: no key
/// # Ok::<(), keytrack::KeyError>(())
/// ```
pub struct KeyDetector<F: ChromaFrontEnd = ChromaExtractor> {
    config: DetectorConfig,
    front_end: F,
    strategy: KeyStrategy,
    block_size: usize,
    hop_size: usize,
}

impl KeyDetector<ChromaExtractor> {
    /// Detector with the default constant-Q front end
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvalidConfiguration` if the tuning frequency is not
    /// a finite positive number.
    pub fn new(config: DetectorConfig) -> Result<Self, KeyError> {
        config.validate()?;
        let front_end =
            ChromaExtractor::for_detector(&config, KeyStrategy::normalization(config.method));
        Self::with_front_end(config, front_end)
    }
}

impl<F: ChromaFrontEnd> KeyDetector<F> {
    /// Detector reading chroma from a caller-supplied front end
    ///
    /// The front end should already apply the normalization returned by
    /// [`KeyStrategy::normalization`] for `config.method`.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvalidConfiguration` if the configuration is
    /// invalid, if the front end's bins per octave are not a positive
    /// multiple of 12, or if the profile method is used with anything but
    /// 36 bins per octave.
    pub fn with_front_end(config: DetectorConfig, front_end: F) -> Result<Self, KeyError> {
        config.validate()?;

        let bins = front_end.bins_per_octave();
        if bins == 0 || bins % 12 != 0 {
            return Err(KeyError::InvalidConfiguration(format!(
                "bins per octave must be a positive multiple of 12, got {}",
                bins
            )));
        }
        if config.method == KeyMethod::Profile && bins != PROFILE_BINS {
            return Err(KeyError::InvalidConfiguration(format!(
                "profile method needs {} bins per octave, got {}",
                PROFILE_BINS, bins
            )));
        }

        let window_frames = smoothing_frames(config.smoothing_window_length, front_end.frame_rate());
        let strategy = KeyStrategy::new(config.method, bins, window_frames);
        let block_size = front_end.block_size();
        let hop_size = front_end.hop_size();

        log::debug!(
            "KeyDetector: method {}, block {} / hop {} samples at {} Hz, smoothing {} frames",
            config.method,
            block_size,
            hop_size,
            config.sample_rate,
            window_frames
        );

        Ok(Self {
            config,
            front_end,
            strategy,
            block_size,
            hop_size,
        })
    }

    /// Samples expected by every [`process`](Self::process) call
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Samples to advance between successive blocks
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Time between successive key estimates, in seconds
    pub fn hop_seconds(&self) -> f64 {
        if self.config.sample_rate > 0.0 {
            self.hop_size as f64 / self.config.sample_rate
        } else {
            0.0
        }
    }

    /// Analyse the next block and return the current key index
    ///
    /// `0` = no key, `1..=12` = C..B major, `13..=24` = C..B minor.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvalidInput` if `block.len() != block_size()`.
    pub fn process(&mut self, block: &[f64]) -> Result<u8, KeyError> {
        if block.len() != self.block_size {
            return Err(KeyError::InvalidInput(format!(
                "expected a block of {} samples, got {}",
                self.block_size,
                block.len()
            )));
        }

        let bins = self.front_end.bins_per_octave();
        let chroma = self.front_end.process(block);
        debug_assert_eq!(
            chroma.len(),
            bins,
            "chroma frame length differs from bins_per_octave"
        );
        Ok(self.strategy.process(chroma))
    }

    /// [`process`](Self::process), decoded into a [`Key`]
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvalidInput` if `block.len() != block_size()`.
    pub fn process_key(&mut self, block: &[f64]) -> Result<Option<Key>, KeyError> {
        self.process(block).map(Key::from_index)
    }

    /// Per-key strengths from the last block
    ///
    /// `[0..12]` C..B major, `[12..24]` C..B minor. All zeros before the
    /// first block.
    pub fn key_strengths(&self) -> [f64; KEY_COUNT] {
        self.strategy.key_strengths()
    }

    /// Forget all history; the next block is treated like the first
    pub fn reset(&mut self) {
        self.strategy.reset();
        self.front_end.reset();
    }

    /// Configuration the detector was built with
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Estimation method in use
    pub fn method(&self) -> KeyMethod {
        self.strategy.method()
    }

    /// Chroma front end in use
    pub fn front_end(&self) -> &F {
        &self.front_end
    }
}

/// Chroma frames covered by a smoothing window of `seconds`
fn smoothing_frames(seconds: u32, frame_rate: f64) -> usize {
    let frames = (f64::from(seconds) * frame_rate).ceil();
    if frames.is_finite() && frames >= 1.0 {
        frames as usize
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothing_frames() {
        assert_eq!(smoothing_frames(10, 44100.0 / 4096.0), 108);
        assert_eq!(smoothing_frames(0, 10.0), 1);
        assert_eq!(smoothing_frames(5, f64::NAN), 1);
    }

    #[test]
    fn test_default_sizes() {
        let detector = KeyDetector::new(DetectorConfig::default()).unwrap();
        assert_eq!(detector.block_size(), 32768);
        assert_eq!(detector.hop_size(), 4096);
        assert_eq!(detector.method(), KeyMethod::Progression);
        assert!((detector.hop_seconds() - 4096.0 / 44100.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_tuning() {
        for tuning in [0.0, -440.0, f64::NAN, f64::INFINITY] {
            let config = DetectorConfig::default().with_tuning_frequency(tuning);
            assert!(matches!(
                KeyDetector::new(config),
                Err(KeyError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_rejects_wrong_block_length() {
        let mut detector = KeyDetector::new(DetectorConfig::default()).unwrap();
        let short = vec![0.0; detector.block_size() - 1];
        assert!(matches!(
            detector.process(&short),
            Err(KeyError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_degenerate_sample_rate_still_works() {
        let config = DetectorConfig::new(KeyMethod::Progression, 0.0);
        let mut detector = KeyDetector::new(config).unwrap();
        assert!(detector.block_size() >= 1);
        let block = vec![0.0; detector.block_size()];
        assert_eq!(detector.process(&block).unwrap(), 0);
        assert_eq!(detector.hop_seconds(), 0.0);
    }

    #[test]
    fn test_non_finite_sample_rate_still_works() {
        for rate in [f64::INFINITY, f64::NAN, f64::NEG_INFINITY] {
            let config = DetectorConfig::new(KeyMethod::Progression, rate);
            let mut detector = KeyDetector::new(config).unwrap();
            let block = vec![0.0; detector.block_size()];
            assert_eq!(detector.process(&block).unwrap(), 0);
        }
    }

    struct ShortFrames([f64; 12]);

    impl ChromaFrontEnd for ShortFrames {
        fn block_size(&self) -> usize {
            4
        }
        fn hop_size(&self) -> usize {
            4
        }
        fn bins_per_octave(&self) -> usize {
            36
        }
        fn frame_rate(&self) -> f64 {
            1.0
        }
        fn process(&mut self, _block: &[f64]) -> &[f64] {
            &self.0
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "chroma frame length")]
    fn test_mismatched_frame_length_is_caught() {
        let config = DetectorConfig::new(KeyMethod::Progression, 4.0);
        let mut detector = KeyDetector::with_front_end(config, ShortFrames([0.0; 12])).unwrap();
        let _ = detector.process(&[0.0; 4]);
    }

    #[test]
    fn test_strengths_zero_before_first_block() {
        for method in [KeyMethod::Profile, KeyMethod::Progression] {
            let detector = KeyDetector::new(DetectorConfig::new(method, 44100.0)).unwrap();
            assert!(detector.key_strengths().iter().all(|&v| v == 0.0));
        }
    }
}
