//! Anti-alias decimation
//!
//! Low-pass filters a block with a windowed-sinc FIR and keeps every
//! `factor`-th sample. Each block is filtered on its own (zero history
//! before the first sample), so the output depends only on the block.

use std::f64::consts::PI;

/// Taps per unit of decimation factor; 8x decimation gets 255 taps
const TAPS_PER_FACTOR: usize = 32;

/// Cutoff as a fraction of the decimated Nyquist frequency
const CUTOFF_RATIO: f64 = 0.9;

/// FIR decimator for fixed-size blocks
#[derive(Debug, Clone)]
pub struct Decimator {
    input_length: usize,
    factor: usize,
    taps: Vec<f64>,
}

impl Decimator {
    /// Decimator for blocks of `input_length` samples
    pub fn new(input_length: usize, factor: usize) -> Self {
        let factor = factor.max(1);
        let taps = if factor == 1 {
            vec![1.0]
        } else {
            design_lowpass(TAPS_PER_FACTOR * factor - 1, CUTOFF_RATIO * 0.5 / factor as f64)
        };

        log::debug!(
            "Decimator: {} -> {} samples, {} taps",
            input_length,
            input_length / factor,
            taps.len()
        );

        Self {
            input_length,
            factor,
            taps,
        }
    }

    /// Samples consumed per call
    pub fn input_length(&self) -> usize {
        self.input_length
    }

    /// Samples produced per call
    pub fn output_length(&self) -> usize {
        self.input_length / self.factor
    }

    /// Decimation factor
    pub fn factor(&self) -> usize {
        self.factor
    }

    /// Filter `input` and write every `factor`-th sample into `output`
    ///
    /// Missing input samples are treated as zeros; `output` is filled up
    /// to `min(output.len(), output_length())`.
    pub fn process(&self, input: &[f64], output: &mut [f64]) {
        let n_out = output.len().min(self.output_length());
        let delay = self.taps.len() / 2;

        for (m, out) in output.iter_mut().take(n_out).enumerate() {
            // center the filter on the kept sample to avoid a group delay shift
            let center = m * self.factor + delay;
            let mut acc = 0.0;
            for (t, &h) in self.taps.iter().enumerate() {
                if let Some(idx) = center.checked_sub(t) {
                    if let Some(&x) = input.get(idx) {
                        acc += h * x;
                    }
                }
            }
            *out = acc;
        }
    }
}

/// Hamming-windowed sinc low-pass with unity DC gain
///
/// `cutoff` is in cycles per sample (0.5 = Nyquist).
fn design_lowpass(length: usize, cutoff: f64) -> Vec<f64> {
    let length = length.max(1);
    let mid = (length - 1) as f64 / 2.0;
    let mut taps: Vec<f64> = (0..length)
        .map(|i| {
            let x = i as f64 - mid;
            let sinc = if x == 0.0 {
                2.0 * cutoff
            } else {
                (2.0 * PI * cutoff * x).sin() / (PI * x)
            };
            let window = if length > 1 {
                0.54 - 0.46 * (2.0 * PI * i as f64 / (length - 1) as f64).cos()
            } else {
                1.0
            };
            sinc * window
        })
        .collect();

    let sum: f64 = taps.iter().sum();
    if sum.abs() > 1e-12 {
        for t in taps.iter_mut() {
            *t /= sum;
        }
    }
    taps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sample_rate: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate).sin())
            .collect()
    }

    fn rms(x: &[f64]) -> f64 {
        (x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64).sqrt()
    }

    #[test]
    fn test_output_length() {
        let d = Decimator::new(4096, 8);
        assert_eq!(d.output_length(), 512);
        assert_eq!(d.factor(), 8);
        assert_eq!(d.taps.len(), 255);
    }

    #[test]
    fn test_dc_gain_is_unity() {
        let d = Decimator::new(4096, 8);
        let input = vec![1.0; 4096];
        let mut output = vec![0.0; 512];
        d.process(&input, &mut output);
        // away from the block edges the filter sees only ones
        for &y in &output[32..480] {
            assert!((y - 1.0).abs() < 1e-9, "got {}", y);
        }
    }

    #[test]
    fn test_passband_tone_survives() {
        let d = Decimator::new(8192, 8);
        let input = sine(440.0, 44100.0, 8192);
        let mut output = vec![0.0; 1024];
        d.process(&input, &mut output);
        let level = rms(&output[64..960]);
        assert!((level - rms(&input)).abs() < 0.05, "level {}", level);
    }

    #[test]
    fn test_alias_band_is_rejected() {
        let d = Decimator::new(8192, 8);
        // above the decimated Nyquist of 2756 Hz
        let input = sine(8000.0, 44100.0, 8192);
        let mut output = vec![0.0; 1024];
        d.process(&input, &mut output);
        assert!(rms(&output[64..960]) < 0.01);
    }

    #[test]
    fn test_factor_one_is_identity() {
        let d = Decimator::new(4, 1);
        let mut output = vec![0.0; 4];
        d.process(&[1.0, 2.0, 3.0, 4.0], &mut output);
        assert_eq!(output, vec![1.0, 2.0, 3.0, 4.0]);
    }
}
