//! Constant-Q transform via a sparse spectral kernel
//!
//! # Reference
//!
//! Brown, J. C., & Puckette, M. S. (1992). An efficient algorithm for the
//! calculation of a constant Q transform. *Journal of the Acoustical Society
//! of America*, 92(5), 2698-2701.
//!
//! # Algorithm
//!
//! 1. For every constant-Q bin build a Hamming-windowed complex exponential
//!    of length `Q * fs / f_k`, centered in an FFT-length frame (so each bin
//!    analyses the middle of the frame)
//! 2. FFT it and keep only the entries above the magnitude threshold
//! 3. Per frame: `cq[k] = sum_j X[j] * conj(K[k][j]) / N`

use std::f64::consts::PI;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::ChromaConfig;

/// Longest FFT the kernel may use
const MAX_FFT_LENGTH: usize = 1 << 17;

/// One nonzero kernel entry
#[derive(Debug, Clone, Copy)]
struct KernelEntry {
    fft_bin: usize,
    cq_bin: usize,
    weight: Complex<f64>,
}

/// Sparse constant-Q kernel
#[derive(Debug, Clone)]
pub struct ConstantQ {
    q: f64,
    bins: usize,
    fft_length: usize,
    hop: usize,
    kernel: Vec<KernelEntry>,
}

impl ConstantQ {
    /// Build the kernel for `config`
    pub fn new(config: &ChromaConfig) -> Self {
        let bpo = config.bins_per_octave.max(1) as f64;
        let q = 1.0 / (2f64.powf(1.0 / bpo) - 1.0);
        let octaves = (config.max_frequency / config.min_frequency).log2();
        // guard against 144.00000000000003 rounding up to an extra bin
        let bins = (bpo * octaves - 1e-9).ceil().max(1.0) as usize;
        let longest = (q * config.sample_rate / config.min_frequency)
            .ceil()
            .max(1.0)
            .min(MAX_FFT_LENGTH as f64) as usize;
        let fft_length = longest.next_power_of_two();
        let hop = (fft_length / 8).max(1);

        let kernel = build_kernel(config, q, bins, fft_length);

        log::debug!(
            "ConstantQ: Q={:.2}, {} bins, FFT length {}, hop {}, {} kernel entries",
            q,
            bins,
            fft_length,
            hop,
            kernel.len()
        );

        Self {
            q,
            bins,
            fft_length,
            hop,
            kernel,
        }
    }

    /// Quality factor
    pub fn q(&self) -> f64 {
        self.q
    }

    /// Number of constant-Q bins
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Frame length the transform expects
    pub fn fft_length(&self) -> usize {
        self.fft_length
    }

    /// Frame advance the transform was designed for
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Number of retained kernel entries
    pub fn kernel_len(&self) -> usize {
        self.kernel.len()
    }

    /// Apply the kernel to an FFT frame of `fft_length` bins
    ///
    /// `out` must hold `bins()` values and is overwritten.
    pub fn process(&self, spectrum: &[Complex<f64>], out: &mut [Complex<f64>]) {
        out.iter_mut().for_each(|c| *c = Complex::new(0.0, 0.0));
        for entry in &self.kernel {
            if let (Some(x), Some(acc)) = (spectrum.get(entry.fft_bin), out.get_mut(entry.cq_bin)) {
                *acc += x * entry.weight;
            }
        }
    }
}

fn build_kernel(config: &ChromaConfig, q: f64, bins: usize, fft_length: usize) -> Vec<KernelEntry> {
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(fft_length);
    let mut scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
    let mut frame = vec![Complex::new(0.0, 0.0); fft_length];

    let threshold_sq = config.cq_threshold * config.cq_threshold;
    let bpo = config.bins_per_octave.max(1) as f64;
    let norm = fft_length as f64;
    let mut kernel = Vec::new();

    for k in 0..bins {
        let freq = config.min_frequency * 2f64.powf(k as f64 / bpo);
        let window_length = ((q * config.sample_rate / freq).ceil() as usize).clamp(1, fft_length);
        let origin = fft_length / 2 - window_length / 2;

        frame.iter_mut().for_each(|c| *c = Complex::new(0.0, 0.0));
        for i in 0..window_length {
            let hamming = if window_length > 1 {
                0.54 - 0.46 * (2.0 * PI * i as f64 / (window_length - 1) as f64).cos()
            } else {
                1.0
            };
            let angle = 2.0 * PI * q * i as f64 / window_length as f64;
            frame[origin + i] = Complex::from_polar(hamming / window_length as f64, angle);
        }
        fft.process_with_scratch(&mut frame, &mut scratch);

        for (j, value) in frame.iter().enumerate() {
            if value.norm_sqr() <= threshold_sq {
                continue;
            }
            kernel.push(KernelEntry {
                fft_bin: j,
                cq_bin: k,
                weight: value.conj() / norm,
            });
        }
    }

    kernel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::chroma::ChromaNormalization;

    fn config() -> ChromaConfig {
        ChromaConfig::for_input(44100.0, 440.0, ChromaNormalization::None)
    }

    #[test]
    fn test_dimensions() {
        let cq = ConstantQ::new(&config());
        assert_eq!(cq.bins(), 144); // four octaves at 36 bins
        assert_eq!(cq.fft_length(), 4096);
        assert_eq!(cq.hop(), 512);
        assert!((cq.q() - 51.44).abs() < 0.01);
        assert!(cq.kernel_len() > 0);
    }

    #[test]
    fn test_tone_peaks_at_its_bin() {
        let config = config();
        let cq = ConstantQ::new(&config);
        let n = cq.fft_length();

        // A4 is 21 semitones above C3 -> bin 63
        let freq = 440.0;
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n);
        let mut frame: Vec<Complex<f64>> = (0..n)
            .map(|i| Complex::new((2.0 * PI * freq * i as f64 / config.sample_rate).sin(), 0.0))
            .collect();
        fft.process(&mut frame);

        let mut out = vec![Complex::new(0.0, 0.0); cq.bins()];
        cq.process(&frame, &mut out);
        let peak = out
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().partial_cmp(&b.1.norm()).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 63);
    }

    #[test]
    fn test_degenerate_rate_does_not_panic() {
        let config = ChromaConfig::for_input(1.0, 440.0, ChromaNormalization::None);
        let cq = ConstantQ::new(&config);
        assert!(cq.fft_length() >= 1);
        assert!(cq.hop() >= 1);
    }

    #[test]
    fn test_fft_length_is_capped() {
        // a vanishing tuning reference asks for an unbounded window
        let config = ChromaConfig {
            min_frequency: 1e-300,
            max_frequency: 2e-300,
            bins_per_octave: 12,
            ..ChromaConfig::for_input(44100.0, 440.0, ChromaNormalization::None)
        };
        let cq = ConstantQ::new(&config);
        assert_eq!(cq.fft_length(), MAX_FFT_LENGTH);
        assert_eq!(cq.bins(), 12);
    }
}
