//! Chroma vector extraction
//!
//! [`Chromagram`] turns one decimated frame into a folded constant-Q chroma
//! vector; [`ChromaExtractor`] puts the decimator in front of it and is the
//! default [`ChromaFrontEnd`].

use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::constant_q::ConstantQ;
use super::decimator::Decimator;
use super::normalization::normalize;
use super::{ChromaConfig, ChromaFrontEnd, ChromaNormalization, DECIMATION_FACTOR};
use crate::config::DetectorConfig;

/// Constant-Q chromagram over fixed-length frames
pub struct Chromagram {
    config: ChromaConfig,
    constant_q: ConstantQ,
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    spectrum: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    cq_out: Vec<Complex<f64>>,
    chroma: Vec<f64>,
}

impl Chromagram {
    /// Build the kernel and FFT plan for `config`
    pub fn new(config: ChromaConfig) -> Self {
        let constant_q = ConstantQ::new(&config);
        let n = constant_q.fft_length();

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        let window = (0..n)
            .map(|i| {
                if n > 1 {
                    0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos()
                } else {
                    1.0
                }
            })
            .collect();

        Self {
            spectrum: vec![Complex::new(0.0, 0.0); n],
            cq_out: vec![Complex::new(0.0, 0.0); constant_q.bins()],
            chroma: vec![0.0; config.bins_per_octave],
            config,
            constant_q,
            fft,
            window,
            scratch,
        }
    }

    /// Samples per frame
    pub fn frame_size(&self) -> usize {
        self.constant_q.fft_length()
    }

    /// Frame advance in samples
    pub fn hop_size(&self) -> usize {
        self.constant_q.hop()
    }

    /// Settings the chromagram was built with
    pub fn config(&self) -> &ChromaConfig {
        &self.config
    }

    /// Compute the chroma vector of one frame
    ///
    /// Missing samples are treated as zeros. Only whole octaves of
    /// constant-Q bins are folded in.
    pub fn process(&mut self, frame: &[f64]) -> &[f64] {
        for (i, (dst, &w)) in self.spectrum.iter_mut().zip(&self.window).enumerate() {
            let x = frame.get(i).copied().unwrap_or(0.0);
            *dst = Complex::new(x * w, 0.0);
        }
        self.fft.process_with_scratch(&mut self.spectrum, &mut self.scratch);
        self.constant_q.process(&self.spectrum, &mut self.cq_out);

        let bpo = self.config.bins_per_octave;
        self.chroma.iter_mut().for_each(|x| *x = 0.0);
        if bpo > 0 {
            let whole_octaves = self.cq_out.len() / bpo;
            for octave in self.cq_out.chunks_exact(bpo).take(whole_octaves) {
                for (acc, c) in self.chroma.iter_mut().zip(octave) {
                    *acc += c.norm();
                }
            }
        }

        normalize(&mut self.chroma, self.config.normalization);
        &self.chroma
    }
}

/// Default front end: decimate by 8, then constant-Q chromagram
pub struct ChromaExtractor {
    decimator: Decimator,
    chromagram: Chromagram,
    decimated: Vec<f64>,
}

impl ChromaExtractor {
    /// Front end matching a detector configuration
    pub fn new(
        sample_rate: f64,
        tuning_frequency: f64,
        normalization: ChromaNormalization,
    ) -> Self {
        Self::from_chroma_config(ChromaConfig::for_input(
            sample_rate,
            tuning_frequency,
            normalization,
        ))
    }

    /// Front end for a detector configuration, with `normalization` chosen
    /// by the caller's strategy
    pub fn for_detector(config: &DetectorConfig, normalization: ChromaNormalization) -> Self {
        Self::new(config.sample_rate, config.tuning_frequency, normalization)
    }

    /// Front end from explicit chromagram settings
    pub fn from_chroma_config(config: ChromaConfig) -> Self {
        let chromagram = Chromagram::new(config);
        let frame = chromagram.frame_size();
        let decimator = Decimator::new(frame * DECIMATION_FACTOR, DECIMATION_FACTOR);

        log::debug!(
            "ChromaExtractor: chroma rate {:.1} Hz, frame {} / hop {} (block {} / hop {} at input rate)",
            chromagram.config().sample_rate,
            frame,
            chromagram.hop_size(),
            frame * DECIMATION_FACTOR,
            chromagram.hop_size() * DECIMATION_FACTOR
        );

        Self {
            decimated: vec![0.0; decimator.output_length()],
            decimator,
            chromagram,
        }
    }

    /// Chromagram settings in use
    pub fn chroma_config(&self) -> &ChromaConfig {
        self.chromagram.config()
    }
}

impl ChromaFrontEnd for ChromaExtractor {
    fn block_size(&self) -> usize {
        self.chromagram.frame_size() * DECIMATION_FACTOR
    }

    fn hop_size(&self) -> usize {
        self.chromagram.hop_size() * DECIMATION_FACTOR
    }

    fn bins_per_octave(&self) -> usize {
        self.chromagram.config().bins_per_octave
    }

    fn frame_rate(&self) -> f64 {
        self.chromagram.config().sample_rate / self.chromagram.hop_size() as f64
    }

    fn process(&mut self, block: &[f64]) -> &[f64] {
        self.decimator.process(block, &mut self.decimated);
        self.chromagram.process(&self.decimated)
    }
}
