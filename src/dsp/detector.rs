//! Per-buffer pitch detection pipeline
//!
//! condition → transform → extract peaks → score harmonics → resolve.
//!
//! [`PitchDetector`] owns all of the pipeline's working memory so that,
//! after the first buffer of a given size, detection allocates nothing.
//! Nothing but the configuration carries over from one buffer to the next.

use super::complex::SampleComplex;
use super::condition::condition_into;
use super::fft::FftScratch;
use super::harmonics::score_peaks;
use super::params::AnalysisParams;
use super::peaks::{PeakExtractor, PeakSet};
use super::resolve::{resolve_pitch, Pitch};
use crate::error::{DspError, Result};

/// Reusable pitch detector for a fixed sample rate and bit depth
#[derive(Debug)]
pub struct PitchDetector {
    sample_rate: u32,
    bit_depth: u32,
    params: AnalysisParams,
    signal: Vec<SampleComplex>,
    fft: FftScratch,
    extractor: PeakExtractor,
    peaks: PeakSet,
}

impl PitchDetector {
    pub fn new(sample_rate: u32, bit_depth: u32, params: AnalysisParams) -> Result<Self> {
        params.validate()?;
        if sample_rate == 0 {
            return Err(DspError::InvalidParameter("sample rate must be positive".into()));
        }
        // Fails early on an unusable bit depth
        super::condition::full_scale(bit_depth)?;

        let peaks = PeakSet::with_capacity(params.peak_capacity)?;
        Ok(Self {
            sample_rate,
            bit_depth,
            params,
            signal: Vec::new(),
            fft: FftScratch::new(),
            extractor: PeakExtractor::new(),
            peaks,
        })
    }

    /// Detector with working memory already sized for `buffer_size`
    pub fn with_buffer_size(
        sample_rate: u32,
        bit_depth: u32,
        params: AnalysisParams,
        buffer_size: usize,
    ) -> Result<Self> {
        if !buffer_size.is_power_of_two() {
            return Err(DspError::NotPowerOfTwo(buffer_size));
        }
        let mut detector = Self::new(sample_rate, bit_depth, params)?;
        detector.fft = FftScratch::with_capacity(buffer_size)?;
        detector.ensure_signal(buffer_size)?;
        Ok(detector)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bit_depth(&self) -> u32 {
        self.bit_depth
    }

    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    /// Scored peaks of the most recent buffer
    pub fn peaks(&self) -> &PeakSet {
        &self.peaks
    }

    /// Detect the fundamental of one buffer
    ///
    /// # Errors
    ///
    /// * [`DspError::NotPowerOfTwo`] if `samples.len()` is not a power of two
    /// * [`DspError::AllocationFailure`] if working memory cannot grow
    /// * [`DspError::NoPitchDetected`] if no peak survives scoring
    pub fn detect(&mut self, samples: &[f32]) -> Result<Pitch> {
        self.peaks.clear();
        let result = self.run(samples);
        if let Err(ref e) = result {
            if *e != DspError::NoPitchDetected {
                self.peaks.clear();
            }
        }
        result
    }

    fn run(&mut self, samples: &[f32]) -> Result<Pitch> {
        let n = samples.len();
        if !n.is_power_of_two() {
            return Err(DspError::NotPowerOfTwo(n));
        }

        self.ensure_signal(n)?;
        self.signal.resize(n, SampleComplex::zero());
        condition_into(samples, self.bit_depth, &mut self.signal)?;

        self.fft.forward(&mut self.signal)?;
        self.extractor
            .extract_into(&self.signal, self.sample_rate, &self.params, &mut self.peaks)?;
        score_peaks(&mut self.peaks, &self.params);

        let pitch = resolve_pitch(&self.peaks);
        match &pitch {
            Ok(p) => log::debug!(
                "Buffer of {} samples: {} peaks, pitch {:.1} Hz ({:.2} dB, confidence {:.3})",
                n,
                self.peaks.len(),
                p.frequency,
                p.magnitude_db,
                p.confidence
            ),
            Err(_) => log::debug!("Buffer of {} samples: {} peaks, no pitch", n, self.peaks.len()),
        }
        pitch
    }

    fn ensure_signal(&mut self, len: usize) -> Result<()> {
        if self.signal.capacity() < len {
            self.signal
                .try_reserve_exact(len - self.signal.len())
                .map_err(|_| DspError::AllocationFailure { requested: len })?;
        }
        Ok(())
    }
}

/// One-shot detection with default parameters
pub fn detect_pitch(samples: &[f32], sample_rate: u32, bit_depth: u32) -> Result<Pitch> {
    PitchDetector::new(sample_rate, bit_depth, AnalysisParams::default())?.detect(samples)
}
