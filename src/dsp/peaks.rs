//! Spectral peak extraction
//!
//! Scans the first half of a transformed buffer for bins that are strict
//! local maxima and stand out from a locally estimated noise floor.
//!
//! # Algorithm
//!
//! For each bin `f` in `[1, N/2)`:
//!
//! 1. Reject if `|X[f]|` is not above epsilon
//! 2. Reject unless `|X[f]|` beats both neighbours by more than epsilon
//! 3. Estimate noise as the mean magnitude over a window of `S` bins
//!    centred on `f`, shifted (never shrunk) to stay inside `[0, N/2)`
//! 4. Accept if `|X[f]| / noise > T`, or if the noise itself is below epsilon
//!
//! Accepted bins are recorded in ascending frequency order until the peak
//! set is full.

use std::ops::Range;

use super::complex::SampleComplex;
use super::params::AnalysisParams;
use crate::error::{DspError, Result};

/// One spectral peak
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Bin centre frequency in Hz
    pub frequency: f32,
    /// `20·log10(2·|X|/N)`
    pub magnitude_db: f32,
    /// Harmonic-correlation score, `None` until scored
    pub confidence: Option<f32>,
}

impl Peak {
    pub fn new(frequency: f32, magnitude_db: f32) -> Self {
        Self {
            frequency,
            magnitude_db,
            confidence: None,
        }
    }
}

/// Fixed-capacity, occupancy-counted collection of peaks
///
/// Slots past [`PeakSet::len`] are empty and are never visited by
/// iteration; [`PeakSet::slots`] exposes them explicitly as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakSet {
    peaks: Vec<Peak>,
    capacity: usize,
}

impl PeakSet {
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut peaks = Vec::new();
        peaks
            .try_reserve_exact(capacity)
            .map_err(|_| DspError::AllocationFailure { requested: capacity })?;
        Ok(Self { peaks, capacity })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.peaks.len() >= self.capacity
    }

    /// Append a peak. Returns false, leaving the set unchanged, when the set
    /// is full or the frequency is not finite.
    pub fn push(&mut self, peak: Peak) -> bool {
        if self.is_full() || !peak.frequency.is_finite() {
            return false;
        }
        self.peaks.push(peak);
        true
    }

    pub fn clear(&mut self) {
        self.peaks.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Peak> {
        self.peaks.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Peak> {
        self.peaks.iter()
    }

    /// Every slot up to capacity, `None` for unused ones
    pub fn slots(&self) -> impl Iterator<Item = Option<&Peak>> + '_ {
        (0..self.capacity).map(move |i| self.peaks.get(i))
    }

    pub(crate) fn set_confidence(&mut self, index: usize, confidence: f32) {
        if let Some(peak) = self.peaks.get_mut(index) {
            peak.confidence = Some(confidence);
        }
    }
}

impl<'a> IntoIterator for &'a PeakSet {
    type Item = &'a Peak;
    type IntoIter = std::slice::Iter<'a, Peak>;

    fn into_iter(self) -> Self::IntoIter {
        self.peaks.iter()
    }
}

/// Bin range of the noise window for `bin` within `[0, half)`
///
/// The window is always `width` bins wide (or the whole range when `half`
/// is smaller); near either edge it is shifted rather than shrunk.
pub fn noise_window(bin: usize, half: usize, width: usize) -> Range<usize> {
    let width = width.min(half);
    let lower = bin.saturating_sub(width / 2).min(half - width);
    lower..lower + width
}

/// Magnitude of a bin in decibels relative to full scale
pub fn magnitude_db(magnitude: f32, len: usize) -> f32 {
    20.0 * (2.0 * magnitude / len as f32).log10()
}

/// Peak extraction with reusable magnitude scratch
#[derive(Debug, Default)]
pub struct PeakExtractor {
    magnitudes: Vec<f32>,
    prefix: Vec<f64>,
}

impl PeakExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract peaks from `spectrum` into `peaks`, replacing its contents
    pub fn extract_into(
        &mut self,
        spectrum: &[SampleComplex],
        sample_rate: u32,
        params: &AnalysisParams,
        peaks: &mut PeakSet,
    ) -> Result<()> {
        let n = spectrum.len();
        if !n.is_power_of_two() {
            return Err(DspError::NotPowerOfTwo(n));
        }
        if sample_rate == 0 {
            return Err(DspError::InvalidParameter("sample rate must be positive".into()));
        }
        peaks.clear();

        let half = n / 2;
        if half < 2 {
            return Ok(());
        }

        self.load(spectrum, half)?;

        let eps = params.epsilon;
        let bin_width = sample_rate as f32 / n as f32;

        for f in 1..half {
            if peaks.is_full() {
                log::trace!("Peak set full at bin {}, skipping the rest", f);
                break;
            }

            let amplitude = self.magnitudes[f];
            if amplitude <= eps {
                continue;
            }
            let is_maximum = amplitude - self.magnitudes[f - 1] > eps
                && amplitude - self.magnitudes[f + 1] > eps;
            if !is_maximum {
                continue;
            }

            let noise = self.noise_level(f, half, params.noise_window);
            if amplitude / noise > params.threshold || noise < eps {
                let peak = Peak::new(f as f32 * bin_width, magnitude_db(amplitude, n));
                log::trace!(
                    "Peak at bin {} ({:.1} Hz, {:.2} dB, noise={:.4})",
                    f,
                    peak.frequency,
                    peak.magnitude_db,
                    noise
                );
                peaks.push(peak);
            }
        }

        Ok(())
    }

    fn load(&mut self, spectrum: &[SampleComplex], half: usize) -> Result<()> {
        // Bins 0..=half: the Nyquist bin is only read as a neighbour
        let needed = half + 1;
        if self.magnitudes.capacity() < needed {
            self.magnitudes
                .try_reserve_exact(needed - self.magnitudes.len())
                .map_err(|_| DspError::AllocationFailure { requested: needed })?;
        }
        if self.prefix.capacity() < needed {
            self.prefix
                .try_reserve_exact(needed - self.prefix.len())
                .map_err(|_| DspError::AllocationFailure { requested: needed })?;
        }

        self.magnitudes.clear();
        self.magnitudes
            .extend(spectrum[..needed].iter().map(|c| c.modulus()));

        // prefix[i] = sum of magnitudes[0..i]
        self.prefix.clear();
        self.prefix.push(0.0);
        let mut running = 0.0f64;
        for &m in &self.magnitudes[..half] {
            running += m as f64;
            self.prefix.push(running);
        }
        Ok(())
    }

    fn noise_level(&self, bin: usize, half: usize, width: usize) -> f32 {
        let window = noise_window(bin, half, width);
        let count = window.len();
        let sum = self.prefix[window.end] - self.prefix[window.start];
        (sum / count as f64) as f32
    }
}

/// Extract peaks from a transformed buffer into a new peak set
pub fn extract_peaks(
    spectrum: &[SampleComplex],
    sample_rate: u32,
    params: &AnalysisParams,
) -> Result<PeakSet> {
    let mut peaks = PeakSet::with_capacity(params.peak_capacity)?;
    PeakExtractor::new().extract_into(spectrum, sample_rate, params, &mut peaks)?;
    Ok(peaks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::condition::condition;
    use crate::dsp::fft::fft;
    use approx::assert_abs_diff_eq;

    fn spectrum_from_magnitudes(mags: &[f32]) -> Vec<SampleComplex> {
        mags.iter().map(|&m| SampleComplex::from_real(m)).collect()
    }

    #[test]
    fn test_oversized_peak_set_is_allocation_failure() {
        assert!(matches!(
            PeakSet::with_capacity(usize::MAX),
            Err(DspError::AllocationFailure { requested: usize::MAX })
        ));
    }

    #[test]
    fn test_noise_window_centred() {
        let w = noise_window(100, 512, 75);
        assert_eq!(w, 63..138);
        assert_eq!(w.len(), 75);
    }

    #[test]
    fn test_noise_window_edges_keep_width() {
        let half = 2048;
        assert_eq!(noise_window(1, half, 75), 0..75);
        assert_eq!(noise_window(30, half, 75), 0..75);
        assert_eq!(noise_window(half - 1, half, 75), (half - 75)..half);
        assert_eq!(noise_window(half - 20, half, 75), (half - 75)..half);
    }

    #[test]
    fn test_noise_window_wider_than_range() {
        assert_eq!(noise_window(3, 8, 75), 0..8);
    }

    #[test]
    fn test_four_tone_signal() {
        // 1 Hz bins so every tone lands exactly on a bin
        let n = 4096;
        let sample_rate = 4096;
        let tones = [(100.0, 128.0), (200.0, 256.0), (300.0, 512.0), (400.0, 120.0)];
        let samples: Vec<f32> = (0..n)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                tones
                    .iter()
                    .map(|&(f, a)| a * (2.0 * std::f64::consts::PI * f * t).sin())
                    .sum::<f64>() as f32
            })
            .collect();

        let mut spectrum = condition(&samples, 16).unwrap();
        fft(&mut spectrum).unwrap();
        let peaks = extract_peaks(&spectrum, sample_rate, &AnalysisParams::default()).unwrap();

        let freqs: Vec<f32> = peaks.iter().map(|p| p.frequency).collect();
        assert_eq!(freqs.len(), 4, "unexpected peaks: {:?}", freqs);
        for (found, &(expected, _)) in freqs.iter().zip(&tones) {
            assert!((found - expected as f32).abs() <= 1.0, "{} vs {}", found, expected);
        }
        assert!(peaks.iter().all(|p| p.confidence.is_none()));

        // Amplitude 512 at 16 bits: 20·log10(512 / 65536)
        let loudest = peaks.iter().find(|p| p.frequency == 300.0).unwrap();
        assert_abs_diff_eq!(loudest.magnitude_db, 20.0 * (512.0f32 / 65536.0).log10(), epsilon = 0.01);
    }

    #[test]
    fn test_skips_dc_and_nyquist() {
        let mut mags = vec![0.0; 64];
        mags[0] = 10.0;
        mags[32] = 10.0;
        let peaks = extract_peaks(&spectrum_from_magnitudes(&mags), 64, &AnalysisParams::default()).unwrap();
        assert!(peaks.is_empty());
    }

    #[test]
    fn test_below_threshold_rejected() {
        let mut mags = vec![1.0; 512];
        mags[100] = 1.5;
        let peaks = extract_peaks(&spectrum_from_magnitudes(&mags), 512, &AnalysisParams::default()).unwrap();
        assert!(peaks.is_empty());
    }

    #[test]
    fn test_neighbour_margin_uses_epsilon() {
        let mut mags = vec![0.0; 512];
        mags[99] = 5.0;
        mags[100] = 5.005;
        let peaks = extract_peaks(&spectrum_from_magnitudes(&mags), 512, &AnalysisParams::default()).unwrap();
        assert!(peaks.is_empty(), "margin below epsilon is not a maximum");
    }

    #[test]
    fn test_quiet_noise_floor_auto_accepts() {
        let mut mags = vec![0.0; 512];
        mags[100] = 0.5;
        let params = AnalysisParams {
            threshold: 1000.0,
            ..Default::default()
        };
        let peaks = extract_peaks(&spectrum_from_magnitudes(&mags), 512, &params).unwrap();
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks.get(0).unwrap().frequency, 100.0);
    }

    #[test]
    fn test_capacity_limits_and_order() {
        let mut mags = vec![0.0; 1024];
        for bin in (4..512).step_by(4) {
            mags[bin] = 50.0;
        }
        let params = AnalysisParams {
            peak_capacity: 5,
            ..Default::default()
        };
        let peaks = extract_peaks(&spectrum_from_magnitudes(&mags), 1024, &params).unwrap();
        assert_eq!(peaks.len(), 5);
        assert!(peaks.is_full());

        let freqs: Vec<f32> = peaks.iter().map(|p| p.frequency).collect();
        assert_eq!(freqs, vec![4.0, 8.0, 12.0, 16.0, 20.0]);

        let slots: Vec<_> = peaks.slots().collect();
        assert_eq!(slots.len(), 5);
        assert!(slots.iter().all(|s| s.is_some()));
    }

    #[test]
    fn test_unused_slots_are_empty() {
        let mut mags = vec![0.0; 256];
        mags[40] = 20.0;
        let peaks = extract_peaks(&spectrum_from_magnitudes(&mags), 256, &AnalysisParams::default()).unwrap();
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks.capacity(), 20);
        assert_eq!(peaks.slots().filter(|s| s.is_none()).count(), 19);
        assert!(peaks.get(1).is_none());
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        let spectrum = vec![SampleComplex::zero(); 100];
        assert_eq!(
            extract_peaks(&spectrum, 100, &AnalysisParams::default()),
            Err(DspError::NotPowerOfTwo(100))
        );
    }

    #[test]
    fn test_peak_set_push_rules() {
        let mut set = PeakSet::with_capacity(1).unwrap();
        assert!(!set.push(Peak::new(f32::NAN, 0.0)));
        assert!(set.push(Peak::new(100.0, -6.0)));
        assert!(!set.push(Peak::new(200.0, -6.0)));
        assert_eq!(set.len(), 1);
    }
}
