//! Harmonic correlation scoring
//!
//! Each peak is treated as a candidate fundamental. Its first `H` harmonics
//! are compared against every peak in the set with a Gaussian kernel of
//! width `D`:
//!
//! ```text
//! c(h)       = Σ_peaks exp(-(2·(h - peak) / D)²)
//! confidence = (1/H) · Σ_{k=1..H} c(k · f0)
//! ```
//!
//! The candidate itself takes part in the sum, so every scored peak gets at
//! least `1/H` from its own fundamental. Only occupied slots are visited.

use super::params::AnalysisParams;
use super::peaks::PeakSet;

/// Frequencies `f0 · (1, 2, …, count)`
pub fn harmonic_series(fundamental: f32, count: usize) -> impl Iterator<Item = f32> {
    (1..=count).map(move |k| fundamental * k as f32)
}

/// Gaussian correlation of one frequency against every peak in the set
pub fn correlation(frequency: f32, peaks: &PeakSet, bandwidth_hz: f32) -> f32 {
    let f = frequency as f64;
    let d = bandwidth_hz as f64;
    peaks
        .iter()
        .map(|p| {
            let x = 2.0 * (f - p.frequency as f64) / d;
            (-(x * x)).exp()
        })
        .sum::<f64>() as f32
}

/// Mean correlation of a candidate's harmonic series against the set
pub fn harmonic_confidence(fundamental: f32, peaks: &PeakSet, params: &AnalysisParams) -> f32 {
    let total: f64 = harmonic_series(fundamental, params.harmonics)
        .map(|h| correlation(h, peaks, params.bandwidth_hz) as f64)
        .sum();
    (total / params.harmonics as f64) as f32
}

/// Write a confidence into every occupied slot of `peaks`
pub fn score_peaks(peaks: &mut PeakSet, params: &AnalysisParams) {
    for i in 0..peaks.len() {
        let fundamental = match peaks.get(i) {
            Some(p) => p.frequency,
            None => continue,
        };
        let confidence = harmonic_confidence(fundamental, peaks, params);
        peaks.set_confidence(i, confidence);
    }
    log::trace!("Scored {} peaks", peaks.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::peaks::Peak;
    use approx::assert_abs_diff_eq;

    fn peak_set(freqs: &[f32]) -> PeakSet {
        let mut set = PeakSet::with_capacity(20).unwrap();
        for &f in freqs {
            assert!(set.push(Peak::new(f, -20.0)));
        }
        set
    }

    #[test]
    fn test_harmonic_series() {
        let series: Vec<f32> = harmonic_series(110.0, 4).collect();
        assert_eq!(series, vec![110.0, 220.0, 330.0, 440.0]);
    }

    #[test]
    fn test_correlation_kernel() {
        let set = peak_set(&[100.0]);
        assert_abs_diff_eq!(correlation(100.0, &set, 50.0), 1.0, epsilon = 1e-6);
        // One bandwidth half away: exp(-1)
        assert_abs_diff_eq!(correlation(125.0, &set, 50.0), (-1.0f32).exp(), epsilon = 1e-6);
        assert!(correlation(1000.0, &set, 50.0) < 1e-30);
    }

    #[test]
    fn test_empty_slots_do_not_count() {
        let mut full = PeakSet::with_capacity(20).unwrap();
        full.push(Peak::new(100.0, -20.0));
        let mut small = PeakSet::with_capacity(1).unwrap();
        small.push(Peak::new(100.0, -20.0));

        let params = AnalysisParams::default();
        score_peaks(&mut full, &params);
        score_peaks(&mut small, &params);
        assert_eq!(
            full.get(0).unwrap().confidence,
            small.get(0).unwrap().confidence
        );
        assert!(full.slots().skip(1).all(|s| s.is_none()));
    }

    #[test]
    fn test_harmonic_series_alignment_scores_higher() {
        let params = AnalysisParams::default();

        // Harmonics of 100 Hz land on the other peaks
        let mut aligned = peak_set(&[100.0, 200.0, 300.0, 400.0]);
        // Same candidate, other peaks sit between its harmonics
        let mut offset = peak_set(&[100.0, 150.0, 250.0, 350.0]);

        score_peaks(&mut aligned, &params);
        score_peaks(&mut offset, &params);

        let a = aligned.get(0).unwrap().confidence.unwrap();
        let b = offset.get(0).unwrap().confidence.unwrap();
        assert!(a > b, "aligned {} should beat offset {}", a, b);
        assert_abs_diff_eq!(a, 4.0 / 20.0, epsilon = 1e-3);
    }

    #[test]
    fn test_fundamental_beats_overtones() {
        let params = AnalysisParams::default();
        let mut set = peak_set(&[100.0, 200.0, 300.0, 400.0]);
        score_peaks(&mut set, &params);

        let conf: Vec<f32> = set.iter().map(|p| p.confidence.unwrap()).collect();
        assert!(conf[0] > conf[1]);
        assert!(conf[1] > conf[2]);
        assert!(conf.iter().all(|&c| c >= 1.0 / params.harmonics as f32 - 1e-6));
    }
}
