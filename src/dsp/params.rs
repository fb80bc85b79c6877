//! Tuning constants for peak extraction and harmonic scoring

use serde::Deserialize;

use crate::error::{DspError, Result};

/// Constants shared by every buffer of a run
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisParams {
    /// Maximum number of peaks kept per buffer
    #[serde(default = "default_peak_capacity")]
    pub peak_capacity: usize,
    /// Width in bins of the local noise window
    #[serde(default = "default_noise_window")]
    pub noise_window: usize,
    /// Minimum magnitude-to-noise ratio (linear) for a peak
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Smallest magnitude, and smallest neighbour margin, treated as non-zero
    #[serde(default = "default_epsilon")]
    pub epsilon: f32,
    /// Number of harmonics scored per peak
    #[serde(default = "default_harmonics")]
    pub harmonics: usize,
    /// Matching bandwidth of the harmonic correlation in Hz
    #[serde(default = "default_bandwidth")]
    pub bandwidth_hz: f32,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            peak_capacity: default_peak_capacity(),
            noise_window: default_noise_window(),
            threshold: default_threshold(),
            epsilon: default_epsilon(),
            harmonics: default_harmonics(),
            bandwidth_hz: default_bandwidth(),
        }
    }
}

impl AnalysisParams {
    pub fn validate(&self) -> Result<()> {
        if self.peak_capacity == 0 {
            return Err(invalid("peak_capacity must be at least 1"));
        }
        if self.noise_window == 0 {
            return Err(invalid("noise_window must be at least 1"));
        }
        if self.harmonics == 0 {
            return Err(invalid("harmonics must be at least 1"));
        }
        if !(self.threshold > 0.0) {
            return Err(invalid("threshold must be positive"));
        }
        if !(self.epsilon > 0.0) {
            return Err(invalid("epsilon must be positive"));
        }
        if !(self.bandwidth_hz > 0.0) {
            return Err(invalid("bandwidth_hz must be positive"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> DspError {
    DspError::InvalidParameter(msg.to_string())
}

fn default_peak_capacity() -> usize { 20 }
fn default_noise_window() -> usize { 75 }
fn default_threshold() -> f32 { 3.0 }
fn default_epsilon() -> f32 { 0.01 }
fn default_harmonics() -> usize { 20 }
fn default_bandwidth() -> f32 { 50.0 }
