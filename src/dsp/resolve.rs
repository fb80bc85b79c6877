//! Selection of the buffer's fundamental from scored peaks

use super::peaks::PeakSet;
use crate::error::{DspError, Result};

/// Resolved fundamental of one buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pitch {
    /// Frequency in Hz
    pub frequency: f32,
    /// Magnitude of the winning peak in dB
    pub magnitude_db: f32,
    /// Harmonic-correlation score of the winning peak
    pub confidence: f32,
}

/// Pick the peak with the highest confidence
///
/// Unscored peaks and NaN scores are never eligible. Equal scores resolve
/// to the lower frequency.
///
/// # Errors
///
/// [`DspError::NoPitchDetected`] if no peak carries a usable confidence
pub fn resolve_pitch(peaks: &PeakSet) -> Result<Pitch> {
    let mut best: Option<Pitch> = None;

    for peak in peaks {
        let confidence = match peak.confidence {
            Some(c) if !c.is_nan() => c,
            _ => continue,
        };

        let better = match best {
            None => true,
            Some(b) => {
                confidence > b.confidence
                    || (confidence == b.confidence && peak.frequency < b.frequency)
            }
        };
        if better {
            best = Some(Pitch {
                frequency: peak.frequency,
                magnitude_db: peak.magnitude_db,
                confidence,
            });
        }
    }

    best.ok_or(DspError::NoPitchDetected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::peaks::Peak;

    fn scored(freq: f32, db: f32, confidence: Option<f32>) -> Peak {
        Peak {
            frequency: freq,
            magnitude_db: db,
            confidence,
        }
    }

    #[test]
    fn test_empty_set_has_no_pitch() {
        let set = PeakSet::with_capacity(20).unwrap();
        assert_eq!(resolve_pitch(&set), Err(DspError::NoPitchDetected));
    }

    #[test]
    fn test_unscored_peaks_are_ineligible() {
        let mut set = PeakSet::with_capacity(4).unwrap();
        set.push(scored(100.0, -10.0, None));
        set.push(scored(200.0, -10.0, Some(f32::NAN)));
        assert_eq!(resolve_pitch(&set), Err(DspError::NoPitchDetected));
    }

    #[test]
    fn test_highest_confidence_wins() {
        let mut set = PeakSet::with_capacity(4).unwrap();
        set.push(scored(100.0, -12.0, Some(0.2)));
        set.push(scored(200.0, -6.0, Some(0.1)));
        set.push(scored(300.0, -3.0, None));

        let pitch = resolve_pitch(&set).unwrap();
        assert_eq!(pitch.frequency, 100.0);
        assert_eq!(pitch.magnitude_db, -12.0);
        assert_eq!(pitch.confidence, 0.2);
    }

    #[test]
    fn test_tie_breaks_to_lower_frequency() {
        let mut set = PeakSet::with_capacity(4).unwrap();
        set.push(scored(330.0, -10.0, Some(0.5)));
        set.push(scored(220.0, -10.0, Some(0.5)));
        set.push(scored(440.0, -10.0, Some(0.5)));

        assert_eq!(resolve_pitch(&set).unwrap().frequency, 220.0);
    }
}
