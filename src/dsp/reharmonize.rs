//! Additive resynthesis of a buffer onto a chord
//!
//! Every output sample is a sum of sines at the target notes' frequencies,
//! weighted by each note's volume and by the instantaneous magnitude of the
//! source sample at the same index:
//!
//! ```text
//! y[j] = |x[j]| · (1/V) · Σ_notes gain(n) · sin(2π · f(n) · j / sample_rate)
//! ```
//!
//! where `V` is the number of sounding notes. The source pitch is replaced
//! outright; only its amplitude contour survives.

use std::f64::consts::TAU;

use crate::error::{DspError, Result};
use crate::notes::Note;

/// Resynthesize `samples` onto `notes` into `out`
///
/// Each output sample is `|x[j]| / V · Σ gain · sin(2π f j / sr)` over the
/// `V` sounding notes. Dividing by `V` keeps a full-volume chord within the
/// source envelope however many notes it has. Empty voice slots (frequency
/// `0.0`) are skipped. With no sounding notes the output is silence.
pub fn reharmonize_into(
    samples: &[f32],
    notes: &[Note],
    pitch: f32,
    sample_rate: u32,
    out: &mut [f32],
) -> Result<()> {
    if out.len() != samples.len() {
        return Err(DspError::LengthMismatch {
            expected: samples.len(),
            actual: out.len(),
        });
    }
    if sample_rate == 0 {
        return Err(DspError::InvalidParameter("sample rate must be positive".into()));
    }
    if !pitch.is_finite() || pitch <= 0.0 {
        return Err(DspError::InvalidParameter(format!(
            "pitch must be a positive frequency, got {}",
            pitch
        )));
    }

    let voices = notes.iter().filter(|n| !n.is_empty()).count();
    if voices == 0 {
        out.fill(0.0);
        return Ok(());
    }

    log::trace!(
        "Reharmonizing {} samples at {:.1} Hz onto {} voices",
        samples.len(),
        pitch,
        voices
    );

    let sr = sample_rate as f64;
    let norm = 1.0 / voices as f64;

    for (j, (dst, &x)) in out.iter_mut().zip(samples).enumerate() {
        let envelope = x.abs() as f64;
        let t = j as f64 / sr;
        let chord: f64 = notes
            .iter()
            .filter(|n| !n.is_empty())
            .map(|n| n.gain() as f64 * (TAU * n.frequency as f64 * t).sin())
            .sum();
        *dst = (envelope * chord * norm) as f32;
    }

    Ok(())
}

/// Resynthesize `samples` onto `notes`, returning a buffer of equal length
pub fn reharmonize(samples: &[f32], notes: &[Note], pitch: f32, sample_rate: u32) -> Result<Vec<f32>> {
    let mut out = vec![0.0; samples.len()];
    reharmonize_into(samples, notes, pitch, sample_rate, &mut out)?;
    Ok(out)
}
