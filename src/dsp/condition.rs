//! Signal conditioning ahead of the transform
//!
//! Removes the DC offset and rescales by the bit-depth full scale so that
//! conditioned samples sit roughly in `[-0.5, 0.5]`.

use super::complex::SampleComplex;
use crate::error::{DspError, Result};

/// Arithmetic mean of a buffer (0.0 for an empty buffer)
pub fn mean(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| s as f64).sum();
    (sum / samples.len() as f64) as f32
}

/// Peak-to-peak span of a signed integer sample of `bit_depth` bits
///
/// Floating-point input already normalized to `[-1, 1]` uses a bit depth
/// of 1.
pub fn full_scale(bit_depth: u32) -> Result<f32> {
    if bit_depth == 0 || bit_depth > 32 {
        return Err(DspError::InvalidParameter(format!(
            "bit depth must be in 1..=32, got {}",
            bit_depth
        )));
    }
    Ok((1u64 << bit_depth) as f32)
}

/// Condition `samples` into the complex buffer `out`
pub fn condition_into(samples: &[f32], bit_depth: u32, out: &mut [SampleComplex]) -> Result<()> {
    if out.len() != samples.len() {
        return Err(DspError::LengthMismatch {
            expected: samples.len(),
            actual: out.len(),
        });
    }

    let scale = full_scale(bit_depth)?;
    let offset = mean(samples);

    for (dst, &s) in out.iter_mut().zip(samples) {
        *dst = SampleComplex::from_real((s - offset) / scale);
    }
    Ok(())
}

/// Condition `samples` into a freshly allocated complex buffer
pub fn condition(samples: &[f32], bit_depth: u32) -> Result<Vec<SampleComplex>> {
    let mut out = vec![SampleComplex::zero(); samples.len()];
    condition_into(samples, bit_depth, &mut out)?;
    Ok(out)
}
