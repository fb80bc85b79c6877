//! Radix-2 decimation-in-time FFT
//!
//! The transform runs on a wide-precision working copy and only writes the
//! caller's buffer once the whole recursion has finished, so a failed call
//! (bad length, allocation failure) leaves the input untouched.

use std::f64::consts::PI;

use super::complex::{SampleComplex, WideComplex};
use crate::error::{DspError, Result};

/// Reusable working memory for the transform
///
/// Holding one of these across buffers keeps steady-state processing free
/// of allocations once the first buffer of a given size has been seen.
#[derive(Debug, Default)]
pub struct FftScratch {
    working: Vec<WideComplex>,
    spare: Vec<WideComplex>,
}

impl FftScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scratch space pre-sized for buffers of `len` samples
    pub fn with_capacity(len: usize) -> Result<Self> {
        let mut scratch = Self::new();
        reserve(&mut scratch.working, len)?;
        reserve(&mut scratch.spare, len)?;
        Ok(scratch)
    }

    /// Overwrite `buffer` with its discrete Fourier transform
    pub fn forward(&mut self, buffer: &mut [SampleComplex]) -> Result<()> {
        self.load(buffer, false)?;
        let n = buffer.len();
        butterfly(&mut self.working, &mut self.spare, 0, n, 1);

        for (out, value) in buffer.iter_mut().zip(&self.working) {
            *out = value.narrow();
        }
        Ok(())
    }

    /// Overwrite `buffer` with its inverse transform (scaled by `1/N`)
    pub fn inverse(&mut self, buffer: &mut [SampleComplex]) -> Result<()> {
        self.load(buffer, true)?;
        let n = buffer.len();
        butterfly(&mut self.working, &mut self.spare, 0, n, 1);

        let scale = n as f64;
        for (out, value) in buffer.iter_mut().zip(&self.working) {
            *out = value.conj().div_real(scale)?.narrow();
        }
        Ok(())
    }

    fn load(&mut self, buffer: &[SampleComplex], conjugate: bool) -> Result<()> {
        let n = buffer.len();
        if !n.is_power_of_two() {
            return Err(DspError::NotPowerOfTwo(n));
        }

        reserve(&mut self.working, n)?;
        reserve(&mut self.spare, n)?;

        self.working.clear();
        self.working.extend(buffer.iter().map(|c| {
            let wide = c.widen();
            if conjugate {
                wide.conj()
            } else {
                wide
            }
        }));
        self.spare.clear();
        self.spare.extend_from_slice(&self.working);
        Ok(())
    }
}

/// Forward transform with a one-off working copy
pub fn fft(buffer: &mut [SampleComplex]) -> Result<()> {
    FftScratch::new().forward(buffer)
}

/// Inverse transform with a one-off working copy
pub fn ifft(buffer: &mut [SampleComplex]) -> Result<()> {
    FftScratch::new().inverse(buffer)
}

fn reserve(buf: &mut Vec<WideComplex>, len: usize) -> Result<()> {
    if buf.capacity() < len {
        buf.clear();
        buf.try_reserve_exact(len)
            .map_err(|_| DspError::AllocationFailure { requested: len })?;
    }
    Ok(())
}

/// One level of the recursion over the sub-sequence starting at `offset`
/// with stride `step`. Reads from `input`, writes the combined half-size
/// transforms into `output`; the two buffers swap roles at each level.
fn butterfly(
    output: &mut [WideComplex],
    input: &mut [WideComplex],
    offset: usize,
    n: usize,
    step: usize,
) {
    if step >= n {
        return;
    }

    // Even and odd halves
    butterfly(input, output, offset, n, step * 2);
    butterfly(input, output, offset + step, n, step * 2);

    let mut i = 0;
    while i < n {
        let twiddle = WideComplex::new(0.0, -PI * i as f64 / n as f64).exp();
        let even = input[offset + i];
        let odd = twiddle * input[offset + i + step];
        output[offset + i / 2] = even + odd;
        output[offset + (i + n) / 2] = even - odd;
        i += 2 * step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rustfft::FftPlanner;

    fn test_signal(n: usize) -> Vec<SampleComplex> {
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let v = (2.0 * std::f32::consts::PI * 3.0 * t).sin()
                    + 0.5 * (2.0 * std::f32::consts::PI * 7.0 * t).cos()
                    + 0.1 * i as f32 / n as f32;
                SampleComplex::new(v, 0.0)
            })
            .collect()
    }

    #[test]
    fn test_scratch_allocation_failure() {
        let huge = 1usize << (usize::BITS - 2);
        assert_eq!(
            FftScratch::with_capacity(huge).unwrap_err(),
            DspError::AllocationFailure { requested: huge }
        );

        // A failed reservation keeps the scratch usable
        let mut scratch = FftScratch::new();
        assert!(reserve(&mut scratch.working, huge).is_err());
        let mut buffer = test_signal(8);
        let original = buffer.clone();
        scratch.forward(&mut buffer).unwrap();
        scratch.inverse(&mut buffer).unwrap();
        for (a, b) in buffer.iter().zip(&original) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-5);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_impulse_is_flat() {
        let mut buf = vec![SampleComplex::zero(); 16];
        buf[0] = SampleComplex::new(1.0, 0.0);
        fft(&mut buf).unwrap();
        for bin in &buf {
            assert_abs_diff_eq!(bin.modulus(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_constant_goes_to_dc() {
        let mut buf = vec![SampleComplex::new(2.0, 0.0); 8];
        fft(&mut buf).unwrap();
        assert_abs_diff_eq!(buf[0].re, 16.0, epsilon = 1e-5);
        for bin in &buf[1..] {
            assert_abs_diff_eq!(bin.modulus(), 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_matches_rustfft() {
        let n = 256;
        let input = test_signal(n);

        let mut ours = input.clone();
        fft(&mut ours).unwrap();

        let mut reference: Vec<rustfft::num_complex::Complex<f32>> =
            input.iter().map(|&c| c.into()).collect();
        FftPlanner::new().plan_fft_forward(n).process(&mut reference);

        for (a, b) in ours.iter().zip(&reference) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-3);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_inverse_round_trip() {
        for &n in &[1usize, 2, 4, 64, 1024] {
            let input = test_signal(n);
            let mut buf = input.clone();
            let mut scratch = FftScratch::new();
            scratch.forward(&mut buf).unwrap();
            scratch.inverse(&mut buf).unwrap();
            for (a, b) in buf.iter().zip(&input) {
                assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-4);
                assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn test_single_sample_is_identity() {
        let mut buf = vec![SampleComplex::new(0.75, -0.25)];
        fft(&mut buf).unwrap();
        assert_eq!(buf[0], SampleComplex::new(0.75, -0.25));
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        let mut buf = test_signal(12);
        let before = buf.clone();
        assert_eq!(fft(&mut buf), Err(DspError::NotPowerOfTwo(12)));
        assert_eq!(buf, before, "buffer must be untouched on failure");

        let mut empty: Vec<SampleComplex> = Vec::new();
        assert_eq!(ifft(&mut empty), Err(DspError::NotPowerOfTwo(0)));
    }

    #[test]
    fn test_scratch_reuse_across_sizes() {
        let mut scratch = FftScratch::with_capacity(8).unwrap();
        let mut small = test_signal(8);
        let mut large = test_signal(128);
        scratch.forward(&mut small).unwrap();
        scratch.forward(&mut large).unwrap();

        let mut expected = test_signal(128);
        fft(&mut expected).unwrap();
        assert_eq!(large, expected);
    }
}
