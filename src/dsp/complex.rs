//! Complex arithmetic kernel
//!
//! A plain `(re, im)` pair with value semantics. Every operation takes its
//! operands by value and returns a fresh result, so `z *= z` and friends are
//! always computed from the original operands.
//!
//! Two precisions are used by the pipeline: [`SampleComplex`] for the
//! caller-visible signal and spectrum, and [`WideComplex`] for the
//! transform's working copy and twiddle factors.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use rustfft::num_complex;
use rustfft::num_traits::Float;

use crate::error::{DspError, Result};

/// Complex number over a float component type
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex<T> {
    /// Real part
    pub re: T,
    /// Imaginary part
    pub im: T,
}

/// Sample-precision complex value (signal and spectrum buffers)
pub type SampleComplex = Complex<f32>;

/// Wide-precision complex value (transform internals)
pub type WideComplex = Complex<f64>;

impl<T: Float> Complex<T> {
    pub fn new(re: T, im: T) -> Self {
        Self { re, im }
    }

    pub fn zero() -> Self {
        Self::new(T::zero(), T::zero())
    }

    /// Complex value with zero imaginary part
    pub fn from_real(re: T) -> Self {
        Self::new(re, T::zero())
    }

    /// Unit phasor `exp(i·theta)`
    pub fn cis(theta: T) -> Self {
        Self::new(theta.cos(), theta.sin())
    }

    pub fn conj(self) -> Self {
        Self::new(self.re, -self.im)
    }

    /// Squared modulus `re² + im²`
    pub fn norm_sqr(self) -> T {
        self.re * self.re + self.im * self.im
    }

    /// Modulus `|z|`
    pub fn modulus(self) -> T {
        self.re.hypot(self.im)
    }

    /// Complex exponential `e^re · (cos im + i sin im)`
    pub fn exp(self) -> Self {
        let scale = self.re.exp();
        Self::new(scale * self.im.cos(), scale * self.im.sin())
    }

    /// Divide both components by a real scalar
    pub fn div_real(self, divisor: T) -> Result<Self> {
        if divisor == T::zero() {
            return Err(DspError::DivisionByZero);
        }
        Ok(Self::new(self.re / divisor, self.im / divisor))
    }

    /// `self · conj(rhs) / |rhs|²`, failing on a zero divisor
    pub fn checked_div(self, rhs: Self) -> Result<Self> {
        let denom = rhs.norm_sqr();
        if denom == T::zero() {
            return Err(DspError::DivisionByZero);
        }
        (self * rhs.conj()).div_real(denom)
    }

    /// True if either component is NaN
    pub fn is_nan(self) -> bool {
        self.re.is_nan() || self.im.is_nan()
    }
}

impl SampleComplex {
    /// Promote to the wide type used inside the transform
    pub fn widen(self) -> WideComplex {
        WideComplex::new(self.re as f64, self.im as f64)
    }
}

impl WideComplex {
    /// Demote to sample precision
    pub fn narrow(self) -> SampleComplex {
        SampleComplex::new(self.re as f32, self.im as f32)
    }
}

impl<T: Float> Add for Complex<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl<T: Float> Sub for Complex<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl<T: Float> Mul for Complex<T> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

/// Operator form of division. A zero divisor yields NaN in both components;
/// use [`Complex::checked_div`] to get an error instead.
impl<T: Float> Div for Complex<T> {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        self.checked_div(rhs)
            .unwrap_or_else(|_| Self::new(T::nan(), T::nan()))
    }
}

impl<T: Float> Neg for Complex<T> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.re, -self.im)
    }
}

impl<T: Float> AddAssign for Complex<T> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<T: Float> SubAssign for Complex<T> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<T: Float> MulAssign for Complex<T> {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<T: Float + fmt::Display> fmt::Display for Complex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im.is_sign_negative() {
            write!(f, "{} - {}i", self.re, self.im.abs())
        } else {
            write!(f, "{} + {}i", self.re, self.im)
        }
    }
}

impl<T> From<num_complex::Complex<T>> for Complex<T> {
    fn from(c: num_complex::Complex<T>) -> Self {
        Self { re: c.re, im: c.im }
    }
}

impl<T> From<Complex<T>> for num_complex::Complex<T> {
    fn from(c: Complex<T>) -> Self {
        num_complex::Complex::new(c.re, c.im)
    }
}
