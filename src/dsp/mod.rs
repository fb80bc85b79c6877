//! Numeric core: transform, peak picking, harmonic scoring and resynthesis

pub mod complex;
pub mod condition;
pub mod detector;
pub mod fft;
pub mod harmonics;
pub mod params;
pub mod peaks;
pub mod reharmonize;
pub mod resolve;

pub use complex::{Complex, SampleComplex, WideComplex};
pub use detector::{detect_pitch, PitchDetector};
pub use params::AnalysisParams;
pub use peaks::{Peak, PeakSet};
pub use reharmonize::{reharmonize, reharmonize_into};
pub use resolve::Pitch;
