//! # reharm
//!
//! Buffer-at-a-time pitch detection and chord resynthesis.
//!
//! Each power-of-two buffer of samples is DC-corrected, transformed with a
//! radix-2 FFT, searched for spectral peaks above a local noise floor, and
//! scored by how well each peak's harmonic series lines up with the rest.
//! The best-scoring peak is the buffer's pitch. The buffer can then be
//! re-rendered as a chord that keeps the source's amplitude envelope.
//!
//! ```no_run
//! use reharm::{detect_pitch, reharmonize, Note};
//!
//! let samples = vec![0.0f32; 4096];
//! let pitch = detect_pitch(&samples, 44100, 16)?;
//! let chord: Vec<Note> = ["C4", "E4", "G4"].iter().map(|n| n.parse()).collect::<Result<_, _>>()?;
//! let out = reharmonize(&samples, &chord, pitch.frequency, 44100)?;
//! # Ok::<(), reharm::DspError>(())
//! ```

pub mod audio;
pub mod dsp;
pub mod encode;
pub mod error;
pub mod notes;

pub use dsp::{detect_pitch, reharmonize, AnalysisParams, Peak, PeakSet, Pitch, PitchDetector};
pub use error::DspError;
pub use notes::{Note, VoiceList, MAX_VOICES};
