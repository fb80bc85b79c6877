use anyhow::{Context, Result};
use serde::Deserialize;

use super::decode::AudioData;
use super::report::{BufferReport, RunSummary};
use crate::dsp::{reharmonize_into, AnalysisParams, PitchDetector};
use crate::error::DspError;
use crate::notes::VoiceList;

/// What to write for a buffer with no detectable pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UnpitchedPolicy {
    /// Copy the source samples through unchanged
    #[default]
    Passthrough,
    /// Write silence
    Silence,
}

/// Settings for one run over a decoded file
#[derive(Debug, Clone)]
pub struct Settings {
    /// Samples per analysis buffer (power of two)
    pub buffer_size: usize,
    pub params: AnalysisParams,
    /// Target chord
    pub chord: VoiceList,
    pub unpitched: UnpitchedPolicy,
    /// Render output audio; false only analyzes
    pub resynthesize: bool,
}

/// Result of a run: rendered channels (empty when only analyzing) plus
/// per-buffer reports
#[derive(Debug, Clone)]
pub struct Processed {
    pub channels: Vec<Vec<f32>>,
    pub reports: Vec<BufferReport>,
    pub summary: RunSummary,
}

/// Buffers needed to cover `frames` samples of one channel
pub fn buffer_count(frames: usize, buffer_size: usize) -> usize {
    if buffer_size == 0 {
        return 0;
    }
    frames.div_ceil(buffer_size)
}

/// Summary line for a channel's unpitched buffers, `None` when every
/// buffer had a pitch
pub fn unpitched_warning(channel: usize, unpitched: usize, buffers: usize, policy: UnpitchedPolicy) -> Option<String> {
    if unpitched == 0 {
        return None;
    }
    let action = match policy {
        UnpitchedPolicy::Passthrough => "passed through",
        UnpitchedPolicy::Silence => "silenced",
    };
    Some(format!(
        "Channel {}: {} of {} buffers had no pitch and were {}",
        channel, unpitched, buffers, action
    ))
}

/// Run detection (and optionally resynthesis) over every channel
///
/// Channels are handled one after another and buffers strictly in order.
/// The final short buffer of a channel is zero-padded to full size for
/// analysis only; exactly the source number of samples is written back.
/// `on_buffer` is called with the running count of finished buffers.
pub fn process<F: FnMut(usize)>(audio: &AudioData, settings: &Settings, mut on_buffer: F) -> Result<Processed> {
    let n = settings.buffer_size;
    if !n.is_power_of_two() {
        anyhow::bail!("Buffer size must be a power of two, got {}", n);
    }

    let sr = audio.sample_rate;
    let mut detector = PitchDetector::with_buffer_size(sr, audio.bits_per_sample, settings.params.clone(), n)
        .context("Failed to set up pitch detector")?;

    log::info!(
        "Processing {} channel(s) in buffers of {} samples ({:.1} ms), chord: {}",
        audio.channel_count(),
        n,
        n as f32 * 1000.0 / sr as f32,
        settings
            .chord
            .sounding()
            .map(|v| v.name())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let mut window = vec![0.0f32; n];
    let mut rendered = vec![0.0f32; n];
    let mut channels_out: Vec<Vec<f32>> = Vec::with_capacity(audio.channel_count());
    let mut reports: Vec<BufferReport> = Vec::new();
    let mut finished = 0;

    for (ch, samples) in audio.channels.iter().enumerate() {
        let mut out: Vec<f32> = if settings.resynthesize {
            Vec::with_capacity(samples.len())
        } else {
            Vec::new()
        };
        let mut unpitched = 0;
        let mut buffers = 0;

        for (index, chunk) in samples.chunks(n).enumerate() {
            window[..chunk.len()].copy_from_slice(chunk);
            window[chunk.len()..].fill(0.0);

            let pitch = match detector.detect(&window) {
                Ok(p) => Some(p),
                Err(DspError::NoPitchDetected) => None,
                Err(e) => {
                    return Err(e).with_context(|| format!("Channel {} buffer {}", ch, index));
                }
            };
            buffers += 1;
            if pitch.is_none() {
                unpitched += 1;
            }

            if settings.resynthesize {
                match pitch {
                    Some(p) => {
                        reharmonize_into(&window, settings.chord.as_slice(), p.frequency, sr, &mut rendered)
                            .with_context(|| format!("Channel {} buffer {}", ch, index))?;
                        out.extend_from_slice(&rendered[..chunk.len()]);
                    }
                    None => match settings.unpitched {
                        UnpitchedPolicy::Passthrough => out.extend_from_slice(chunk),
                        UnpitchedPolicy::Silence => out.resize(out.len() + chunk.len(), 0.0),
                    },
                }
            }

            reports.push(BufferReport {
                channel: ch,
                index,
                start: index * n,
                len: chunk.len(),
                pitch,
                peak_count: detector.peaks().len(),
            });

            finished += 1;
            on_buffer(finished);
        }

        if let Some(msg) = unpitched_warning(ch, unpitched, buffers, settings.unpitched) {
            if settings.resynthesize {
                log::warn!("{}", msg);
            } else {
                log::warn!("Channel {}: {} of {} buffers had no pitch", ch, unpitched, buffers);
            }
        }

        channels_out.push(out);
    }

    let summary = RunSummary::from_reports(&reports, sr, audio.channel_count(), audio.frames());
    log::info!(
        "Processed {} buffers, {} pitched{}",
        summary.buffers,
        summary.pitched,
        summary
            .mean_pitch_hz
            .map(|f| format!(", mean pitch {:.1} Hz", f))
            .unwrap_or_default()
    );

    Ok(Processed {
        channels: channels_out,
        reports,
        summary,
    })
}
