use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Integer PCM WAV writer fed one block of channels at a time
pub struct WavEncoder {
    writer: hound::WavWriter<BufWriter<File>>,
    channels: usize,
    min: i64,
    max: i64,
}

impl WavEncoder {
    pub fn new(output_path: &Path, sample_rate: u32, bits_per_sample: u32, channels: usize) -> Result<Self> {
        if !matches!(bits_per_sample, 8 | 16 | 24 | 32) {
            anyhow::bail!("Unsupported WAV bit depth: {}", bits_per_sample);
        }
        if channels == 0 || channels > u16::MAX as usize {
            anyhow::bail!("Unsupported channel count: {}", channels);
        }

        let spec = hound::WavSpec {
            channels: channels as u16,
            sample_rate,
            bits_per_sample: bits_per_sample as u16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = hound::WavWriter::create(output_path, spec)
            .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;

        log::info!(
            "WAV encoder started: {}Hz, {}-bit, {} channels",
            sample_rate,
            bits_per_sample,
            channels
        );

        let half = 1i64 << (bits_per_sample - 1);
        Ok(Self {
            writer,
            channels,
            min: -half,
            max: half - 1,
        })
    }

    /// Interleave and write one block; every channel must hold the same
    /// number of integer-scaled samples
    pub fn write_block(&mut self, channels: &[&[f32]]) -> Result<()> {
        if channels.len() != self.channels {
            anyhow::bail!("Expected {} channels, got {}", self.channels, channels.len());
        }
        let frames = channels.first().map_or(0, |c| c.len());
        if channels.iter().any(|c| c.len() != frames) {
            anyhow::bail!("Channel blocks differ in length");
        }

        for i in 0..frames {
            for channel in channels {
                let value = (channel[i].round() as i64).clamp(self.min, self.max);
                self.writer
                    .write_sample(value as i32)
                    .context("Failed to write sample")?;
            }
        }
        Ok(())
    }

    pub fn finish(self) -> Result<()> {
        self.writer.finalize().context("Failed to finalize WAV file")?;
        log::info!("WAV encoding complete");
        Ok(())
    }
}
