use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Bit depth assumed when the container does not report one
pub const DEFAULT_BITS_PER_SAMPLE: u32 = 16;

/// Decoded audio, one sample vector per channel
///
/// Samples are scaled to the signed integer range of `bits_per_sample`
/// (e.g. ±32768 for 16-bit), which is the range the pitch detector's
/// conditioning step expects for that bit depth.
#[derive(Debug, Clone)]
pub struct AudioData {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
    pub bits_per_sample: u32,
}

impl AudioData {
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, |c| c.len())
    }

    pub fn duration(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }

    /// Split interleaved integer-scaled samples into channels
    ///
    /// A trailing partial frame is dropped so every channel has the same
    /// length.
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32, bits_per_sample: u32) -> Self {
        let channels = channels.max(1);
        let frames = interleaved.chunks_exact(channels);
        if !frames.remainder().is_empty() {
            log::warn!("Dropping {} samples of a partial trailing frame", frames.remainder().len());
        }
        let mut out = vec![Vec::with_capacity(interleaved.len() / channels); channels];
        for frame in frames {
            for (ch, &s) in frame.iter().enumerate() {
                out[ch].push(s);
            }
        }
        Self {
            channels: out,
            sample_rate,
            bits_per_sample,
        }
    }
}

/// Round a container bit depth up to one the WAV writer supports
pub fn supported_bit_depth(bits: u32) -> u32 {
    match bits {
        0..=8 => 8,
        9..=16 => 16,
        17..=24 => 24,
        _ => 32,
    }
}

pub fn decode_audio(path: &Path) -> Result<AudioData> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio format")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .context("No audio tracks found")?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count());
    let sample_rate = track.codec_params.sample_rate.context("Unknown sample rate")?;
    let bits_per_sample = supported_bit_depth(
        track
            .codec_params
            .bits_per_sample
            .unwrap_or(DEFAULT_BITS_PER_SAMPLE),
    );

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    // Normalized [-1, 1] decoder output back to the integer range
    let scale = (1u64 << (bits_per_sample - 1)) as f32;
    let mut interleaved: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(err)) => {
                log::warn!("Skipping undecodable packet: {}", err);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        interleaved.extend(sample_buf.samples().iter().map(|&s| s * scale));
    }

    let audio = AudioData::from_interleaved(&interleaved, channels, sample_rate, bits_per_sample);

    log::info!(
        "Decoded audio: {} frames x {} channels, {}Hz, {}-bit, {:.1}s",
        audio.frames(),
        audio.channel_count(),
        sample_rate,
        bits_per_sample,
        audio.duration()
    );

    Ok(audio)
}
