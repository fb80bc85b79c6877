use crate::dsp::Pitch;

/// Outcome of one analysis buffer
#[derive(Clone, Debug, PartialEq)]
pub struct BufferReport {
    /// Channel the buffer came from
    pub channel: usize,
    /// Buffer index within the channel
    pub index: usize,
    /// First sample of the buffer within the channel
    pub start: usize,
    /// Number of source samples (short for the final buffer)
    pub len: usize,
    /// Detected fundamental, `None` when unpitched
    pub pitch: Option<Pitch>,
    /// Peaks found in the buffer
    pub peak_count: usize,
}

impl BufferReport {
    /// Start time in seconds
    pub fn time(&self, sample_rate: u32) -> f32 {
        self.start as f32 / sample_rate as f32
    }

    /// One line of the analysis table
    pub fn format_line(&self, sample_rate: u32) -> String {
        match self.pitch {
            Some(p) => format!(
                "ch{} #{:<5} {:>8.3}s  {:>8.1} Hz  {:>7.2} dB  conf {:.3}  ({} peaks)",
                self.channel,
                self.index,
                self.time(sample_rate),
                p.frequency,
                p.magnitude_db,
                p.confidence,
                self.peak_count
            ),
            None => format!(
                "ch{} #{:<5} {:>8.3}s  {:>11}  ({} peaks)",
                self.channel,
                self.index,
                self.time(sample_rate),
                "unpitched",
                self.peak_count
            ),
        }
    }
}

/// Whole-run statistics
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub sample_rate: u32,
    pub channels: usize,
    pub frames: usize,
    pub duration: f32,
    pub buffers: usize,
    pub pitched: usize,
    /// Mean detected frequency over pitched buffers
    pub mean_pitch_hz: Option<f32>,
    /// Mean confidence over pitched buffers
    pub mean_confidence: Option<f32>,
}

impl RunSummary {
    pub fn from_reports(reports: &[BufferReport], sample_rate: u32, channels: usize, frames: usize) -> Self {
        let pitches: Vec<Pitch> = reports.iter().filter_map(|r| r.pitch).collect();
        let mean = |f: fn(&Pitch) -> f32| {
            if pitches.is_empty() {
                None
            } else {
                Some(pitches.iter().map(f).sum::<f32>() / pitches.len() as f32)
            }
        };

        Self {
            sample_rate,
            channels,
            frames,
            duration: frames as f32 / sample_rate.max(1) as f32,
            buffers: reports.len(),
            pitched: pitches.len(),
            mean_pitch_hz: mean(|p| p.frequency),
            mean_confidence: mean(|p| p.confidence),
        }
    }
}
