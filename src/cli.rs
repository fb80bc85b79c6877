use clap::Parser;
use std::path::PathBuf;

use reharm::audio::analysis::UnpitchedPolicy;

#[derive(Parser, Debug)]
#[command(name = "reharm", about = "Detect the pitch of an audio file buffer by buffer and resynthesize it as a chord")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: PathBuf,

    /// Output WAV file
    #[arg(short, long, default_value = "output.wav")]
    pub output: PathBuf,

    /// Chord notes (comma-separated names or MIDI numbers, e.g. C4,E4,G4)
    #[arg(short, long, value_delimiter = ',')]
    pub notes: Vec<String>,

    /// Volume of every chord note (0-127)
    #[arg(long, default_value_t = 127)]
    pub volume: u8,

    /// Samples per analysis buffer (power of two)
    #[arg(short, long, default_value_t = 4096)]
    pub buffer_size: usize,

    /// Peak-to-noise ratio a spectral peak must exceed
    #[arg(long, default_value_t = 3.0)]
    pub threshold: f32,

    /// What to write for buffers with no detectable pitch
    #[arg(long, value_enum, default_value_t = UnpitchedPolicy::Passthrough)]
    pub unpitched: UnpitchedPolicy,

    /// Print the per-buffer pitch table instead of writing audio
    #[arg(long)]
    pub analyze_only: bool,

    /// Path to config file (default: ./reharm.toml or ~/.config/reharm/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log every buffer's pitch
    #[arg(short, long)]
    pub verbose: bool,
}
