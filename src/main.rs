mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use cli::Cli;
use reharm::audio::analysis::{self, Settings, UnpitchedPolicy};
use reharm::audio::decode::decode_audio;
use reharm::encode::wav::WavEncoder;
use reharm::notes::{parse_note_number, Note, VoiceList, MAX_VOICES};
use reharm::AnalysisParams;

fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();

    let mut params = AnalysisParams::default();
    let mut notes = vec!["C4".to_string(), "E4".to_string(), "G4".to_string()];

    if let Some(path) = config::find_config(cli.config.as_deref()) {
        match config::load_config(&path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                // Merge: config values apply only when CLI is at its default
                if cli.buffer_size == 4096 { cli.buffer_size = cfg.analysis.buffer_size; }
                if cli.threshold == 3.0 { cli.threshold = cfg.analysis.params.threshold; }
                if cli.volume == 127 { cli.volume = cfg.chord.volume; }
                if cli.unpitched == UnpitchedPolicy::Passthrough {
                    cli.unpitched = cfg.output.unpitched;
                }
                params = cfg.analysis.params;
                notes = cfg.chord.notes;
            }
            Err(e) if cli.config.is_some() => return Err(e),
            Err(e) => log::warn!("Ignoring config {}: {:#}", path.display(), e),
        }
    }
    if !cli.notes.is_empty() {
        notes = std::mem::take(&mut cli.notes);
    }
    params.threshold = cli.threshold;
    params.validate().context("Invalid analysis parameters")?;

    let chord = build_chord(&notes, cli.volume)?;

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    log::info!("reharm - pitch detection and chord resynthesis");
    log::info!("Input: {}", cli.input.display());
    if !cli.analyze_only {
        log::info!("Output: {}", cli.output.display());
    }

    // 1. Decode audio
    log::info!("Decoding audio...");
    let audio = decode_audio(&cli.input)?;

    // 2. Detect and resynthesize, buffer by buffer
    let settings = Settings {
        buffer_size: cli.buffer_size,
        params,
        chord,
        unpitched: cli.unpitched,
        resynthesize: !cli.analyze_only,
    };
    let total = analysis::buffer_count(audio.frames(), settings.buffer_size) * audio.channel_count();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} buffers ({eta} remaining)")?
            .progress_chars("=>-"),
    );
    let processed = analysis::process(&audio, &settings, |done| pb.set_position(done as u64))?;
    pb.finish_with_message("Analysis complete");

    // 3. Report or write
    if cli.analyze_only {
        for report in &processed.reports {
            println!("{}", report.format_line(audio.sample_rate));
        }
    } else {
        log::info!("Writing {}...", cli.output.display());
        let mut encoder = WavEncoder::new(
            &cli.output,
            audio.sample_rate,
            audio.bits_per_sample,
            processed.channels.len(),
        )?;
        let frames = processed.channels.first().map_or(0, |c| c.len());
        let mut start = 0;
        while start < frames {
            let end = (start + settings.buffer_size).min(frames);
            let block: Vec<&[f32]> = processed
                .channels
                .iter()
                .map(|c| &c[start.min(c.len())..end.min(c.len())])
                .collect();
            encoder.write_block(&block)?;
            start = end;
        }
        encoder.finish()?;
    }

    let summary = &processed.summary;
    log::info!(
        "{} buffers over {:.1}s of {} channel(s), {} pitched",
        summary.buffers,
        summary.duration,
        summary.channels,
        summary.pitched
    );
    if let (Some(f), Some(c)) = (summary.mean_pitch_hz, summary.mean_confidence) {
        log::info!("Mean pitch {:.1} Hz, mean confidence {:.3}", f, c);
    }

    log::info!("Done!");
    Ok(())
}

fn build_chord(names: &[String], volume: u8) -> Result<VoiceList> {
    let mut chord = VoiceList::new();
    for name in names {
        let number = parse_note_number(name.trim()).with_context(|| format!("Invalid chord note: {}", name))?;
        if !chord.note_on(number, volume) {
            log::warn!("Only {} voices can sound, dropping {}", MAX_VOICES, name);
        }
    }
    let sounding: Vec<String> = chord.sounding().map(Note::name).collect();
    log::info!("Chord: {} at volume {}", sounding.join(" "), volume);
    Ok(chord)
}
