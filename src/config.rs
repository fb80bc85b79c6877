use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use reharm::audio::analysis::UnpitchedPolicy;
use reharm::AnalysisParams;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub chord: ChordConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Detector tuning; any key left out keeps its default
    #[serde(flatten)]
    pub params: AnalysisParams,
}

#[derive(Debug, Deserialize)]
pub struct ChordConfig {
    #[serde(default = "default_notes")]
    pub notes: Vec<String>,
    #[serde(default = "default_volume")]
    pub volume: u8,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub unpitched: UnpitchedPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            params: AnalysisParams::default(),
        }
    }
}

impl Default for ChordConfig {
    fn default() -> Self {
        Self {
            notes: default_notes(),
            volume: default_volume(),
        }
    }
}

fn default_buffer_size() -> usize { 4096 }
fn default_notes() -> Vec<String> { vec!["C4".into(), "E4".into(), "G4".into()] }
fn default_volume() -> u8 { 127 }

/// Explicit path, else ./reharm.toml, ~/.config/reharm/config.toml, then
/// the platform config directory
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("reharm.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("reharm").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("reharm").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid config: {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}
