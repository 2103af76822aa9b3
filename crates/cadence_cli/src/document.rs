//! Sequence document files

use anyhow::{Context, Result};
use cadence_sequence::SequenceConfig;
use std::fs;
use std::path::Path;

/// On-disk document format, picked from the file extension
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Format::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Format::Toml),
            _ => anyhow::bail!(
                "Cannot tell the format of {}; use a .json or .toml extension",
                path.display()
            ),
        }
    }
}

/// Read and validate a sequence document
pub fn load(path: &Path) -> Result<SequenceConfig> {
    let format = Format::from_path(path)?;
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = match format {
        Format::Json => SequenceConfig::from_json(&content),
        Format::Toml => SequenceConfig::from_toml(&content),
    }
    .with_context(|| format!("Failed to load {}", path.display()))?;

    tracing::debug!(path = %path.display(), steps = config.steps.len(), "document loaded");
    Ok(config)
}

/// Write a sequence document in the format its extension names
pub fn save(path: &Path, config: &SequenceConfig) -> Result<()> {
    let content = match Format::from_path(path)? {
        Format::Json => config.to_json(),
        Format::Toml => config.to_toml(),
    }
    .context("Failed to serialize sequence")?;

    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
