use anyhow::{Context, Result};
use log::{error, info};
use percolation_common::EnsembleSummary;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Serialisation formats available for the ensemble summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryFormat {
    Json,
    Bincode,
    MessagePack,
}

impl SummaryFormat {
    /// Parses the configured format name. Unknown names fall back to JSON.
    pub fn from_config(name: Option<&str>) -> Self {
        match name.unwrap_or("json") {
            "json" => SummaryFormat::Json,
            "bincode" => SummaryFormat::Bincode,
            "messagepack" => SummaryFormat::MessagePack,
            other => {
                error!("Unknown output format: {}. Using JSON instead.", other);
                SummaryFormat::Json
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SummaryFormat::Json => "json",
            SummaryFormat::Bincode => "bin",
            SummaryFormat::MessagePack => "msgpack",
        }
    }
}

/// Writes `summary` to `<directory>/<stem>_summary.<ext>` and returns the path.
pub fn save_summary(
    summary: &EnsembleSummary,
    directory: &Path,
    stem: &str,
    format: SummaryFormat,
) -> Result<PathBuf> {
    let filename = directory.join(format!("{}_summary.{}", stem, format.extension()));
    let file = File::create(&filename)
        .with_context(|| format!("Error creating summary file '{}'", filename.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        SummaryFormat::Json => serde_json::to_writer(&mut writer, summary)
            .context("Error serializing summary to JSON")?,
        SummaryFormat::Bincode => bincode::serialize_into(&mut writer, summary)
            .context("Error serializing summary to bincode")?,
        SummaryFormat::MessagePack => rmp_serde::encode::write(&mut writer, summary)
            .context("Error serializing summary to MessagePack")?,
    }
    writer
        .flush()
        .with_context(|| format!("Error writing summary file '{}'", filename.display()))?;

    info!("Ensemble summary saved to {}", filename.display());
    Ok(filename)
}
