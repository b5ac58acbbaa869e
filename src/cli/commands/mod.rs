pub mod classify;
pub mod config;
pub mod features;

use crate::bio::fastx::{FastxBuffer, FastxRecords};
use crate::bio::sequence::Sequence;
use crate::core::config::{default_config, load_config, Config};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// Configuration file (or defaults) with command-line overrides applied.
pub fn resolve_config(
    path: Option<&PathBuf>,
    threads: Option<usize>,
    batch_size: Option<usize>,
) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => default_config(),
    };
    if let Some(threads) = threads {
        config.performance.threads = threads;
    }
    if let Some(batch_size) = batch_size {
        config.performance.batch_size = batch_size;
    }
    config.validate()?;
    Ok(config)
}

/// Map (or decompress) the input file. Records are parsed lazily from it.
pub fn open_input(path: &Path) -> anyhow::Result<FastxBuffer> {
    tracing::debug!("Opening {}", path.display());
    Ok(FastxBuffer::open(path)?)
}

pub fn spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    progress.set_message(message.to_string());
    Ok(progress)
}

/// Reads records in bounded chunks and uppercases soft-masked ones.
pub struct ChunkedRecords<'a> {
    records: FastxRecords<'a>,
    chunk_size: usize,
    converted: usize,
}

impl<'a> ChunkedRecords<'a> {
    pub fn new(records: FastxRecords<'a>, chunk_size: usize) -> Self {
        Self {
            records,
            chunk_size: chunk_size.max(1),
            converted: 0,
        }
    }

    /// Up to `chunk_size` records; empty once the input is exhausted.
    pub fn next_chunk(&mut self) -> anyhow::Result<Vec<Sequence>> {
        let mut chunk = self
            .records
            .by_ref()
            .take(self.chunk_size)
            .collect::<Result<Vec<_>, _>>()?;

        for seq in chunk.iter_mut() {
            if seq.normalize_case() {
                tracing::warn!("sequence of {} converted to uppercase", seq.id);
                self.converted += 1;
            }
        }
        Ok(chunk)
    }

    /// Number of records uppercased so far.
    pub fn converted(&self) -> usize {
        self.converted
    }

    pub fn report_converted(&self) {
        if self.converted > 0 {
            eprintln!(
                "{} {} sequences converted to uppercase, which is required for analysis",
                "WARNING:".yellow().bold(),
                self.converted
            );
        }
    }
}
