//! WAV file recorder
//!
//! Writes rendered blocks to a mono 32-bit float WAV file.

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use super::Engine;

/// WAV file recorder
pub struct Recorder {
    writer: WavWriter<BufWriter<File>>,
    sample_rate: u32,
    samples_written: u64,
}

impl Recorder {
    /// Create a new recorder
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer,
            sample_rate,
            samples_written: 0,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Length of the recording in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples_written as f64 / self.sample_rate as f64
    }

    /// Write a block of samples
    pub fn write_block(&mut self, block: &[f32]) -> Result<()> {
        for &sample in block {
            self.writer
                .write_sample(sample)
                .context("failed to write sample")?;
        }
        self.samples_written += block.len() as u64;
        Ok(())
    }

    /// Render `frames` frames from the engine in blocks of `block_size`
    pub fn record(&mut self, engine: &mut Engine, frames: u64, block_size: usize) -> Result<()> {
        let mut block = vec![0.0f32; block_size.max(1)];
        let mut left = frames;

        while left > 0 {
            let len = left.min(block.len() as u64) as usize;
            engine.render_block(&mut block[..len]);
            self.write_block(&block[..len])?;
            left -= len as u64;
        }
        Ok(())
    }

    /// Finalize the WAV file
    ///
    /// This must be called to properly close the file and write the header.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize().context("failed to finalize WAV file")
    }
}
