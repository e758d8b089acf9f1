//! Real-time audio playback using cpal
//!
//! The output callback owns a [`RenderPool`]; voices arrive over its command
//! ring, so the callback never locks or allocates.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

use super::RenderPool;
use crate::MAX_BLOCK_SIZE;

/// Real-time audio player
pub struct Player {
    stream: Option<Stream>,
    running: Arc<AtomicBool>,
    sample_rate: u32,
}

impl Player {
    pub fn new() -> Self {
        Self {
            stream: None,
            running: Arc::new(AtomicBool::new(false)),
            sample_rate: 0,
        }
    }

    /// Sample rate of the open stream (0 before `start`)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Open the default output device at `sample_rate` and start rendering
    pub fn start(&mut self, pool: RenderPool, sample_rate: u32, master_volume: f32) -> Result<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No output device available"))?;

        let config = device.default_output_config()?;
        let sample_format = config.sample_format();
        let mut stream_config: StreamConfig = config.into();
        stream_config.sample_rate = cpal::SampleRate(sample_rate);

        info!(
            device = device.name().unwrap_or_default(),
            sample_rate,
            channels = stream_config.channels,
            "opening output stream"
        );

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, pool, running, master_volume)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, pool, running, master_volume)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, pool, running, master_volume)?,
            _ => return Err(anyhow!("Unsupported sample format")),
        };

        stream.play()?;
        self.stream = Some(stream);
        self.sample_rate = sample_rate;

        Ok(())
    }

    /// Stop playback and close the stream
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.stream = None;
    }

    pub fn is_playing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

fn build_stream<T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>>(
    device: &Device,
    config: &StreamConfig,
    mut pool: RenderPool,
    running: Arc<AtomicBool>,
    master_volume: f32,
) -> Result<Stream> {
    let channels = config.channels as usize;
    let mut mono = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            if !running.load(Ordering::Relaxed) {
                // Fill with silence when stopped
                for sample in data.iter_mut() {
                    *sample = T::from_sample(0.0f32);
                }
                return;
            }

            for chunk in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
                let frames = chunk.len() / channels;
                let block = &mut mono[..frames];
                pool.render(block);

                for (frame, &sample) in chunk.chunks_mut(channels).zip(block.iter()) {
                    let sample = sample * master_volume;
                    for channel_sample in frame.iter_mut() {
                        *channel_sample = T::from_sample(sample);
                    }
                }
            }
        },
        |err| {
            error!("audio stream error: {}", err);
        },
        None,
    )?;

    Ok(stream)
}

/// Get the default output device name
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device().and_then(|d| d.name().ok())
}

/// List all available output devices
pub fn list_output_devices() -> Vec<(String, StreamConfig)> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let (Ok(name), Ok(config)) = (device.name(), device.default_output_config()) {
                devices.push((name, config.into()));
            }
        }
    }

    devices
}
