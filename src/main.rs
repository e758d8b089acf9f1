//! polyvox - event-driven polyphonic voice engine

use anyhow::{Context, Result};
use clap::Parser;
use polyvox::config;
use polyvox::engine::live::{LiveScheduler, Shutdown};
use polyvox::engine::{self, pool_channels, Engine, Player, Recorder, DEFAULT_QUEUE_CAPACITY};
use polyvox::voice::VoiceFactory;
use std::time::Duration;
use tracing::info;

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_target(false)
        .init();

    match cli.command {
        Commands::Play {
            config: config_path,
            duration,
        } => {
            let cfg = config::load_config(&config_path)?;
            let sample_rate = cfg.audio.sample_rate;

            let schedule = cfg.events.build_schedule()?;
            let factory = VoiceFactory::with_builtins(sample_rate as f64);
            let (handle, render) = pool_channels(cfg.events.max_voices, DEFAULT_QUEUE_CAPACITY);
            let scheduler = LiveScheduler::new(schedule, factory, cfg.events.instrument.clone(), handle)?;

            let mut player = Player::new();
            player
                .start(render, sample_rate, cfg.audio.master_volume)
                .context("failed to open audio output")?;

            let shutdown = Shutdown::new();
            let signal = shutdown.clone();
            ctrlc::set_handler(move || signal.request()).context("failed to install Ctrl-C handler")?;

            println!("Playing {} (Ctrl-C to drain, twice to stop)", cfg.events.instrument);

            let rt = tokio::runtime::Runtime::new()?;
            let limit = duration.map(Duration::from_secs_f64);
            let stats = rt.block_on(scheduler.run(shutdown, limit))?;
            player.stop();

            println!(
                "\n{} events, {} voices, {} dropped, {} failed",
                stats.events, stats.spawned, stats.dropped, stats.failed
            );
        }

        Commands::Render {
            config: config_path,
            output,
            duration,
        } => {
            let cfg = config::load_config(&config_path)?;
            let sample_rate = cfg.audio.sample_rate;

            let mut engine = Engine::from_config(&cfg)?;
            let frames = (duration.max(0.0) * sample_rate as f64).round() as u64;

            println!("Rendering {} seconds to {:?}...", duration, output);

            let mut recorder = Recorder::new(&output, sample_rate)?;
            recorder.record(&mut engine, frames, cfg.audio.block_size)?;
            recorder.finalize()?;

            let stats = engine.stats();
            info!(
                events = stats.events,
                spawned = stats.spawned,
                dropped = stats.dropped,
                failed = stats.failed,
                "render finished"
            );
            println!("Rendered {} events to {:?}", stats.events, output);
        }

        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            let checked = config::load_config(&config_path)
                .and_then(|cfg| Ok((Engine::from_config(&cfg)?, cfg)));
            match checked {
                Ok((engine, cfg)) => {
                    println!("Configuration is valid!");
                    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
                    println!("  Block size: {}", cfg.audio.block_size);
                    println!("  Master volume: {:.0}%", cfg.audio.master_volume * 100.0);
                    println!("  Instrument: {}", engine.instrument());
                    println!("  Beat: {} at {} BPM", cfg.events.beat, cfg.events.bpm);
                    println!("  Max voices: {}", cfg.events.max_voices);
                    println!("  Parameters:");
                    for name in engine.schedule().param_names() {
                        println!("    - {}", name);
                    }
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Events {
            config: config_path,
            count,
        } => {
            let cfg = config::load_config(&config_path)?;
            for record in cfg.events.build_schedule()?.take(count) {
                println!("{}", serde_json::to_string(&record)?);
            }
        }

        Commands::Instruments => {
            let factory = VoiceFactory::with_builtins(44100.0);
            println!("Built-in instruments:\n");
            for name in factory.instruments() {
                let blueprint = factory.blueprint(name)?;
                println!("  {:<16} reads: {}", name, blueprint.required().join(", "));
            }
        }

        Commands::Devices => {
            println!("Available audio devices:\n");

            if let Some(name) = engine::default_device_name() {
                println!("Default output: {}\n", name);
            }

            println!("Output devices:");
            for (name, config) in engine::list_output_devices() {
                println!(
                    "  - {} ({} Hz, {} ch)",
                    name, config.sample_rate.0, config.channels
                );
            }
        }

        Commands::Init => {
            let example_config = include_str!("../polyvox.example.yaml");

            let path = "polyvox.yaml";
            if std::path::Path::new(path).exists() {
                println!("polyvox.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, example_config)?;
                println!("Created polyvox.yaml with example configuration.");
            }
        }
    }

    Ok(())
}
