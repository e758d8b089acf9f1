//! Lock-free handoff between the scheduler thread and the audio callback
//!
//! The scheduler builds voices and pushes them over a bounded command ring;
//! the callback owns the [`VoicePool`] and pushes finished or rejected voices
//! back on a report ring, so nothing is freed on the real-time thread.

use super::pool::VoicePool;
use crate::error::{EngineError, Result};
use crate::voice::{Voice, VoiceId};
use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{trace, warn};

/// Default depth of the command ring
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Control thread → audio thread
pub enum PoolCommand {
    Spawn(Voice),
    StopAll,
}

/// Audio thread → control thread
#[derive(Debug)]
pub enum PoolReport {
    /// The voice reached `Done` and was removed from the pool
    Retired(Voice),
    /// The pool was full when the voice arrived
    Dropped(Voice),
}

/// Create a connected control handle and render pool
pub fn pool_channels(max_voices: usize, queue_capacity: usize) -> (PoolHandle, RenderPool) {
    let (cmd_tx, cmd_rx) = RingBuffer::new(queue_capacity.max(1));
    // room for every voice that can be live or in flight at once
    let (report_tx, report_rx) = RingBuffer::new(max_voices + queue_capacity.max(1));
    let live = Arc::new(AtomicUsize::new(0));

    let handle = PoolHandle {
        commands: cmd_tx,
        reports: report_rx,
        live: Arc::clone(&live),
        retired: 0,
        dropped: 0,
    };
    let render = RenderPool {
        pool: VoicePool::new(max_voices),
        commands: cmd_rx,
        reports: report_tx,
        live,
    };
    (handle, render)
}

/// Control side: sends voices, collects the ones the callback is done with
pub struct PoolHandle {
    commands: Producer<PoolCommand>,
    reports: Consumer<PoolReport>,
    live: Arc<AtomicUsize>,
    retired: u64,
    dropped: u64,
}

impl PoolHandle {
    /// Queue a voice for the next rendered block
    pub fn spawn(&mut self, voice: Voice) -> Result<VoiceId> {
        let id = voice.id();
        self.commands
            .push(PoolCommand::Spawn(voice))
            .map_err(|_| EngineError::QueueFull("voice command"))?;
        Ok(id)
    }

    /// Ask the callback to release every live voice
    pub fn stop_all(&mut self) -> Result<()> {
        self.commands
            .push(PoolCommand::StopAll)
            .map_err(|_| EngineError::QueueFull("voice command"))
    }

    /// Drain the report ring, dropping the returned voices here
    ///
    /// Returns the number of reports handled.
    pub fn collect(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(report) = self.reports.pop() {
            match report {
                PoolReport::Retired(voice) => {
                    trace!(voice = voice.id(), frames = voice.frames_rendered(), "voice retired");
                    self.retired += 1;
                }
                PoolReport::Dropped(voice) => {
                    warn!(voice = voice.id(), "voice pool full, dropping voice");
                    self.dropped += 1;
                }
            }
            handled += 1;
        }
        handled
    }

    /// Live voices as of the last rendered block
    pub fn live_voices(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    pub fn retired(&self) -> u64 {
        self.retired
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// True once the audio side has gone away
    pub fn is_disconnected(&self) -> bool {
        self.commands.is_abandoned()
    }
}

/// Audio side: owns the pool, lives inside the output callback
pub struct RenderPool {
    pool: VoicePool,
    commands: Consumer<PoolCommand>,
    reports: Producer<PoolReport>,
    live: Arc<AtomicUsize>,
}

impl RenderPool {
    pub fn max_voices(&self) -> usize {
        self.pool.max_voices()
    }

    /// Apply queued commands, then mix one block into `out`
    ///
    /// Real-time safe: no allocation, no locks, no logging. If the report
    /// ring is ever full the voice is dropped in place.
    pub fn render(&mut self, out: &mut [f32]) {
        while let Ok(command) = self.commands.pop() {
            match command {
                PoolCommand::Spawn(voice) => {
                    if let Err(voice) = self.pool.try_insert(voice) {
                        let _ = self.reports.push(PoolReport::Dropped(voice));
                    }
                }
                PoolCommand::StopAll => self.pool.stop_all(),
            }
        }

        let reports = &mut self.reports;
        self.pool.render(out, |voice| {
            let _ = reports.push(PoolReport::Retired(voice));
        });

        self.live.store(self.pool.len(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::tests::dc_voice;

    #[test]
    fn test_spawn_reaches_render_side() {
        let (mut handle, mut render) = pool_channels(4, 8);
        handle.spawn(dc_voice(1, 0.5, 1.0)).unwrap();
        assert_eq!(handle.live_voices(), 0);

        let mut out = [0.0f32; 8];
        render.render(&mut out);
        assert_eq!(out, [0.5; 8]);
        assert_eq!(handle.live_voices(), 1);
    }

    #[test]
    fn test_retired_voices_come_back() {
        let (mut handle, mut render) = pool_channels(4, 8);
        handle.spawn(dc_voice(1, 1.0, 0.004)).unwrap();

        let mut out = [0.0f32; 8];
        render.render(&mut out);
        assert_eq!(handle.live_voices(), 0);

        assert_eq!(handle.collect(), 1);
        assert_eq!(handle.retired(), 1);
        assert_eq!(handle.dropped(), 0);
    }

    #[test]
    fn test_full_pool_reports_drop() {
        let (mut handle, mut render) = pool_channels(1, 8);
        handle.spawn(dc_voice(1, 1.0, 1.0)).unwrap();
        handle.spawn(dc_voice(2, 1.0, 1.0)).unwrap();

        let mut out = [0.0f32; 8];
        render.render(&mut out);
        assert_eq!(out, [1.0; 8]);

        handle.collect();
        assert_eq!(handle.dropped(), 1);
        assert_eq!(handle.live_voices(), 1);
    }

    #[test]
    fn test_command_queue_full() {
        let (mut handle, _render) = pool_channels(4, 1);
        handle.spawn(dc_voice(1, 1.0, 1.0)).unwrap();
        assert_eq!(
            handle.spawn(dc_voice(2, 1.0, 1.0)),
            Err(EngineError::QueueFull("voice command"))
        );
    }

    #[test]
    fn test_stop_all_over_ring() {
        let (mut handle, mut render) = pool_channels(4, 8);
        handle.spawn(dc_voice(1, 1.0, 10.0)).unwrap();
        handle.spawn(dc_voice(2, 1.0, 10.0)).unwrap();

        let mut out = [0.0f32; 8];
        render.render(&mut out);
        assert_eq!(handle.live_voices(), 2);

        handle.stop_all().unwrap();
        render.render(&mut out);
        assert_eq!(handle.live_voices(), 0);
        assert_eq!(handle.collect(), 2);
    }

    #[test]
    fn test_disconnect() {
        let (handle, render) = pool_channels(4, 8);
        assert!(!handle.is_disconnected());
        drop(render);
        assert!(handle.is_disconnected());
    }
}
