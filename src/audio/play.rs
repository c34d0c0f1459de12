use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use anyhow::Result;

use crate::error::Error;
use crate::protocol::AudioChunk;

use super::backend::OutputBackend;
use super::output::PulseOutput;
use super::pulse_device::PulseBackend;

/// Playback configuration.
#[derive(Debug, Clone)]
pub struct PlayConfig {
    /// Target playback latency in ms
    pub latency_ms: u32,
    /// Name the output stream is published under
    pub port_name: String,
}

/// Owns the playback thread. The PulseAudio handles are not `Send`, so the
/// backend is created on that thread and never leaves it.
pub struct Player {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Player {
    /// Spawn the playback thread.
    ///
    /// Fails if the thread cannot be spawned or the PulseAudio output cannot
    /// be initialized; in the latter case the error is reported once the
    /// thread has tried.
    pub fn start(config: PlayConfig, chunk_rx: mpsc::Receiver<AudioChunk>) -> Result<Self> {
        Self::start_with(config, chunk_rx, PulseBackend::new)
    }

    /// Like [`Player::start`], with the backend built on the playback thread
    /// by `make_backend`.
    pub fn start_with<B, F>(
        config: PlayConfig,
        chunk_rx: mpsc::Receiver<AudioChunk>,
        make_backend: F,
    ) -> Result<Self>
    where
        B: OutputBackend,
        F: FnOnce() -> B + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), Error>>();

        let handle = {
            let running = running.clone();
            thread::Builder::new()
                .name("audio-play".into())
                .spawn(move || {
                    let output = PulseOutput::init(
                        make_backend(),
                        config.latency_ms,
                        &config.port_name,
                    );
                    let output = match output {
                        Ok(output) => {
                            let _ = ready_tx.send(Ok(()));
                            output
                        }
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };
                    play_thread(output, chunk_rx, &running);
                })?
        };

        ready_rx
            .recv()
            .map_err(|_| anyhow::anyhow!("Playback thread exited during startup"))??;

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Ask the thread to stop.
    ///
    /// The flag is only checked between chunks. A thread blocked waiting for
    /// audio notices it when the next chunk arrives, or exits anyway once
    /// every chunk sender is dropped.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Stop and wait for the thread to release the audio server.
    ///
    /// Drop every chunk sender first, otherwise this blocks until one more
    /// chunk is sent.
    pub fn join(mut self) {
        self.stop();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

// ======================== Playback thread ========================

pub fn play_thread<B: OutputBackend>(
    mut output: PulseOutput<B>,
    mut chunk_rx: mpsc::Receiver<AudioChunk>,
    running: &AtomicBool,
) {
    log::info!("Playback started");

    let mut was_active = output.is_active();
    while running.load(Ordering::Relaxed) {
        // Block until we receive an audio chunk (or channel closes)
        let Some(chunk) = chunk_rx.blocking_recv() else {
            log::info!("Playback channel closed");
            break;
        };

        if let Err(e) = output.send(&chunk) {
            // The output reconnects on the next chunk
            log::error!("Audio output error: {}", e);
        }

        let active = output.is_active();
        if active != was_active {
            if active {
                let spec = output.sample_spec();
                log::info!(
                    "Output active: rate={}, format={:?}, ch={}, map={:?}, tlength={}",
                    spec.rate,
                    spec.format,
                    spec.channels,
                    output.channel_map().positions(),
                    output.buffer_attr().tlength,
                );
            } else {
                log::info!("Output suspended until the next format change");
            }
            was_active = active;
        }
    }

    output.shutdown();
    log::info!("Playback stopped");
}
