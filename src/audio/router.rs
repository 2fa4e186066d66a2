//! Playback router: decode a buffer and fan it out to the output device and
//! the capture tap.
//!
//! Every `play` gets its own decoder, its own OS thread and its own voice on
//! the tap. Real-time audio I/O stays off the tokio workers.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use bytes::Bytes;

use super::capture_tap::CaptureTap;
use super::fetch::AudioFetcher;
use super::output::AudioOutput;
use super::pcm;
use super::stream_decoder::{DecodedAudio, DecoderFactory};
use crate::error::{PlaybackError, Result};

/// Sample rate assumed for raw PCM16 when the caller does not supply one.
pub const DEFAULT_PCM_SAMPLE_RATE: u32 = 24000;

/// Completion callback, invoked exactly once per `play`.
pub type OnEnded = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayOptions {
    /// Hand the buffer to the codec decoder instead of reading raw PCM16.
    pub needs_decode: bool,
    /// Sample rate for the raw PCM16 path.
    pub sample_rate: u32,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            needs_decode: true,
            sample_rate: DEFAULT_PCM_SAMPLE_RATE,
        }
    }
}

impl PlayOptions {
    pub fn raw_pcm16(sample_rate: u32) -> Self {
        Self {
            needs_decode: false,
            sample_rate,
        }
    }
}

pub struct PlaybackRouter {
    decoders: Arc<dyn DecoderFactory>,
    output: Arc<dyn AudioOutput>,
    fetcher: Arc<dyn AudioFetcher>,
    tap: CaptureTap,
    next_id: AtomicU64,
}

impl PlaybackRouter {
    pub fn new(
        decoders: Arc<dyn DecoderFactory>,
        output: Arc<dyn AudioOutput>,
        fetcher: Arc<dyn AudioFetcher>,
        tap: CaptureTap,
    ) -> Self {
        Self {
            decoders,
            output,
            fetcher,
            tap,
            next_id: AtomicU64::new(0),
        }
    }

    pub fn tap(&self) -> &CaptureTap {
        &self.tap
    }

    /// Decode `buffer` and start playing it.
    ///
    /// Returns once playback has started; completion is signalled through
    /// `on_ended`. On any failure the error is logged, `on_ended` is still
    /// called once, and the error is returned to the caller.
    pub async fn play(&self, buffer: Bytes, options: PlayOptions, on_ended: Option<OnEnded>) -> Result<()> {
        match self.decode(buffer, options).await {
            Ok(audio) => self.start(audio, on_ended),
            Err(e) => Err(fail(e, on_ended)),
        }
    }

    /// Fetch the bytes at `url`, then play them through the decoder.
    pub async fn play_from_url(&self, url: &str, on_ended: Option<OnEnded>) -> Result<()> {
        let buffer = match self.fetcher.fetch(url).await {
            Ok(buffer) => buffer,
            Err(e) => return Err(fail(e.into(), on_ended)),
        };
        self.play(buffer, PlayOptions::default(), on_ended).await
    }

    async fn decode(&self, buffer: Bytes, options: PlayOptions) -> Result<DecodedAudio> {
        if buffer.is_empty() {
            return Err(PlaybackError::InvalidInput("buffer is empty".into()));
        }

        if !options.needs_decode {
            return pcm::decode_pcm16(&buffer, options.sample_rate);
        }

        let decoders = self.decoders.clone();
        let audio = tokio::task::spawn_blocking(move || {
            let mut decoder = decoders.create()?;
            decoder.decode(&buffer)
        })
        .await
        .map_err(|e| PlaybackError::Decode(anyhow::anyhow!("decoder task failed: {}", e)))?
        .map_err(PlaybackError::Decode)?;

        if audio.is_empty() {
            return Err(PlaybackError::Decode(anyhow::anyhow!("decoded stream is empty")));
        }
        Ok(audio)
    }

    fn start(&self, audio: DecodedAudio, on_ended: Option<OnEnded>) -> Result<()> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let output = self.output.clone();
        let voice = self.tap.open_voice();

        log::info!(
            "Playback #{} started: rate={}, ch={}, {:.2}s",
            id,
            audio.sample_rate,
            audio.channel_count(),
            audio.duration_secs(),
        );

        // Whoever takes the callback first fires it: the playback thread, or
        // the error path below if the thread never starts.
        let on_ended = Arc::new(Mutex::new(on_ended));
        let thread_on_ended = on_ended.clone();

        thread::Builder::new()
            .name(format!("audio-play-{}", id))
            .spawn(move || {
                let result = output.play(&audio, &voice);
                drop(voice);
                match result {
                    Ok(()) => log::info!("Playback #{} finished", id),
                    Err(e) => log::error!("Playback #{} device error: {:#}", id, e),
                }
                if let Some(cb) = take_callback(&thread_on_ended) {
                    cb();
                }
            })
            .map(|_| ())
            .map_err(|e| fail(PlaybackError::Device(e.into()), take_callback(&on_ended)))
    }
}

fn take_callback(slot: &Mutex<Option<OnEnded>>) -> Option<OnEnded> {
    slot.lock().unwrap_or_else(|e| e.into_inner()).take()
}

/// Log a failed play and fire its completion callback.
fn fail(error: PlaybackError, on_ended: Option<OnEnded>) -> PlaybackError {
    log::error!("Audio playback failed: {}", error);
    if let Some(cb) = on_ended {
        cb();
    }
    error
}
