//! audio - Playback, capture tap and envelope extraction
//!
//! Decodes incoming buffers (raw PCM16, container formats via symphonia,
//! or Opus packets), plays them through ALSA, and turns whatever is
//! currently playing into a lip-sync volume.

#[cfg(feature = "alsa")]
mod alsa_device;
pub mod capture_tap;
pub mod envelope;
pub mod fetch;
pub mod lip_sync;
#[cfg(feature = "opus")]
mod opus_codec;
pub mod output;
pub mod pcm;
pub mod router;
pub mod stream_decoder;
mod symphonia_decoder;

use std::sync::Arc;

use anyhow::Result;

pub use capture_tap::{CaptureTap, VoiceTap};
pub use envelope::{EnvelopeExtractor, SampleWindow};
pub use fetch::{AudioFetcher, HttpFetcher};
pub use lip_sync::{LipSync, LipSyncAnalyzeResult};
#[cfg(feature = "opus")]
pub use opus_codec::OpusDecoder;
pub use output::{AudioOutput, NullOutput};
#[cfg(feature = "alsa")]
pub use output::AlsaOutput;
pub use pcm::detect_pcm16;
pub use router::{OnEnded, PlayOptions, PlaybackRouter};
pub use stream_decoder::{DecodedAudio, DecoderFactory, StreamDecoder};
pub use symphonia_decoder::SymphoniaDecoder;

/// Audio configuration.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// ALSA playback device name, or "null" for headless operation
    pub playback_device: String,
    /// Desired ALSA playback period size (0 = let ALSA decide)
    pub playback_period_size: usize,
    /// Encoded stream format: "container" or "opus"
    pub stream_format: String,
    /// Opus codec sample rate (typically 24000)
    pub opus_sample_rate: u32,
    /// Opus codec channel count (typically 1 for mono)
    pub opus_channels: u32,
    /// Default rate for raw PCM16 buffers
    pub pcm_sample_rate: u32,
    /// Capture tap / SampleWindow length
    pub window_size: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            playback_device: "default".to_string(),
            playback_period_size: 1024,
            stream_format: "container".to_string(),
            opus_sample_rate: 24000,
            opus_channels: 1,
            pcm_sample_rate: router::DEFAULT_PCM_SAMPLE_RATE,
            window_size: envelope::DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Factory function: pick the decoder for the configured stream format.
pub fn create_decoder_factory(config: &AudioConfig) -> Result<Arc<dyn DecoderFactory>> {
    match config.stream_format.as_str() {
        "container" => {
            let factory = || -> Result<Box<dyn StreamDecoder>> { Ok(Box::new(SymphoniaDecoder::new())) };
            Ok(Arc::new(factory))
        }
        #[cfg(feature = "opus")]
        "opus" => {
            let (rate, channels) = (config.opus_sample_rate, config.opus_channels);
            let factory = move || -> Result<Box<dyn StreamDecoder>> {
                Ok(Box::new(OpusDecoder::new(rate, channels)?))
            };
            Ok(Arc::new(factory))
        }
        other => anyhow::bail!("Unsupported stream format: {}", other),
    }
}

/// Pick the output device: ALSA when available, headless otherwise.
pub fn create_output(config: &AudioConfig) -> Arc<dyn AudioOutput> {
    match config.playback_device.as_str() {
        "null" => Arc::new(NullOutput::new(true)),
        #[cfg(feature = "alsa")]
        device => Arc::new(AlsaOutput::new(device, config.playback_period_size)),
        #[cfg(not(feature = "alsa"))]
        device => {
            log::warn!("Built without ALSA, '{}' falls back to headless output", device);
            Arc::new(NullOutput::new(true))
        }
    }
}
