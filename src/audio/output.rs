//! Audible output sinks.
//!
//! An output blocks its playback thread until the buffer has been played,
//! feeding the capture tap chunk by chunk as samples go out.

use std::thread;
use std::time::Duration;

use anyhow::Result;

use super::capture_tap::VoiceTap;
use super::stream_decoder::DecodedAudio;

/// Frames written per chunk when the device does not dictate a period.
pub const DEFAULT_CHUNK_FRAMES: usize = 1024;

/// The audio output device.
pub trait AudioOutput: Send + Sync {
    /// Play `audio` to completion, mirroring each written chunk into `voice`.
    fn play(&self, audio: &DecodedAudio, voice: &VoiceTap) -> Result<()>;
}

/// Headless output: nothing audible, only the tap sees the signal.
///
/// With `realtime` set, each chunk is held for its playback duration so the
/// envelope evolves at the speed it would on a real device.
#[derive(Debug, Clone)]
pub struct NullOutput {
    pub realtime: bool,
    pub chunk_frames: usize,
}

impl NullOutput {
    pub fn new(realtime: bool) -> Self {
        Self {
            realtime,
            chunk_frames: DEFAULT_CHUNK_FRAMES,
        }
    }
}

impl AudioOutput for NullOutput {
    fn play(&self, audio: &DecodedAudio, voice: &VoiceTap) -> Result<()> {
        let frames = audio.frames();
        let chunk = self.chunk_frames.max(1);
        let mut start = 0;
        while start < frames {
            let end = (start + chunk).min(frames);
            voice.write(&audio.mixdown(start, end));
            if self.realtime && audio.sample_rate > 0 {
                thread::sleep(Duration::from_secs_f64(
                    (end - start) as f64 / audio.sample_rate as f64,
                ));
            }
            start = end;
        }
        Ok(())
    }
}

/// Map interleaved frames from `in_ch` to `out_ch` channels by wrapping.
#[cfg_attr(not(feature = "alsa"), allow(dead_code))]
pub(crate) fn remap_channels(data: &[i16], in_ch: usize, out_ch: usize) -> Vec<i16> {
    if in_ch == out_ch || in_ch == 0 {
        return data.to_vec();
    }
    let frames = data.len() / in_ch;
    let mut out = vec![0i16; frames * out_ch];
    for i in 0..frames {
        for c in 0..out_ch {
            out[i * out_ch + c] = data[i * in_ch + (c % in_ch)];
        }
    }
    out
}

#[cfg(feature = "alsa")]
pub use self::alsa_output::AlsaOutput;

#[cfg(feature = "alsa")]
mod alsa_output {
    use super::*;
    use crate::audio::alsa_device;

    /// Maximum consecutive recovery attempts before dropping the rest of a chunk.
    const MAX_RECOVERY_RETRIES: u32 = 3;

    /// ALSA playback. Each `play` opens its own PCM handle so concurrent
    /// playbacks can share a `dmix`/`pulse` device.
    #[derive(Debug, Clone)]
    pub struct AlsaOutput {
        device: String,
        period_size: usize,
    }

    impl AlsaOutput {
        pub fn new(device: impl Into<String>, period_size: usize) -> Self {
            Self {
                device: device.into(),
                period_size,
            }
        }
    }

    impl AudioOutput for AlsaOutput {
        fn play(&self, audio: &DecodedAudio, voice: &VoiceTap) -> Result<()> {
            let (pcm, params) = alsa_device::open_playback(
                &self.device,
                alsa_device::AlsaParams {
                    sample_rate: audio.sample_rate,
                    channels: audio.channel_count() as u32,
                    period_size: self.period_size,
                },
            )?;
            let io = pcm.io_i16()?;

            // Play and tap at the rate the device actually runs at.
            let resampled;
            let audio = if params.sample_rate != audio.sample_rate {
                resampled = audio.resample_linear(params.sample_rate);
                &resampled
            } else {
                audio
            };

            let out_channels = params.channels as usize;
            let chunk_frames = params.period_size.max(1);
            let total_frames = audio.frames();

            let mut start = 0;
            while start < total_frames {
                let end = (start + chunk_frames).min(total_frames);
                let pcm_data = remap_channels(
                    &audio.interleave_i16(start, end),
                    audio.channel_count(),
                    out_channels,
                );

                // Retry loop for short writes and XRUN recovery.
                let chunk_len = end - start;
                let mut frames_written = 0;
                let mut retry_count = 0u32;
                while frames_written < chunk_len {
                    let offset = frames_written * out_channels;
                    match io.writei(&pcm_data[offset..]) {
                        Ok(n) => {
                            frames_written += n;
                            retry_count = 0;
                        }
                        Err(e) => {
                            log::warn!("ALSA XRUN or error: {}, recovering...", e);
                            retry_count += 1;
                            pcm.prepare()
                                .map_err(|e2| anyhow::anyhow!("Failed to recover PCM playback: {}", e2))?;
                            if retry_count >= MAX_RECOVERY_RETRIES {
                                log::error!(
                                    "Max recovery retries ({}) reached. Dropping {} unwritten frames.",
                                    retry_count,
                                    chunk_len - frames_written
                                );
                                break;
                            }
                        }
                    }
                }

                voice.write(&audio.mixdown(start, end));
                start = end;
            }

            // Block until the device has played everything.
            pcm.drain()?;
            Ok(())
        }
    }
}
