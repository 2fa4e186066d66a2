//! Opus packet decoder.
//!
//! Decodes one Opus packet per playback into planar float samples at the
//! stream rate. Resampling to the device rate is left to the ALSA plug layer.

use anyhow::Result;

use super::stream_decoder::{DecodedAudio, StreamDecoder};

/// Max 120ms @ 48kHz = 5760 samples/channel, use 6000 for safety.
const MAX_FRAME_SIZE: usize = 6000;

pub struct OpusDecoder {
    decoder: opus::Decoder,
    sample_rate: u32,
    channels: u32,
}

impl OpusDecoder {
    /// Create a new Opus decoder.
    ///
    /// * `sample_rate` - Opus stream sample rate (e.g. 24000)
    /// * `channels`    - Opus stream channels (e.g. 1)
    pub fn new(sample_rate: u32, channels: u32) -> Result<Self> {
        let opus_channels = if channels == 1 {
            opus::Channels::Mono
        } else {
            opus::Channels::Stereo
        };

        let decoder = opus::Decoder::new(sample_rate, opus_channels)?;

        Ok(Self {
            decoder,
            sample_rate,
            channels: channels.clamp(1, 2),
        })
    }
}

impl StreamDecoder for OpusDecoder {
    fn decode(&mut self, data: &[u8]) -> Result<DecodedAudio> {
        let channel_count = self.channels as usize;
        let mut pcm_buf = vec![0f32; MAX_FRAME_SIZE * channel_count];
        let decoded_per_ch = self.decoder.decode_float(data, &mut pcm_buf, false)?;

        // Interleaved → planar
        let mut channels = vec![Vec::with_capacity(decoded_per_ch); channel_count];
        for frame in pcm_buf[..decoded_per_ch * channel_count].chunks_exact(channel_count) {
            for (ch, sample) in channels.iter_mut().zip(frame) {
                ch.push(*sample);
            }
        }

        Ok(DecodedAudio {
            channels,
            sample_rate: self.sample_rate,
        })
    }
}
