//! Container audio decoding (WAV, MP3, OGG/Vorbis, FLAC) via symphonia.

use std::io::Cursor;

use anyhow::{Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::stream_decoder::{DecodedAudio, StreamDecoder};

/// Probes the buffer for a known container and decodes its first audio track.
#[derive(Debug, Default)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl StreamDecoder for SymphoniaDecoder {
    fn decode(&mut self, data: &[u8]) -> Result<DecodedAudio> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(data.to_vec())), Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &Hint::new(),
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .context("Unsupported audio format")?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| anyhow::anyhow!("No supported audio track found"))?;
        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .context("Failed to create codec decoder")?;

        let mut channels: Vec<Vec<f32>> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(e).context("Failed to read packet"),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let channel_count = spec.channels.count();
                    sample_rate.get_or_insert(spec.rate);
                    if channels.is_empty() {
                        channels = vec![Vec::new(); channel_count];
                    }

                    let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    buf.copy_interleaved_ref(decoded);
                    for frame in buf.samples().chunks_exact(channel_count) {
                        for (ch, sample) in channels.iter_mut().zip(frame) {
                            ch.push(*sample);
                        }
                    }
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    // Corrupt packet, keep going with the rest of the stream.
                    log::warn!("Skipping undecodable packet: {}", e);
                }
                Err(e) => return Err(e).context("Decoder failed"),
            }
        }

        let sample_rate = sample_rate.ok_or_else(|| anyhow::anyhow!("Unknown sample rate"))?;
        if channels.iter().all(Vec::is_empty) {
            anyhow::bail!("Stream contained no audio frames");
        }

        Ok(DecodedAudio {
            channels,
            sample_rate,
        })
    }
}
