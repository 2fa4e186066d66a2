//! Generic stream decoder trait for multi-format audio playback support.

use anyhow::Result;

/// A decoded buffer: one `Vec<f32>` per channel plus its sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Wrap a single channel of samples.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            channels: vec![samples],
            sample_rate,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel (the shortest channel wins).
    pub fn frames(&self) -> usize {
        self.channels.iter().map(Vec::len).min().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f32 / self.sample_rate as f32
    }

    /// Average all channels into one, the signal the capture tap observes.
    pub fn mixdown(&self, start: usize, end: usize) -> Vec<f32> {
        let count = self.channels.len().max(1) as f32;
        (start..end)
            .map(|i| self.channels.iter().map(|ch| ch[i]).sum::<f32>() / count)
            .collect()
    }

    /// Linear-interpolation resample of every channel to `rate`.
    pub fn resample_linear(&self, rate: u32) -> DecodedAudio {
        if rate == self.sample_rate || self.sample_rate == 0 || rate == 0 {
            return self.clone();
        }
        let frames = self.frames();
        let out_frames = (frames as u64 * rate as u64 / self.sample_rate as u64) as usize;
        let step = self.sample_rate as f64 / rate as f64;

        let channels = self
            .channels
            .iter()
            .map(|ch| {
                (0..out_frames)
                    .map(|i| {
                        let pos = i as f64 * step;
                        let idx = pos as usize;
                        let frac = (pos - idx as f64) as f32;
                        let a = ch[idx.min(frames - 1)];
                        let b = ch[(idx + 1).min(frames - 1)];
                        a + (b - a) * frac
                    })
                    .collect()
            })
            .collect();

        DecodedAudio {
            channels,
            sample_rate: rate,
        }
    }

    /// Interleave frames `[start, end)` as i16 for an S16LE device.
    pub fn interleave_i16(&self, start: usize, end: usize) -> Vec<i16> {
        let mut out = Vec::with_capacity((end - start) * self.channels.len());
        for i in start..end {
            for ch in &self.channels {
                out.push(float_to_i16(ch[i]));
            }
        }
        out
    }
}

/// Inverse of the asymmetric PCM16 scaling used on the raw path.
pub fn float_to_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0).round() as i16
    } else {
        (s * 32767.0).round() as i16
    }
}

/// A trait for audio decoders that convert a complete encoded buffer
/// into planar f32 samples.
///
/// Implementations handle format-specific decoding internally. A decoder
/// instance serves one playback; the router asks its factory for a fresh
/// one per `play` call.
pub trait StreamDecoder: Send {
    /// Decode encoded audio bytes.
    fn decode(&mut self, data: &[u8]) -> Result<DecodedAudio>;
}

/// Creates one decoder per playback so concurrent plays never share state.
pub trait DecoderFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn StreamDecoder>>;
}

impl<F> DecoderFactory for F
where
    F: Fn() -> Result<Box<dyn StreamDecoder>> + Send + Sync,
{
    fn create(&self) -> Result<Box<dyn StreamDecoder>> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixdown_averages_channels() {
        let audio = DecodedAudio {
            channels: vec![vec![1.0, 0.5], vec![0.0, -0.5]],
            sample_rate: 48000,
        };
        assert_eq!(audio.mixdown(0, 2), vec![0.5, 0.0]);
        assert_eq!(audio.frames(), 2);
    }

    #[test]
    fn test_interleave_extremes() {
        let audio = DecodedAudio {
            channels: vec![vec![1.0], vec![-1.0]],
            sample_rate: 24000,
        };
        assert_eq!(audio.interleave_i16(0, 1), vec![32767, -32768]);
    }

    #[test]
    fn test_resample_keeps_duration_and_shape() {
        let audio = DecodedAudio::mono((0..480).map(|i| i as f32 / 480.0).collect(), 24000);

        let up = audio.resample_linear(48000);
        assert_eq!(up.sample_rate, 48000);
        assert_eq!(up.frames(), 960);
        assert!((up.duration_secs() - audio.duration_secs()).abs() < 1e-6);
        assert!((up.channels[0][1] - 0.5 / 480.0).abs() < 1e-6);

        let down = audio.resample_linear(16000);
        assert_eq!(down.frames(), 320);
        assert!((down.channels[0][2] - audio.channels[0][3]).abs() < 1e-6);

        assert_eq!(audio.resample_linear(24000), audio);
    }

    #[test]
    fn test_duration() {
        let audio = DecodedAudio::mono(vec![0.0; 12000], 24000);
        assert!((audio.duration_secs() - 0.5).abs() < 1e-6);
    }
}
