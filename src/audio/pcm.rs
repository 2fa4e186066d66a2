//! Raw PCM16 handling: sample conversion and a plausibility heuristic.

use super::stream_decoder::DecodedAudio;
use crate::error::{PlaybackError, Result};

/// Number of leading samples inspected by [`detect_pcm16`].
const DETECT_SAMPLES: usize = 1000;

/// Convert one signed 16-bit sample to float.
///
/// Negative values divide by 32768 and non-negative by 32767 so both
/// extremes land exactly on ±1.0.
pub fn i16_to_float(sample: i16) -> f32 {
    if sample < 0 {
        sample as f32 / 32768.0
    } else {
        sample as f32 / 32767.0
    }
}

/// Interpret `data` as little-endian PCM16 and wrap it as mono audio.
pub fn decode_pcm16(data: &[u8], sample_rate: u32) -> Result<DecodedAudio> {
    if data.is_empty() {
        return Err(PlaybackError::InvalidInput("buffer is empty".into()));
    }
    if data.len() % 2 != 0 {
        return Err(PlaybackError::InvalidInput(format!(
            "PCM16 buffer has odd length {}",
            data.len()
        )));
    }

    let samples = data
        .chunks_exact(2)
        .map(|b| i16_to_float(i16::from_le_bytes([b[0], b[1]])))
        .collect();

    Ok(DecodedAudio::mono(samples, sample_rate))
}

/// Guess whether `data` looks like raw PCM16 speech.
///
/// True when the length is even and more than 10% of the first 1000
/// samples are non-zero. Every i16 is in range by construction, so the
/// range check the heuristic describes always passes. This is a
/// standalone utility: the router never uses it to pick a decode path.
pub fn detect_pcm16(data: &[u8]) -> bool {
    if data.len() % 2 != 0 {
        return false;
    }

    let inspected = (data.len() / 2).min(DETECT_SAMPLES);
    let non_zero = data
        .chunks_exact(2)
        .take(inspected)
        .filter(|b| i16::from_le_bytes([b[0], b[1]]) != 0)
        .count();

    non_zero as f32 > inspected as f32 * 0.1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::stream_decoder::float_to_i16;

    fn encode(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_extremes_map_exactly() {
        assert_eq!(i16_to_float(i16::MAX), 1.0);
        assert_eq!(i16_to_float(i16::MIN), -1.0);
        assert_eq!(i16_to_float(0), 0.0);
    }

    #[test]
    fn test_float_round_trip_within_one_step() {
        let step = 1.0 / 32767.0;
        for x in [-1.0f32, -0.73, -0.25, -1e-4, 0.0, 0.1, 0.5, 0.999, 1.0] {
            let bytes = encode(&[float_to_i16(x)]);
            let audio = decode_pcm16(&bytes, 24000).unwrap();
            let back = audio.channels[0][0];
            assert!((back - x).abs() <= step, "x={} back={}", x, back);
        }
    }

    #[test]
    fn test_decode_sets_rate_and_single_channel() {
        let audio = decode_pcm16(&encode(&[100, -100, 32767]), 16000).unwrap();
        assert_eq!(audio.sample_rate, 16000);
        assert_eq!(audio.channel_count(), 1);
        assert_eq!(audio.frames(), 3);
    }

    #[test]
    fn test_rejects_empty_and_odd() {
        assert!(matches!(
            decode_pcm16(&[], 24000),
            Err(PlaybackError::InvalidInput(_))
        ));
        assert!(matches!(
            decode_pcm16(&[1, 2, 3], 24000),
            Err(PlaybackError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_detect_pcm16() {
        let speech: Vec<i16> = (0..2000).map(|i| ((i as f32 * 0.3).sin() * 8000.0) as i16).collect();
        assert!(detect_pcm16(&encode(&speech)));

        // Mostly silence
        let mut sparse = vec![0i16; 1000];
        sparse[10] = 5;
        assert!(!detect_pcm16(&encode(&sparse)));

        assert!(!detect_pcm16(&[0x01, 0x02, 0x03]));
        assert!(!detect_pcm16(&[]));
    }
}
