use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use lipsync_face::audio::envelope::{gate, squash};
use lipsync_face::audio::{
    AudioFetcher, AudioOutput, CaptureTap, DecodedAudio, LipSync, OnEnded, PlayOptions,
    PlaybackRouter, StreamDecoder, SymphoniaDecoder, VoiceTap,
};
use lipsync_face::motion::{
    BlinkAutomaton, BlinkConfig, EmotionPreset, ExpressionController, ExpressionWeights,
};
use lipsync_face::{FetchError, PlaybackError};

/// Writes everything to the tap, then holds the voice open until released.
struct HoldingOutput {
    release: Mutex<mpsc::Receiver<()>>,
}

impl AudioOutput for HoldingOutput {
    fn play(&self, audio: &DecodedAudio, voice: &VoiceTap) -> anyhow::Result<()> {
        voice.write(&audio.mixdown(0, audio.frames()));
        let release = self.release.lock().unwrap();
        let _ = release.recv_timeout(Duration::from_secs(5));
        Ok(())
    }
}

struct StaticFetcher(Bytes);

#[async_trait]
impl AudioFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> Result<Bytes, FetchError> {
        Ok(self.0.clone())
    }
}

fn pcm16(samples: &[i16]) -> Bytes {
    Bytes::from(samples.iter().flat_map(|s| s.to_le_bytes()).collect::<Vec<u8>>())
}

fn wav(samples: &[i16], sample_rate: u32) -> Bytes {
    let data_len = (samples.len() * 2) as u32;
    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend(samples.iter().flat_map(|s| s.to_le_bytes()));
    Bytes::from(out)
}

fn router(fetched: Bytes) -> (PlaybackRouter, mpsc::Sender<()>) {
    let (release_tx, release_rx) = mpsc::channel();
    let factory = || -> anyhow::Result<Box<dyn StreamDecoder>> { Ok(Box::new(SymphoniaDecoder::new())) };
    let router = PlaybackRouter::new(
        Arc::new(factory),
        Arc::new(HoldingOutput {
            release: Mutex::new(release_rx),
        }),
        Arc::new(StaticFetcher(fetched)),
        CaptureTap::new(2048),
    );
    (router, release_tx)
}

fn counter() -> (Arc<AtomicUsize>, OnEnded) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    let cb: OnEnded = Box::new(move || {
        c.fetch_add(1, Ordering::SeqCst);
    });
    (count, cb)
}

async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

fn fixed_blink() -> BlinkAutomaton {
    BlinkAutomaton::with_seed(
        BlinkConfig {
            close_duration: 0.1,
            closed_duration: 0.05,
            open_duration: 0.1,
            hold_min: 1.0,
            hold_jitter: 0.0,
        },
        11,
    )
}

#[tokio::test]
async fn test_speech_drives_mouth_until_playback_ends() {
    let (router, release) = router(Bytes::new());
    let mut lip_sync = LipSync::new(router.tap().clone());
    let mut controller = ExpressionController::with_blink(ExpressionWeights::new(), fixed_blink());
    let (ended, on_ended) = counter();

    router
        .play(pcm16(&[0, 9000, -12000, 4000]), PlayOptions::raw_pcm16(24000), Some(on_ended))
        .await
        .unwrap();
    assert!(eventually(|| router.tap().active_voices() == 1).await);

    let volume = lip_sync.update().volume;
    assert!(volume > 0.9, "volume {}", volume);
    controller.set_lip_sync("aa", volume);
    controller.update(1.0 / 60.0);
    assert!((controller.sink().get("aa") - volume * 0.5).abs() < 1e-5);

    release.send(()).unwrap();
    assert!(eventually(|| ended.load(Ordering::SeqCst) == 1).await);
    assert!(eventually(|| router.tap().active_voices() == 0).await);
    assert_eq!(lip_sync.update().volume, 0.0);
}

#[tokio::test]
async fn test_concurrent_plays_superpose_and_each_complete() {
    let (router, release) = router(Bytes::new());
    let mut lip_sync = LipSync::new(router.tap().clone());
    let (ended, _) = counter();

    for _ in 0..2 {
        let c = ended.clone();
        let cb: OnEnded = Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        router
            .play(pcm16(&[1200; 64]), PlayOptions::raw_pcm16(16000), Some(cb))
            .await
            .unwrap();
    }
    assert!(eventually(|| router.tap().active_voices() == 2).await);

    // 1200/32767 alone is under the gate; two voices together pass it.
    assert_eq!(gate(squash(1200.0 / 32767.0)), 0.0);
    let volume = lip_sync.update().volume;
    assert!(volume > 0.1, "volume {}", volume);

    release.send(()).unwrap();
    release.send(()).unwrap();
    assert!(eventually(|| ended.load(Ordering::SeqCst) == 2).await);
}

#[tokio::test]
async fn test_play_from_url_decodes_container() {
    let samples: Vec<i16> = (0..2400).map(|i| ((i as f32 * 0.05).sin() * 20000.0) as i16).collect();
    let (router, release) = router(wav(&samples, 24000));
    let mut lip_sync = LipSync::new(router.tap().clone());
    let (ended, on_ended) = counter();

    router.play_from_url("http://localhost/voice.wav", Some(on_ended)).await.unwrap();
    assert!(eventually(|| router.tap().active_voices() == 1).await);
    assert!(lip_sync.update().volume > 0.9);

    release.send(()).unwrap();
    assert!(eventually(|| ended.load(Ordering::SeqCst) == 1).await);
}

#[tokio::test]
async fn test_empty_buffer_is_silent_and_completes_once() {
    let (router, _release) = router(Bytes::new());
    let (ended, on_ended) = counter();

    let err = router.play(Bytes::new(), PlayOptions::default(), Some(on_ended)).await.unwrap_err();
    assert!(matches!(err, PlaybackError::InvalidInput(_)));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(ended.load(Ordering::SeqCst), 1);
    assert_eq!(router.tap().active_voices(), 0);
}

#[test]
fn test_emotion_onset_waits_for_blink_to_resolve() {
    let mut controller = ExpressionController::with_blink(ExpressionWeights::new(), fixed_blink());
    controller.update(1.0);
    controller.update(0.05);
    assert!((controller.blink().remaining_until_open() - 0.2).abs() < 1e-4);

    controller.set_emotion(EmotionPreset::Happy);
    controller.update(0.1);
    assert_eq!(controller.sink().get("happy"), 0.0);
    controller.update(0.15);
    assert_eq!(controller.sink().get("happy"), 1.0);
}

#[test]
fn test_lip_sync_damped_under_emotion() {
    let mut controller = ExpressionController::with_blink(ExpressionWeights::new(), fixed_blink());
    controller.set_lip_sync("aa", 0.8);
    controller.update(0.016);
    assert!((controller.sink().get("aa") - 0.4).abs() < 1e-5);

    controller.set_emotion("angry".parse().unwrap());
    controller.update(0.016);
    assert!((controller.sink().get("aa") - 0.2).abs() < 1e-5);

    controller.set_lip_sync("ih", 0.6);
    assert_eq!(controller.sink().get("aa"), 0.0);
    controller.update(0.016);
    assert!((controller.sink().get("ih") - 0.15).abs() < 1e-5);
}
