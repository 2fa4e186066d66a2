//! Capture tap shared by all playing voices.
//!
//! Each playback registers a voice and writes the samples it has just sent
//! to the device. The lip-sync analyser copies the superposition of the most
//! recent `window_size` samples of every live voice into its SampleWindow.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::envelope::SampleWindow;

#[derive(Debug)]
struct VoiceRing {
    buf: Vec<f32>,
    pos: usize,
}

impl VoiceRing {
    fn new(len: usize) -> Self {
        Self {
            buf: vec![0.0; len],
            pos: 0,
        }
    }

    fn push(&mut self, samples: &[f32]) {
        let len = self.buf.len();
        // Only the tail can survive in the ring.
        let samples = &samples[samples.len().saturating_sub(len)..];
        for s in samples {
            self.buf[self.pos] = *s;
            self.pos = (self.pos + 1) % len;
        }
    }

    /// Add the ring contents, oldest first, onto `out`.
    fn accumulate(&self, out: &mut [f32]) {
        let len = self.buf.len();
        for (i, o) in out.iter_mut().enumerate() {
            *o += self.buf[(self.pos + i) % len];
        }
    }
}

#[derive(Debug)]
struct TapInner {
    window_size: usize,
    voices: HashMap<u64, VoiceRing>,
}

/// Cloneable handle to the shared capture tap.
#[derive(Debug, Clone)]
pub struct CaptureTap {
    inner: Arc<Mutex<TapInner>>,
    next_id: Arc<AtomicU64>,
}

impl CaptureTap {
    pub fn new(window_size: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TapInner {
                window_size: window_size.max(1),
                voices: HashMap::new(),
            })),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TapInner> {
        // A panicking writer leaves only sample data behind, which is safe to keep reading.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn window_size(&self) -> usize {
        self.lock().window_size
    }

    /// Register a new voice. It is removed when the returned handle drops.
    pub fn open_voice(&self) -> VoiceTap {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.lock();
        let ring = VoiceRing::new(inner.window_size);
        inner.voices.insert(id, ring);
        VoiceTap {
            id,
            tap: self.clone(),
        }
    }

    pub fn active_voices(&self) -> usize {
        self.lock().voices.len()
    }

    /// Overwrite `window` with the sum of all live voices.
    ///
    /// A window whose length differs from the tap's is aligned to the most
    /// recent samples.
    pub fn fill_window(&self, window: &mut SampleWindow) {
        let inner = self.lock();
        let out = window.samples_mut();
        out.fill(0.0);

        let n = out.len().min(inner.window_size);
        let offset = out.len() - n;
        let mut mix = vec![0.0f32; inner.window_size];
        for voice in inner.voices.values() {
            voice.accumulate(&mut mix);
        }
        out[offset..].copy_from_slice(&mix[inner.window_size - n..]);
    }
}

/// Write side of one playing voice.
#[derive(Debug)]
pub struct VoiceTap {
    id: u64,
    tap: CaptureTap,
}

impl VoiceTap {
    pub fn write(&self, samples: &[f32]) {
        if let Some(voice) = self.tap.lock().voices.get_mut(&self.id) {
            voice.push(samples);
        }
    }
}

impl Drop for VoiceTap {
    fn drop(&mut self) {
        self.tap.lock().voices.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_is_visible_until_dropped() {
        let tap = CaptureTap::new(8);
        let mut window = SampleWindow::new(8);

        let voice = tap.open_voice();
        voice.write(&[0.1, 0.2, 0.3]);
        tap.fill_window(&mut window);
        assert_eq!(&window.samples()[5..], &[0.1, 0.2, 0.3]);

        drop(voice);
        assert_eq!(tap.active_voices(), 0);
        tap.fill_window(&mut window);
        assert!(window.samples().iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_concurrent_voices_superpose() {
        let tap = CaptureTap::new(4);
        let mut window = SampleWindow::new(4);

        let a = tap.open_voice();
        let b = tap.open_voice();
        a.write(&[0.25; 4]);
        b.write(&[0.5; 4]);
        tap.fill_window(&mut window);
        assert!(window.samples().iter().all(|s| (*s - 0.75).abs() < 1e-6));
    }

    #[test]
    fn test_ring_keeps_latest_samples() {
        let tap = CaptureTap::new(3);
        let mut window = SampleWindow::new(3);
        let voice = tap.open_voice();
        voice.write(&[1.0, 2.0]);
        voice.write(&[3.0, 4.0, 5.0, 6.0]);
        tap.fill_window(&mut window);
        assert_eq!(window.samples(), &[4.0, 5.0, 6.0]);
    }
}
