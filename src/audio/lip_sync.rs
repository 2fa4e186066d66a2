//! Lip-sync analyser: capture tap → SampleWindow → envelope.

use super::capture_tap::CaptureTap;
use super::envelope::{EnvelopeExtractor, SampleWindow};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LipSyncAnalyzeResult {
    pub volume: f32,
}

/// Polls the capture tap once per tick and reports the speaking volume.
pub struct LipSync {
    tap: CaptureTap,
    window: SampleWindow,
    extractor: EnvelopeExtractor,
}

impl LipSync {
    pub fn new(tap: CaptureTap) -> Self {
        let window = SampleWindow::new(tap.window_size());
        Self {
            tap,
            window,
            extractor: EnvelopeExtractor::new(),
        }
    }

    pub fn update(&mut self) -> LipSyncAnalyzeResult {
        self.tap.fill_window(&mut self.window);
        LipSyncAnalyzeResult {
            volume: self.extractor.poll(&self.window),
        }
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_follows_tap() {
        let tap = CaptureTap::new(256);
        let mut lip_sync = LipSync::new(tap.clone());
        assert_eq!(lip_sync.update().volume, 0.0);

        let voice = tap.open_voice();
        voice.write(&[0.0, 0.3, -0.2]);
        assert!(lip_sync.update().volume > 0.9);

        drop(voice);
        assert_eq!(lip_sync.update().volume, 0.0);
        assert_eq!(lip_sync.window().len(), 256);
    }
}
