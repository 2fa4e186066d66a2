//! Peak envelope extraction for lip sync.
//!
//! The extractor turns a window of time-domain samples into a single
//! speaking intensity in [0, 1]: peak amplitude, logistic squash, noise gate.

/// Reference window length, matching the capture tap.
pub const DEFAULT_WINDOW_SIZE: usize = 2048;

/// Logistic slope applied to the peak amplitude.
const SQUASH_GAIN: f32 = 45.0;
/// Logistic offset; the curve crosses 0.5 at a peak of 5/45.
const SQUASH_OFFSET: f32 = 5.0;
/// Squashed values below this are treated as hiss and reported as 0.
pub const NOISE_GATE: f32 = 0.1;

/// Fixed-length buffer of time-domain samples.
///
/// The length never changes after construction; the capture tap overwrites
/// the contents in place.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: Box<[f32]>,
}

impl SampleWindow {
    pub fn new(len: usize) -> Self {
        Self {
            samples: vec![0.0; len].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Mutable access for the writer. The slice length is fixed.
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

/// Stateless peak envelope extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeExtractor;

impl EnvelopeExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Compute the gated volume for the current window contents.
    pub fn poll(&self, window: &SampleWindow) -> f32 {
        gate(squash(peak_amplitude(window.samples())))
    }
}

/// Largest absolute sample value. NaN samples are ignored.
pub fn peak_amplitude(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
}

/// Logistic curve: near zero for quiet peaks, saturating above ~0.12.
pub fn squash(peak: f32) -> f32 {
    1.0 / (1.0 + (-SQUASH_GAIN * peak + SQUASH_OFFSET).exp())
}

/// Force values under the noise gate to exactly zero.
pub fn gate(value: f32) -> f32 {
    if value < NOISE_GATE { 0.0 } else { value.min(1.0) }
}
