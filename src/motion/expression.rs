//! Expression blend controller.
//!
//! Composes the emotion, blink and lip-sync channels into weight writes on a
//! single [`ExpressionSink`]. The controller is the only writer; delayed
//! emotion onsets are timers advanced by `update`, so they land on the same
//! context that owns the sink.

use super::blink::{BLINK_EXPRESSION, BlinkAutomaton, BlinkConfig};
use super::preset::EmotionPreset;
use super::sink::ExpressionSink;

/// Lip-sync gain while the face is neutral.
const LIP_SYNC_GAIN_NEUTRAL: f32 = 0.5;
/// Lip-sync gain under an active emotion, so the mouth does not fight it.
const LIP_SYNC_GAIN_EMOTION: f32 = 0.25;

#[derive(Debug, Clone, PartialEq)]
struct LipSyncEntry {
    expression: String,
    intensity: f32,
}

/// An emotion weight write waiting for the blink to resolve.
#[derive(Debug, Clone, Copy)]
struct PendingEmotion {
    preset: EmotionPreset,
    generation: u64,
    remaining: f32,
}

pub struct ExpressionController<S: ExpressionSink> {
    sink: S,
    blink: BlinkAutomaton,
    current_emotion: EmotionPreset,
    lip_sync: Option<LipSyncEntry>,
    pending: Vec<PendingEmotion>,
    generation: u64,
}

impl<S: ExpressionSink> ExpressionController<S> {
    pub fn new(sink: S, blink_config: BlinkConfig) -> Self {
        Self::with_blink(sink, BlinkAutomaton::new(blink_config))
    }

    pub fn with_blink(sink: S, blink: BlinkAutomaton) -> Self {
        Self {
            sink,
            blink,
            current_emotion: EmotionPreset::Neutral,
            lip_sync: None,
            pending: Vec::new(),
            generation: 0,
        }
    }

    pub fn current_emotion(&self) -> EmotionPreset {
        self.current_emotion
    }

    pub fn blink(&self) -> &BlinkAutomaton {
        &self.blink
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Number of emotion onsets still waiting on a blink.
    pub fn pending_transitions(&self) -> usize {
        self.pending.len()
    }

    /// Switch emotion.
    ///
    /// An active emotion is zeroed right away. A new active emotion waits
    /// until any in-flight blink has reopened the eyes before its weight
    /// goes to 1; a later call supersedes a still-pending onset.
    pub fn set_emotion(&mut self, preset: EmotionPreset) {
        if !self.current_emotion.is_neutral() {
            self.sink.set_value(self.current_emotion.expression_name(), 0.0);
        }

        self.generation += 1;

        if preset.is_neutral() {
            self.blink.set_enable(true);
            self.current_emotion = preset;
            return;
        }

        let delay = self.blink.set_enable(false);
        self.current_emotion = preset;
        log::debug!("Emotion -> {} (onset in {:.3}s)", preset, delay);

        if delay <= 0.0 {
            self.sink.set_value(preset.expression_name(), 1.0);
        } else {
            self.pending.push(PendingEmotion {
                preset,
                generation: self.generation,
                remaining: delay,
            });
        }
    }

    /// Replace the lip-sync channel, zeroing the previous expression first.
    pub fn set_lip_sync(&mut self, expression: &str, intensity: f32) {
        if let Some(prev) = self.lip_sync.take() {
            self.sink.set_value(&prev.expression, 0.0);
        }
        self.lip_sync = Some(LipSyncEntry {
            expression: expression.to_string(),
            intensity: intensity.clamp(0.0, 1.0),
        });
    }

    pub fn update(&mut self, delta: f32) {
        self.blink.update(delta);
        self.fire_due_transitions(delta);
        self.sink.set_value(BLINK_EXPRESSION, self.blink.weight());

        if let Some(entry) = &self.lip_sync {
            let gain = if self.current_emotion.is_neutral() {
                LIP_SYNC_GAIN_NEUTRAL
            } else {
                LIP_SYNC_GAIN_EMOTION
            };
            self.sink.set_value(&entry.expression, entry.intensity * gain);
        }
    }

    fn fire_due_transitions(&mut self, delta: f32) {
        let generation = self.generation;
        let sink = &mut self.sink;
        self.pending.retain_mut(|p| {
            p.remaining -= delta;
            if p.remaining > 0.0 {
                return true;
            }
            if p.generation == generation {
                sink.set_value(p.preset.expression_name(), 1.0);
            } else {
                log::trace!("Dropping superseded onset of {}", p.preset);
            }
            false
        });
    }
}
