//! Per-tick glue between playback and the expression controller.
//!
//! While any playback is active the lip-sync channel follows the audio
//! envelope. When nothing is playing the last commanded lip-sync entry is
//! left alone, so explicit `lip_sync` commands stick.

use crate::audio::LipSync;
use crate::motion::{ExpressionController, ExpressionSink};

pub struct FaceAnimator<S: ExpressionSink> {
    controller: ExpressionController<S>,
    lip_sync: LipSync,
    /// Expression the envelope drives during speech.
    mouth_expression: String,
    active_playbacks: usize,
}

impl<S: ExpressionSink> FaceAnimator<S> {
    pub fn new(controller: ExpressionController<S>, lip_sync: LipSync, mouth_expression: impl Into<String>) -> Self {
        Self {
            controller,
            lip_sync,
            mouth_expression: mouth_expression.into(),
            active_playbacks: 0,
        }
    }

    pub fn controller(&self) -> &ExpressionController<S> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ExpressionController<S> {
        &mut self.controller
    }

    pub fn mouth_expression(&self) -> &str {
        &self.mouth_expression
    }

    pub fn active_playbacks(&self) -> usize {
        self.active_playbacks
    }

    pub fn is_speaking(&self) -> bool {
        self.active_playbacks > 0
    }

    pub fn playback_started(&mut self) {
        self.active_playbacks += 1;
    }

    /// Closes the mouth once the last playback has ended.
    pub fn playback_ended(&mut self) {
        self.active_playbacks = self.active_playbacks.saturating_sub(1);
        log::debug!("Playback ended, {} still active", self.active_playbacks);
        if self.active_playbacks == 0 {
            self.controller.set_lip_sync(&self.mouth_expression, 0.0);
        }
    }

    /// Explicit lip-sync command.
    ///
    /// The expression also becomes the one the envelope drives from now on;
    /// during speech the value is overwritten on the next tick.
    pub fn command_lip_sync(&mut self, expression: &str, value: f32) {
        self.mouth_expression = expression.to_string();
        self.controller.set_lip_sync(expression, value);
    }

    /// One animation frame.
    pub fn tick(&mut self, delta: f32) {
        if self.is_speaking() {
            let volume = self.lip_sync.update().volume;
            self.controller.set_lip_sync(&self.mouth_expression, volume);
        }
        self.controller.update(delta);
    }
}
