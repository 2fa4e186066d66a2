//! motion - Facial expression composition
//!
//! Emotion presets, the blink automaton and the lip-sync channel are
//! blended by [`ExpressionController`] into one stream of weight writes.

pub mod blink;
pub mod expression;
pub mod preset;
pub mod sink;

pub use blink::{BLINK_EXPRESSION, BlinkAutomaton, BlinkConfig, BlinkPhase};
pub use expression::ExpressionController;
pub use preset::EmotionPreset;
pub use sink::{ExpressionSink, ExpressionWeights};
