use std::collections::BTreeMap;

/// Receiver of expression weight writes, typically a morph-target runtime.
/// The last write for a name wins.
pub trait ExpressionSink {
    fn set_value(&mut self, name: &str, weight: f32);
}

/// In-memory weight table. Also tracks whether anything changed since the
/// last [`ExpressionWeights::take_dirty`] so a bridge can skip idle frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionWeights {
    weights: BTreeMap<String, f32>,
    dirty: bool,
}

impl ExpressionWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> f32 {
        self.weights.get(name).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.weights.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn as_map(&self) -> &BTreeMap<String, f32> {
        &self.weights
    }

    /// Returns true once after any change.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

impl ExpressionSink for ExpressionWeights {
    fn set_value(&mut self, name: &str, weight: f32) {
        let weight = weight.clamp(0.0, 1.0);
        match self.weights.get_mut(name) {
            Some(w) if *w == weight => {}
            Some(w) => {
                *w = weight;
                self.dirty = true;
            }
            None => {
                self.weights.insert(name.to_string(), weight);
                self.dirty = true;
            }
        }
    }
}
