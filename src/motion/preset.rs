use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InvalidPresetError;

/// Emotion presets. `Neutral` is the resting face; every other preset is
/// an active emotion with its own expression weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionPreset {
    #[default]
    Neutral,
    Happy,
    Angry,
    Sad,
    Relaxed,
    Surprised,
}

impl EmotionPreset {
    pub const ALL: [EmotionPreset; 6] = [
        EmotionPreset::Neutral,
        EmotionPreset::Happy,
        EmotionPreset::Angry,
        EmotionPreset::Sad,
        EmotionPreset::Relaxed,
        EmotionPreset::Surprised,
    ];

    /// Expression name written to the sink.
    pub fn expression_name(self) -> &'static str {
        match self {
            EmotionPreset::Neutral => "neutral",
            EmotionPreset::Happy => "happy",
            EmotionPreset::Angry => "angry",
            EmotionPreset::Sad => "sad",
            EmotionPreset::Relaxed => "relaxed",
            EmotionPreset::Surprised => "surprised",
        }
    }

    pub fn is_neutral(self) -> bool {
        self == EmotionPreset::Neutral
    }
}

impl fmt::Display for EmotionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.expression_name())
    }
}

impl FromStr for EmotionPreset {
    type Err = InvalidPresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.expression_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| InvalidPresetError(s.to_string()))
    }
}
