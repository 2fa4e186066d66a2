//! JSON messages exchanged with the command source and the face renderer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::InvalidPresetError;
use crate::motion::EmotionPreset;

/// Raw command datagram from the command source.
#[derive(Deserialize, Debug, Clone)]
pub struct CommandMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub preset: Option<String>,   // emotion
    pub expression: Option<String>, // lip_sync
    pub value: Option<f32>,       // lip_sync
    pub url: Option<String>,      // play_url
}

/// A validated command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Emotion(EmotionPreset),
    LipSync { expression: String, value: f32 },
    PlayUrl(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed command: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("unknown command type '{0}'")]
    UnknownType(String),

    #[error(transparent)]
    InvalidPreset(#[from] InvalidPresetError),
}

impl Command {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let msg: CommandMessage = serde_json::from_str(text)?;
        Self::try_from(msg)
    }
}

impl TryFrom<CommandMessage> for Command {
    type Error = ProtocolError;

    fn try_from(msg: CommandMessage) -> Result<Self, Self::Error> {
        match msg.msg_type.as_str() {
            "emotion" => {
                let preset = msg.preset.ok_or(ProtocolError::MissingField("preset"))?;
                Ok(Command::Emotion(preset.parse()?))
            }
            "lip_sync" => Ok(Command::LipSync {
                expression: msg.expression.ok_or(ProtocolError::MissingField("expression"))?,
                value: msg.value.ok_or(ProtocolError::MissingField("value"))?,
            }),
            "play_url" => Ok(Command::PlayUrl(
                msg.url.ok_or(ProtocolError::MissingField("url"))?,
            )),
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }
}

/// One frame of expression weights for the renderer.
#[derive(Serialize, Debug, Clone)]
pub struct ExpressionFrame<'a> {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub weights: &'a BTreeMap<String, f32>,
}

impl<'a> ExpressionFrame<'a> {
    pub fn new(weights: &'a BTreeMap<String, f32>) -> Self {
        Self {
            msg_type: "expressions",
            weights,
        }
    }
}

/// Reply sent back to the command source when a command is rejected.
#[derive(Serialize, Debug, Clone)]
pub struct ErrorReply {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub message: String,
}

impl ErrorReply {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            msg_type: "error",
            message: message.into(),
        }
    }
}
