//! lipsync_face - audio-driven lip sync and expression blending for an
//! animated character face.

pub mod animation;
pub mod audio;
pub mod command_bridge;
pub mod config;
pub mod error;
pub mod face_bridge;
pub mod motion;
pub mod protocol;

pub use error::{FetchError, InvalidPresetError, PlaybackError};
