/// Media capture and playback surface

use crate::platform::dom::StyledElement;
use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaState {
    Playing,
    Paused,
}

/// HTML media ready state (`HTMLMediaElement.readyState`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
pub enum ReadyState {
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

impl ReadyState {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => ReadyState::HaveNothing,
            1 => ReadyState::HaveMetadata,
            2 => ReadyState::HaveCurrentData,
            3 => ReadyState::HaveFutureData,
            _ => ReadyState::HaveEnoughData,
        }
    }

    /// Whether a decoded frame is available to draw
    pub fn has_frame(&self) -> bool {
        *self >= ReadyState::HaveCurrentData
    }
}

/// Constraints passed to the platform's user-media request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self { video: true, audio: false }
    }
}

/// A video element that renders a live stream
pub trait VideoSurface: StyledElement {
    /// Opaque live stream handle
    type Stream;

    /// Bind a stream as the element's source object
    fn set_src_object(&self, stream: &Self::Stream);

    fn has_src_object(&self) -> bool;

    fn ready_state(&self) -> ReadyState;

    fn play(&self) -> Result<()>;

    fn pause(&self) -> Result<()>;

    fn media_state(&self) -> MediaState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_state_frame_threshold() {
        assert!(!ReadyState::from_u16(0).has_frame());
        assert!(!ReadyState::from_u16(1).has_frame());
        assert!(ReadyState::from_u16(2).has_frame());
        assert_eq!(ReadyState::from_u16(9), ReadyState::HaveEnoughData);
    }

    #[test]
    fn default_constraints_are_video_only() {
        let c = MediaConstraints::default();
        assert!(c.video);
        assert!(!c.audio);
    }
}
