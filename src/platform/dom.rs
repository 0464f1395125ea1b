/// Document primitives: styled elements and click triggers

use crate::Result;
use serde::{Deserialize, Serialize};

/// Value of an element's inline `display` property.
///
/// `Unset` means no inline value, so the stylesheet decides (treated as
/// visible, which is how the page's video starts out).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Display {
    #[default]
    Unset,
    Block,
    None,
}

impl Display {
    pub fn as_css(&self) -> &'static str {
        match self {
            Display::Unset => "",
            Display::Block => "block",
            Display::None => "none",
        }
    }

    pub fn from_css(value: &str) -> Self {
        match value.trim() {
            "none" => Display::None,
            "" => Display::Unset,
            // any other box type renders the element
            _ => Display::Block,
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, Display::None)
    }
}

/// Value of an element's inline `animation-play-state` property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationPlayState {
    #[default]
    Unset,
    Running,
    Paused,
}

impl AnimationPlayState {
    pub fn as_css(&self) -> &'static str {
        match self {
            AnimationPlayState::Unset => "",
            AnimationPlayState::Running => "running",
            AnimationPlayState::Paused => "paused",
        }
    }

    pub fn from_css(value: &str) -> Self {
        match value.trim() {
            "running" => AnimationPlayState::Running,
            "paused" => AnimationPlayState::Paused,
            _ => AnimationPlayState::Unset,
        }
    }
}

/// An element whose inline style the page reads and writes
pub trait StyledElement {
    /// The element's `id` attribute
    fn id(&self) -> String;

    fn display(&self) -> Display;

    fn set_display(&self, display: Display) -> Result<()>;

    fn animation_play_state(&self) -> AnimationPlayState;

    fn set_animation_play_state(&self, state: AnimationPlayState) -> Result<()>;
}

/// Activation event delivered to click handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    /// Id of the element that was activated
    pub trigger_id: String,
}

impl ClickEvent {
    pub fn new(trigger_id: impl Into<String>) -> Self {
        Self { trigger_id: trigger_id.into() }
    }
}

/// Handler attached to a trigger. Handlers run to completion on the page's
/// single thread, so they are neither `Send` nor `Sync`.
pub type ClickHandler = Box<dyn Fn(&ClickEvent)>;

/// An element that can be activated by the user (a button)
pub trait Trigger {
    fn id(&self) -> String;

    /// Attach a click handler. Handlers stay attached for the page lifetime.
    fn on_click(&self, handler: ClickHandler) -> Result<()>;
}
