//! Platform API surface: document lookup, media capture, canvas, downloads
//!
//! The page logic only talks to these traits. Two backends implement them:
//! `web` (the browser, through `web-sys`) and `headless` (an in-memory
//! document used by tests, benches and the CLI).

pub mod dom;
pub mod media;
pub mod raster;

#[cfg(feature = "headless")]
pub mod headless;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

pub use dom::{AnimationPlayState, ClickEvent, ClickHandler, Display, StyledElement, Trigger};
pub use media::{MediaConstraints, MediaState, ReadyState, VideoSurface};
pub use raster::{DrawingContext, RasterSurface};

use crate::{DateBasis, Result};
use chrono::NaiveDate;
use futures::future::LocalBoxFuture;

/// A client-side download: an anchor with `href` and `download` set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Suggested file name
    pub filename: String,
    /// Resource to download (a `data:` URL for captures)
    pub href: String,
}

/// Everything the page needs from its host environment.
///
/// Element handles are cheap clones referring to the same underlying node.
pub trait Platform {
    type Stream: 'static;
    type Element: StyledElement + Clone + 'static;
    type Trigger: Trigger + 'static;
    type Video: VideoSurface<Stream = Self::Stream> + Clone + 'static;
    type Canvas: RasterSurface<Source = Self::Video> + Clone + 'static;

    /// Resolve a plain element by id
    fn element(&self, id: &str) -> Option<Self::Element>;

    /// Resolve a clickable element by id
    fn trigger(&self, id: &str) -> Option<Self::Trigger>;

    fn video(&self, id: &str) -> Option<Self::Video>;

    fn canvas(&self, id: &str) -> Option<Self::Canvas>;

    /// Ask for a live stream. The future may never complete (the user
    /// ignores the permission prompt).
    fn get_user_media(&self, constraints: &MediaConstraints) -> LocalBoxFuture<'static, Result<Self::Stream>>;

    /// Insert a transient anchor, activate it and remove it again
    fn trigger_download(&self, request: &DownloadRequest) -> Result<()>;

    /// Show a blocking user-visible notification
    fn alert(&self, message: &str);

    /// Current calendar date used for file names
    fn today(&self, basis: DateBasis) -> NaiveDate {
        system_today(basis)
    }
}

/// Today's date from the system clock
pub fn system_today(basis: DateBasis) -> NaiveDate {
    match basis {
        DateBasis::Local => chrono::Local::now().date_naive(),
        DateBasis::Utc => chrono::Utc::now().date_naive(),
    }
}
