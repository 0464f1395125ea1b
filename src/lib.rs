//! snapcam
//!
//! A webcam still-capture page: show the live camera feed, freeze a frame
//! into a canvas, save that canvas as a PNG download, and reveal a small
//! animated decoration on demand.
//!
//! # Features
//!
//! - **headless** (default): in-memory document backend for tests and the CLI
//! - **web**: browser backend over `web-sys`, built for `wasm32`
//! - **Failure isolation**: a missing element disables only the feature that
//!   needs it
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "headless")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::rc::Rc;
//! use snapcam::platform::headless::{HeadlessStream, PageBuilder};
//! use snapcam::{App, PageConfig};
//!
//! let page = Rc::new(PageBuilder::standard().build());
//! page.grant_camera(HeadlessStream::new(640, 480));
//!
//! let app = App::init(page.clone(), PageConfig::default())?;
//! futures::executor::block_on(app.camera_task());
//! page.click("capture");
//! page.click("save");
//! println!("saved {}", page.downloads()[0].filename);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "headless"))]
//! # fn main() {}
//! ```

pub mod error;
pub use error::{Error, Result};

// Platform API surface (document, media, canvas, downloads) and its backends
pub mod platform;

pub mod app;
pub mod camera;
pub mod capture;
pub mod decoration;
pub mod export;

pub use app::{App, FeatureState, FeatureStatus};
pub use camera::CameraOutcome;
pub use capture::{CaptureContext, CaptureOutcome, View};
pub use decoration::{DecorationOutcome, Decorations};
pub use export::{capture_filename, EncodedImage, SaveOutcome};

use platform::MediaConstraints;
use serde::{Deserialize, Serialize};

/// Which calendar the generated file name date is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateBasis {
    /// The user's local date
    #[default]
    Local,
    /// The UTC date (what `Date.toISOString()` yields)
    Utc,
}

/// Ids of the elements the capture page is built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementIds {
    pub video: String,
    pub canvas: String,
    /// Resolved at startup but not otherwise used
    pub overlay_top: String,
    pub capture: String,
    pub save: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            video: "video".to_string(),
            canvas: "canvas".to_string(),
            overlay_top: "overlay-top".to_string(),
            capture: "capture".to_string(),
            save: "save".to_string(),
        }
    }
}

/// A decorative object and the trigger that reveals it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecorationConfig {
    /// Lookup name in the decoration mapping
    pub name: String,
    pub element_id: String,
    pub trigger_id: String,
}

impl DecorationConfig {
    /// Conventional layout: element `<name>`, trigger `add-<name>`
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            element_id: name.to_string(),
            trigger_id: format!("add-{}", name),
        }
    }
}

/// Configuration for the capture page
///
/// The defaults describe the stock page: the element ids it ships with, a
/// single `circle` decoration, PNG downloads named
/// `webcam-capture-<YYYY-MM-DD>.png` using the local date, and a capture
/// guard that waits for the first decoded video frame.
///
/// # Examples
///
/// ```
/// let cfg = snapcam::PageConfig::default();
/// assert_eq!(cfg.filename_prefix, "webcam-capture");
/// assert!(cfg.require_stream_ready);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub ids: ElementIds,
    pub decorations: Vec<DecorationConfig>,
    /// File name prefix; the date and `.png` are appended
    pub filename_prefix: String,
    pub date_basis: DateBasis,
    /// Refuse to capture until the video has a decoded frame
    pub require_stream_ready: bool,
    /// Alert text shown when the camera cannot be opened
    pub camera_error_message: String,
    pub constraints: MediaConstraints,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            ids: ElementIds::default(),
            decorations: vec![DecorationConfig::named("circle")],
            filename_prefix: "webcam-capture".to_string(),
            date_basis: DateBasis::Local,
            require_stream_ready: true,
            camera_error_message: "Could not access the camera. Check permissions.".to_string(),
            constraints: MediaConstraints::default(),
        }
    }
}

impl PageConfig {
    /// Parse a JSON document; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: PageConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let ids = [
            ("video", &self.ids.video),
            ("canvas", &self.ids.canvas),
            ("overlay_top", &self.ids.overlay_top),
            ("capture", &self.ids.capture),
            ("save", &self.ids.save),
        ];
        for (field, id) in ids {
            if id.trim().is_empty() {
                return Err(Error::ConfigError(format!("element id `{}` is empty", field)));
            }
        }
        if self.filename_prefix.trim().is_empty() {
            return Err(Error::ConfigError("filename prefix is empty".to_string()));
        }
        if !self.constraints.video {
            return Err(Error::ConfigError("media constraints must request video".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for deco in &self.decorations {
            if deco.name.is_empty() || deco.element_id.is_empty() || deco.trigger_id.is_empty() {
                return Err(Error::ConfigError(format!("decoration `{}` has an empty field", deco.name)));
            }
            if !seen.insert(deco.name.as_str()) {
                return Err(Error::ConfigError(format!("duplicate decoration `{}`", deco.name)));
            }
        }
        Ok(())
    }
}
