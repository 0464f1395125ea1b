//! Application context: resolve the page once and wire every trigger
//!
//! Each feature group is gated on its own elements. The capture and save
//! triggers form one all-or-nothing group; every decoration trigger is its
//! own group. A group that cannot be wired logs why and stays inert while
//! the rest of the page keeps working.

use crate::camera::{self, CameraOutcome};
use crate::capture::{self, CaptureBindings, CaptureContext};
use crate::decoration::{self, Decorations};
use crate::export;
use crate::platform::{ClickEvent, Platform, Trigger};
use crate::{Error, PageConfig, Result};
use log::{debug, error};
use serde::Serialize;
use std::future::Future;
use std::rc::Rc;

/// Whether a feature group was wired at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum FeatureState {
    Enabled,
    Disabled { missing: Vec<String> },
}

impl FeatureState {
    pub fn is_enabled(&self) -> bool {
        matches!(self, FeatureState::Enabled)
    }
}

/// Startup report for every feature group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureStatus {
    /// Capture and save, wired together
    pub capture: FeatureState,
    /// One entry per configured decoration, in configuration order
    pub decorations: Vec<(String, FeatureState)>,
}

/// The page's application context, built once at startup
pub struct App<P: Platform> {
    platform: Rc<P>,
    config: Rc<PageConfig>,
    capture: Option<Rc<CaptureContext<P>>>,
    decorations: Rc<Decorations<P::Element>>,
    overlay: Option<P::Element>,
    status: FeatureStatus,
}

impl<P: Platform + 'static> App<P> {
    /// Resolve elements and attach handlers. Only an invalid configuration
    /// or a platform refusing a listener is an error; missing elements just
    /// disable their feature group.
    pub fn init(platform: Rc<P>, config: PageConfig) -> Result<Self> {
        config.validate()?;
        let config = Rc::new(config);

        let overlay = platform.element(&config.ids.overlay_top);
        if overlay.is_none() {
            debug!("Overlay element '{}' not found", config.ids.overlay_top);
        }

        let (capture, capture_state) = match CaptureContext::resolve(platform.as_ref(), config.clone()) {
            Ok(bindings) => (Some(Self::wire_capture(&platform, bindings)?), FeatureState::Enabled),
            Err(Error::MissingElements(missing)) => {
                error!(
                    "Cannot fully initialize application: missing required elements or context ({})",
                    missing.join(", ")
                );
                (None, FeatureState::Disabled { missing })
            }
            Err(e) => return Err(e),
        };

        let decorations = Rc::new(Decorations::resolve(platform.as_ref(), &config.decorations));
        let mut decoration_states = Vec::with_capacity(config.decorations.len());
        for deco in &config.decorations {
            let state = match platform.trigger(&deco.trigger_id) {
                Some(trigger) => {
                    let objects = decorations.clone();
                    let name = deco.name.clone();
                    trigger.on_click(Box::new(move |_event: &ClickEvent| {
                        if let Err(e) = decoration::enable_object(&*objects, &name) {
                            error!("Failed to enable '{}': {}", name, e);
                        }
                    }))?;
                    FeatureState::Enabled
                }
                None => {
                    debug!("Decoration trigger '{}' not found; '{}' stays hidden", deco.trigger_id, deco.name);
                    FeatureState::Disabled { missing: vec![deco.trigger_id.clone()] }
                }
            };
            decoration_states.push((deco.name.clone(), state));
        }

        Ok(Self {
            platform,
            config,
            capture,
            decorations,
            overlay,
            status: FeatureStatus {
                capture: capture_state,
                decorations: decoration_states,
            },
        })
    }

    fn wire_capture(platform: &Rc<P>, bindings: CaptureBindings<P>) -> Result<Rc<CaptureContext<P>>> {
        let CaptureBindings { context, capture, save } = bindings;
        let ctx = Rc::new(context);

        let on_capture = ctx.clone();
        capture.on_click(Box::new(move |event: &ClickEvent| {
            if let Err(e) = capture::on_capture(&on_capture, event) {
                error!("Capture failed: {}", e);
            }
        }))?;

        let on_save = ctx.clone();
        let host = platform.clone();
        save.on_click(Box::new(move |event: &ClickEvent| {
            if let Err(e) = export::on_save(host.as_ref(), &on_save, event) {
                error!("Save failed: {}", e);
            }
        }))?;

        debug!("Capture and save triggers attached");
        Ok(ctx)
    }

    /// The one-shot camera request. Spawn it on the page's executor; it is
    /// independent of wiring, so it runs even when capture is disabled.
    pub fn camera_task(&self) -> impl Future<Output = CameraOutcome> + 'static {
        camera::start_camera(
            self.platform.clone(),
            self.platform.video(&self.config.ids.video),
            self.config.constraints,
            self.config.camera_error_message.clone(),
        )
    }

    pub fn status(&self) -> &FeatureStatus {
        &self.status
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn platform(&self) -> &Rc<P> {
        &self.platform
    }

    /// Shared capture context, if the capture group was wired
    pub fn capture(&self) -> Option<&Rc<CaptureContext<P>>> {
        self.capture.as_ref()
    }

    pub fn decorations(&self) -> &Decorations<P::Element> {
        &self.decorations
    }

    pub fn overlay(&self) -> Option<&P::Element> {
        self.overlay.as_ref()
    }
}
