//! Frame capture: freeze the current video frame into the canvas

use crate::platform::{ClickEvent, Display, DrawingContext, Platform, RasterSurface, StyledElement, VideoSurface};
use crate::{Error, PageConfig, Result};
use log::{info, warn};
use std::cell::Cell;
use std::rc::Rc;

/// Which of the two surfaces the page is currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Live video visible, canvas hidden
    Live,
    /// Captured canvas visible, video hidden
    Captured,
}

/// Result of a capture trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The frame was drawn into the `width` x `height` canvas
    Captured { width: u32, height: u32 },
    /// The stream has no decoded frame yet; nothing changed
    NotReady,
}

type ContextOf<P> = <<P as Platform>::Canvas as RasterSurface>::Context;

/// Elements shared by the capture and save handlers.
///
/// Built once at startup when every element of the capture group resolves.
pub struct CaptureContext<P: Platform> {
    pub video: P::Video,
    pub canvas: P::Canvas,
    context: ContextOf<P>,
    config: Rc<PageConfig>,
    captures: Cell<u64>,
}

/// A resolved capture group: the shared context plus its two triggers
pub struct CaptureBindings<P: Platform> {
    pub context: CaptureContext<P>,
    pub capture: P::Trigger,
    pub save: P::Trigger,
}

impl<P: Platform> CaptureContext<P> {
    /// Resolve every element of the capture group, or report all that are
    /// missing. The group is all-or-nothing.
    pub fn resolve(platform: &P, config: Rc<PageConfig>) -> Result<CaptureBindings<P>> {
        let ids = &config.ids;
        let capture = platform.trigger(&ids.capture);
        let save = platform.trigger(&ids.save);
        let video = platform.video(&ids.video);
        let canvas = platform.canvas(&ids.canvas);
        let context = canvas.as_ref().and_then(|c| c.context_2d());

        let mut missing = Vec::new();
        if capture.is_none() {
            missing.push(ids.capture.clone());
        }
        if save.is_none() {
            missing.push(ids.save.clone());
        }
        if video.is_none() {
            missing.push(ids.video.clone());
        }
        if canvas.is_none() {
            missing.push(ids.canvas.clone());
        } else if context.is_none() {
            missing.push(format!("{} (2d context)", ids.canvas));
        }

        match (capture, save, video, canvas, context) {
            (Some(capture), Some(save), Some(video), Some(canvas), Some(context)) => Ok(CaptureBindings {
                context: CaptureContext {
                    video,
                    canvas,
                    context,
                    config,
                    captures: Cell::new(0),
                },
                capture,
                save,
            }),
            _ => Err(Error::MissingElements(missing)),
        }
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    /// Number of frames drawn so far
    pub fn capture_count(&self) -> u64 {
        self.captures.get()
    }

    /// The view as encoded in the two display properties
    pub fn view(&self) -> View {
        if self.canvas.display().is_visible() && !self.video.display().is_visible() {
            View::Captured
        } else {
            View::Live
        }
    }

    /// Make exactly one of {video, canvas} visible
    pub fn show(&self, view: View) -> Result<()> {
        let (video, canvas) = match view {
            View::Live => (Display::Block, Display::None),
            View::Captured => (Display::None, Display::Block),
        };
        self.video.set_display(video)?;
        self.canvas.set_display(canvas)
    }
}

/// Fails with `StreamNotReady` until the video has decoded a frame
pub fn ensure_frame<V: VideoSurface>(video: &V) -> Result<()> {
    let state = video.ready_state();
    if state.has_frame() {
        Ok(())
    } else {
        Err(Error::StreamNotReady(state as u16))
    }
}

/// Capture trigger: hide the video, show the canvas, draw the current frame
/// at the canvas's own size and pause playback.
pub fn on_capture<P: Platform>(ctx: &CaptureContext<P>, event: &ClickEvent) -> Result<CaptureOutcome> {
    if ctx.config.require_stream_ready {
        if let Err(e) = ensure_frame(&ctx.video) {
            warn!("Capture via '{}' ignored: {}", event.trigger_id, e);
            return Ok(CaptureOutcome::NotReady);
        }
    }

    ctx.show(View::Captured)?;

    let width = ctx.canvas.width();
    let height = ctx.canvas.height();
    ctx.context
        .draw_frame(&ctx.video, 0.0, 0.0, f64::from(width), f64::from(height))?;
    ctx.video.pause()?;
    ctx.captures.set(ctx.captures.get() + 1);

    info!("Photo captured successfully onto the canvas ({}x{})", width, height);
    Ok(CaptureOutcome::Captured { width, height })
}
