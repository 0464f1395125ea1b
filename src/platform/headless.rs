//! Headless platform: an in-memory document for tests and the CLI
//!
//! Elements keep their inline style in shared cells, the canvas is an RGBA
//! buffer encoded with the `image` crate, camera streams are synthetic
//! frames, and downloads/alerts are recorded instead of shown. Clicks are
//! dispatched with [`HeadlessPage::click`].

use crate::export::{EncodedImage, PNG_MIME};
use crate::platform::{
    system_today, AnimationPlayState, ClickEvent, ClickHandler, Display, DownloadRequest, DrawingContext,
    MediaConstraints, MediaState, Platform, RasterSurface, ReadyState, StyledElement, Trigger, VideoSurface,
};
use crate::{DateBasis, Error, Result};
use chrono::NaiveDate;
use futures::future::{self, FutureExt, LocalBoxFuture};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use sha2::{Digest, Sha256};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::Cursor;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StyleState {
    display: Display,
    animation: AnimationPlayState,
}

/// What a synthetic camera shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePattern {
    Solid([u8; 4]),
    /// Red ramps left to right, green top to bottom
    Gradient,
}

/// A synthetic live stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessStream {
    pub width: u32,
    pub height: u32,
    pub pattern: FramePattern,
    /// `false` models a stream that never decodes its first frame
    pub decodes_frames: bool,
}

impl HeadlessStream {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pattern: FramePattern::Gradient,
            decodes_frames: true,
        }
    }

    pub fn solid(mut self, rgba: [u8; 4]) -> Self {
        self.pattern = FramePattern::Solid(rgba);
        self
    }

    pub fn stalled(mut self) -> Self {
        self.decodes_frames = false;
        self
    }

    /// The frame currently "on screen"
    pub fn frame(&self) -> RgbaImage {
        let (w, h) = (self.width, self.height);
        match self.pattern {
            FramePattern::Solid(rgba) => RgbaImage::from_pixel(w, h, Rgba(rgba)),
            FramePattern::Gradient => RgbaImage::from_fn(w, h, |x, y| {
                let r = (x * 255 / w.saturating_sub(1).max(1)) as u8;
                let g = (y * 255 / h.saturating_sub(1).max(1)) as u8;
                Rgba([r, g, 128, 255])
            }),
        }
    }
}

#[derive(Debug, Clone)]
enum CameraMode {
    Grant(HeadlessStream),
    Deny(String),
    Pending,
}

/// A file handed to the download mechanism
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub image: EncodedImage,
}

impl Download {
    pub fn sha256_hex(&self) -> String {
        hex::encode(Sha256::digest(&self.image.bytes))
    }
}

// --- element handles ---

#[derive(Debug, Clone)]
pub struct HeadlessElement {
    id: String,
    style: Rc<RefCell<StyleState>>,
}

impl StyledElement for HeadlessElement {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn display(&self) -> Display {
        self.style.borrow().display
    }

    fn set_display(&self, display: Display) -> Result<()> {
        self.style.borrow_mut().display = display;
        Ok(())
    }

    fn animation_play_state(&self) -> AnimationPlayState {
        self.style.borrow().animation
    }

    fn set_animation_play_state(&self, state: AnimationPlayState) -> Result<()> {
        self.style.borrow_mut().animation = state;
        Ok(())
    }
}

#[derive(Clone)]
pub struct HeadlessTrigger {
    id: String,
    handlers: Rc<RefCell<Vec<Rc<ClickHandler>>>>,
}

impl HeadlessTrigger {
    fn dispatch(&self) -> usize {
        // handlers may touch the page, so do not hold the borrow while they run
        let handlers: Vec<Rc<ClickHandler>> = self.handlers.borrow().clone();
        let event = ClickEvent::new(self.id.clone());
        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }
}

impl Trigger for HeadlessTrigger {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn on_click(&self, handler: ClickHandler) -> Result<()> {
        self.handlers.borrow_mut().push(Rc::new(handler));
        Ok(())
    }
}

#[derive(Debug)]
struct VideoState {
    style: StyleState,
    stream: Option<HeadlessStream>,
    media: MediaState,
}

#[derive(Debug, Clone)]
pub struct HeadlessVideo {
    id: String,
    state: Rc<RefCell<VideoState>>,
}

impl HeadlessVideo {
    /// The decoded frame, if the bound stream has produced one
    pub fn current_frame(&self) -> Option<RgbaImage> {
        let state = self.state.borrow();
        state
            .stream
            .as_ref()
            .filter(|s| s.decodes_frames)
            .map(HeadlessStream::frame)
    }
}

impl StyledElement for HeadlessVideo {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn display(&self) -> Display {
        self.state.borrow().style.display
    }

    fn set_display(&self, display: Display) -> Result<()> {
        self.state.borrow_mut().style.display = display;
        Ok(())
    }

    fn animation_play_state(&self) -> AnimationPlayState {
        self.state.borrow().style.animation
    }

    fn set_animation_play_state(&self, state: AnimationPlayState) -> Result<()> {
        self.state.borrow_mut().style.animation = state;
        Ok(())
    }
}

impl VideoSurface for HeadlessVideo {
    type Stream = HeadlessStream;

    fn set_src_object(&self, stream: &HeadlessStream) {
        let mut state = self.state.borrow_mut();
        state.stream = Some(stream.clone());
        // the page's video element autoplays
        state.media = MediaState::Playing;
    }

    fn has_src_object(&self) -> bool {
        self.state.borrow().stream.is_some()
    }

    fn ready_state(&self) -> ReadyState {
        match &self.state.borrow().stream {
            None => ReadyState::HaveNothing,
            Some(s) if s.decodes_frames => ReadyState::HaveEnoughData,
            Some(_) => ReadyState::HaveMetadata,
        }
    }

    fn play(&self) -> Result<()> {
        self.state.borrow_mut().media = MediaState::Playing;
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.state.borrow_mut().media = MediaState::Paused;
        Ok(())
    }

    fn media_state(&self) -> MediaState {
        self.state.borrow().media
    }
}

#[derive(Debug)]
struct CanvasState {
    style: StyleState,
    buffer: RgbaImage,
    has_context: bool,
}

#[derive(Debug, Clone)]
pub struct HeadlessCanvas {
    id: String,
    state: Rc<RefCell<CanvasState>>,
}

impl HeadlessCanvas {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.state.borrow().buffer.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Copy of the whole pixel buffer
    pub fn snapshot(&self) -> RgbaImage {
        self.state.borrow().buffer.clone()
    }
}

impl StyledElement for HeadlessCanvas {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn display(&self) -> Display {
        self.state.borrow().style.display
    }

    fn set_display(&self, display: Display) -> Result<()> {
        self.state.borrow_mut().style.display = display;
        Ok(())
    }

    fn animation_play_state(&self) -> AnimationPlayState {
        self.state.borrow().style.animation
    }

    fn set_animation_play_state(&self, state: AnimationPlayState) -> Result<()> {
        self.state.borrow_mut().style.animation = state;
        Ok(())
    }
}

pub struct HeadlessContext {
    canvas: Rc<RefCell<CanvasState>>,
}

impl DrawingContext for HeadlessContext {
    type Source = HeadlessVideo;

    fn draw_frame(&self, source: &HeadlessVideo, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        // a video without a decoded frame draws nothing
        let Some(frame) = source.current_frame() else {
            return Ok(());
        };
        let (w, h) = (width.round().max(0.0) as u32, height.round().max(0.0) as u32);
        if w == 0 || h == 0 {
            return Ok(());
        }
        let scaled = imageops::resize(&frame, w, h, FilterType::Nearest);
        let mut state = self.canvas.borrow_mut();
        imageops::replace(&mut state.buffer, &scaled, x.round() as i64, y.round() as i64);
        Ok(())
    }
}

impl RasterSurface for HeadlessCanvas {
    type Source = HeadlessVideo;
    type Context = HeadlessContext;

    fn width(&self) -> u32 {
        self.state.borrow().buffer.width()
    }

    fn height(&self) -> u32 {
        self.state.borrow().buffer.height()
    }

    fn context_2d(&self) -> Option<HeadlessContext> {
        if self.state.borrow().has_context {
            Some(HeadlessContext { canvas: self.state.clone() })
        } else {
            None
        }
    }

    /// Always PNG; like browsers, unsupported types fall back to it
    fn to_data_url(&self, _mime: &str) -> Result<String> {
        let state = self.state.borrow();
        if state.buffer.width() == 0 || state.buffer.height() == 0 {
            return Ok("data:,".to_string());
        }
        let mut bytes = Vec::new();
        state
            .buffer
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| Error::EncodeError(e.to_string()))?;
        Ok(EncodedImage::new(PNG_MIME, bytes).to_data_url())
    }
}

// --- document ---

#[derive(Clone)]
enum Node {
    Element(HeadlessElement),
    Trigger(HeadlessTrigger),
    Video(HeadlessVideo),
    Canvas(HeadlessCanvas),
}

#[derive(Debug, Clone, Copy)]
enum NodeSpec {
    Element(StyleState),
    Trigger,
    Video,
    Canvas { width: u32, height: u32, context: bool },
}

/// Builds a [`HeadlessPage`] element by element
#[derive(Debug, Clone, Default)]
pub struct PageBuilder {
    nodes: Vec<(String, NodeSpec)>,
}

impl PageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock capture page: `video`, a hidden 640x480 `canvas`,
    /// `overlay-top`, a hidden paused `circle`, and the `capture`, `save`
    /// and `add-circle` buttons.
    pub fn standard() -> Self {
        Self::new()
            .video("video")
            .canvas("canvas", 640, 480)
            .element("overlay-top")
            .hidden_element("circle")
            .trigger("capture")
            .trigger("save")
            .trigger("add-circle")
    }

    fn put(mut self, id: &str, spec: NodeSpec) -> Self {
        match self.nodes.iter_mut().find(|(existing, _)| existing == id) {
            Some(slot) => slot.1 = spec,
            None => self.nodes.push((id.to_string(), spec)),
        }
        self
    }

    pub fn element(self, id: &str) -> Self {
        self.put(id, NodeSpec::Element(StyleState::default()))
    }

    /// An element styled `display: none; animation-play-state: paused`
    pub fn hidden_element(self, id: &str) -> Self {
        self.put(
            id,
            NodeSpec::Element(StyleState {
                display: Display::None,
                animation: AnimationPlayState::Paused,
            }),
        )
    }

    pub fn trigger(self, id: &str) -> Self {
        self.put(id, NodeSpec::Trigger)
    }

    pub fn video(self, id: &str) -> Self {
        self.put(id, NodeSpec::Video)
    }

    pub fn canvas(self, id: &str, width: u32, height: u32) -> Self {
        self.put(id, NodeSpec::Canvas { width, height, context: true })
    }

    /// A canvas whose 2-D context cannot be obtained
    pub fn canvas_without_context(self, id: &str, width: u32, height: u32) -> Self {
        self.put(id, NodeSpec::Canvas { width, height, context: false })
    }

    pub fn without(mut self, id: &str) -> Self {
        self.nodes.retain(|(existing, _)| existing != id);
        self
    }

    pub fn build(self) -> HeadlessPage {
        let mut nodes = HashMap::new();
        for (id, spec) in self.nodes {
            let node = match spec {
                NodeSpec::Element(style) => Node::Element(HeadlessElement {
                    id: id.clone(),
                    style: Rc::new(RefCell::new(style)),
                }),
                NodeSpec::Trigger => Node::Trigger(HeadlessTrigger {
                    id: id.clone(),
                    handlers: Rc::new(RefCell::new(Vec::new())),
                }),
                NodeSpec::Video => Node::Video(HeadlessVideo {
                    id: id.clone(),
                    state: Rc::new(RefCell::new(VideoState {
                        style: StyleState::default(),
                        stream: None,
                        media: MediaState::Paused,
                    })),
                }),
                NodeSpec::Canvas { width, height, context } => Node::Canvas(HeadlessCanvas {
                    id: id.clone(),
                    state: Rc::new(RefCell::new(CanvasState {
                        // canvases start hidden until something is captured
                        style: StyleState {
                            display: Display::None,
                            animation: AnimationPlayState::Unset,
                        },
                        buffer: RgbaImage::new(width, height),
                        has_context: context,
                    })),
                }),
            };
            nodes.insert(id, node);
        }

        HeadlessPage {
            nodes,
            camera: RefCell::new(CameraMode::Pending),
            media_requests: RefCell::new(Vec::new()),
            downloads: RefCell::new(Vec::new()),
            alerts: RefCell::new(Vec::new()),
            today: Cell::new(None),
            attached_anchors: Cell::new(0),
        }
    }
}

/// In-memory document implementing [`Platform`]
pub struct HeadlessPage {
    nodes: HashMap<String, Node>,
    camera: RefCell<CameraMode>,
    media_requests: RefCell<Vec<MediaConstraints>>,
    downloads: RefCell<Vec<Download>>,
    alerts: RefCell<Vec<String>>,
    today: Cell<Option<NaiveDate>>,
    attached_anchors: Cell<usize>,
}

impl HeadlessPage {
    /// Answer the next permission prompt with this stream
    pub fn grant_camera(&self, stream: HeadlessStream) {
        *self.camera.borrow_mut() = CameraMode::Grant(stream);
    }

    /// Reject the next permission prompt with this reason
    pub fn deny_camera(&self, reason: &str) {
        *self.camera.borrow_mut() = CameraMode::Deny(reason.to_string());
    }

    /// Never answer the permission prompt (the default)
    pub fn ignore_camera_prompt(&self) {
        *self.camera.borrow_mut() = CameraMode::Pending;
    }

    /// Pin the date used for file names
    pub fn set_today(&self, date: NaiveDate) {
        self.today.set(Some(date));
    }

    /// Activate a trigger; returns how many handlers ran. Clicking an
    /// absent element, or one with nothing attached, does nothing.
    pub fn click(&self, id: &str) -> usize {
        match self.nodes.get(id) {
            Some(Node::Trigger(trigger)) => trigger.dispatch(),
            _ => 0,
        }
    }

    pub fn listener_count(&self, id: &str) -> usize {
        match self.nodes.get(id) {
            Some(Node::Trigger(trigger)) => trigger.handlers.borrow().len(),
            _ => 0,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn downloads(&self) -> Vec<Download> {
        self.downloads.borrow().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }

    /// Constraints of every user-media request so far
    pub fn media_requests(&self) -> Vec<MediaConstraints> {
        self.media_requests.borrow().clone()
    }

    /// Download anchors currently inserted in the body
    pub fn attached_anchors(&self) -> usize {
        self.attached_anchors.get()
    }
}

impl Platform for HeadlessPage {
    type Stream = HeadlessStream;
    type Element = HeadlessElement;
    type Trigger = HeadlessTrigger;
    type Video = HeadlessVideo;
    type Canvas = HeadlessCanvas;

    fn element(&self, id: &str) -> Option<HeadlessElement> {
        match self.nodes.get(id) {
            Some(Node::Element(el)) => Some(el.clone()),
            _ => None,
        }
    }

    fn trigger(&self, id: &str) -> Option<HeadlessTrigger> {
        match self.nodes.get(id) {
            Some(Node::Trigger(t)) => Some(t.clone()),
            _ => None,
        }
    }

    fn video(&self, id: &str) -> Option<HeadlessVideo> {
        match self.nodes.get(id) {
            Some(Node::Video(v)) => Some(v.clone()),
            _ => None,
        }
    }

    fn canvas(&self, id: &str) -> Option<HeadlessCanvas> {
        match self.nodes.get(id) {
            Some(Node::Canvas(c)) => Some(c.clone()),
            _ => None,
        }
    }

    fn get_user_media(&self, constraints: &MediaConstraints) -> LocalBoxFuture<'static, Result<HeadlessStream>> {
        self.media_requests.borrow_mut().push(*constraints);
        if !constraints.video && !constraints.audio {
            return future::ready(Err(Error::CameraAccess(
                "TypeError: at least one of audio and video must be requested".to_string(),
            )))
            .boxed_local();
        }
        match self.camera.borrow().clone() {
            CameraMode::Grant(stream) => future::ready(Ok(stream)).boxed_local(),
            CameraMode::Deny(reason) => future::ready(Err(Error::CameraAccess(reason))).boxed_local(),
            CameraMode::Pending => future::pending().boxed_local(),
        }
    }

    fn trigger_download(&self, request: &DownloadRequest) -> Result<()> {
        let image = EncodedImage::from_data_url(&request.href).map_err(|e| Error::DownloadError(e.to_string()))?;

        // insert, activate, remove
        self.attached_anchors.set(self.attached_anchors.get() + 1);
        self.downloads.borrow_mut().push(Download {
            filename: request.filename.clone(),
            image,
        });
        self.attached_anchors.set(self.attached_anchors.get() - 1);
        Ok(())
    }

    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }

    fn today(&self, basis: DateBasis) -> NaiveDate {
        self.today.get().unwrap_or_else(|| system_today(basis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_page_has_every_element() {
        let page = PageBuilder::standard().build();
        for id in ["video", "canvas", "overlay-top", "circle", "capture", "save", "add-circle"] {
            assert!(page.contains(id), "missing {}", id);
        }
        let canvas = page.canvas("canvas").unwrap();
        assert_eq!((canvas.width(), canvas.height()), (640, 480));
        assert_eq!(canvas.display(), Display::None);
        assert!(page.video("video").unwrap().display().is_visible());
    }

    #[test]
    fn lookups_are_typed() {
        let page = PageBuilder::standard().build();
        assert!(page.element("video").is_none());
        assert!(page.trigger("circle").is_none());
        assert!(page.canvas("video").is_none());
    }

    #[test]
    fn click_runs_handlers_in_order() {
        let page = PageBuilder::new().trigger("go").build();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for n in 0..2 {
            let seen = seen.clone();
            page.trigger("go")
                .unwrap()
                .on_click(Box::new(move |ev: &ClickEvent| seen.borrow_mut().push((n, ev.trigger_id.clone()))))
                .unwrap();
        }
        assert_eq!(page.click("go"), 2);
        assert_eq!(page.click("missing"), 0);
        assert_eq!(*seen.borrow(), vec![(0, "go".to_string()), (1, "go".to_string())]);
    }

    #[test]
    fn gradient_frame_spans_full_range() {
        let frame = HeadlessStream::new(3, 2).frame();
        assert_eq!(frame.get_pixel(0, 0).0, [0, 0, 128, 255]);
        assert_eq!(frame.get_pixel(2, 1).0, [255, 255, 128, 255]);
    }

    #[test]
    fn draw_frame_scales_into_canvas() {
        let page = PageBuilder::new().video("v").canvas("c", 4, 2).build();
        let video = page.video("v").unwrap();
        video.set_src_object(&HeadlessStream::new(40, 20).solid([1, 2, 3, 255]));
        let canvas = page.canvas("c").unwrap();
        canvas.context_2d().unwrap().draw_frame(&video, 0.0, 0.0, 4.0, 2.0).unwrap();
        assert!(canvas.snapshot().pixels().all(|p| p.0 == [1, 2, 3, 255]));
    }

    #[test]
    fn stalled_stream_draws_nothing() {
        let page = PageBuilder::new().video("v").canvas("c", 2, 2).build();
        let video = page.video("v").unwrap();
        video.set_src_object(&HeadlessStream::new(2, 2).solid([9, 9, 9, 255]).stalled());
        assert_eq!(video.ready_state(), ReadyState::HaveMetadata);
        let canvas = page.canvas("c").unwrap();
        canvas.context_2d().unwrap().draw_frame(&video, 0.0, 0.0, 2.0, 2.0).unwrap();
        assert_eq!(canvas.pixel(1, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn zero_sized_canvas_encodes_empty_url() {
        let page = PageBuilder::new().canvas("c", 0, 0).build();
        assert_eq!(page.canvas("c").unwrap().to_data_url(PNG_MIME).unwrap(), "data:,");
    }

    #[test]
    fn non_data_downloads_are_rejected() {
        let page = PageBuilder::new().build();
        let req = DownloadRequest {
            filename: "x.png".into(),
            href: "https://example.com/x.png".into(),
        };
        assert!(matches!(page.trigger_download(&req), Err(Error::DownloadError(_))));
        assert!(page.downloads().is_empty());
        assert_eq!(page.attached_anchors(), 0);
    }

    #[test]
    fn pinned_date_overrides_clock() {
        let page = PageBuilder::new().build();
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        page.set_today(date);
        assert_eq!(page.today(DateBasis::Utc), date);
    }
}
