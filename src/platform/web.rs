//! Browser platform over `web-sys`
//!
//! Element handles are the DOM nodes themselves. Click handlers become
//! `Closure`s that live for the rest of the page, like listeners added
//! from page script.

use crate::app::App;
use crate::platform::{
    AnimationPlayState, ClickEvent, ClickHandler, Display, DownloadRequest, DrawingContext, MediaConstraints,
    MediaState, Platform, RasterSurface, ReadyState, StyledElement, Trigger, VideoSurface,
};
use crate::{Error, PageConfig, Result};
use futures::future::{FutureExt, LocalBoxFuture};
use log::{error, info};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlAnchorElement, HtmlCanvasElement, HtmlElement, HtmlVideoElement,
    MediaStream, MediaStreamConstraints, Window,
};

fn style_value(el: &HtmlElement, property: &str) -> String {
    el.style().get_property_value(property).unwrap_or_default()
}

fn set_style_value(el: &HtmlElement, property: &str, value: &str) -> Result<()> {
    let style = el.style();
    if value.is_empty() {
        style.remove_property(property)?;
    } else {
        style.set_property(property, value)?;
    }
    Ok(())
}

macro_rules! styled_via {
    ($ty:ty, $el:ident => $html:expr) => {
        impl StyledElement for $ty {
            fn id(&self) -> String {
                let $el = self;
                $html.id()
            }

            fn display(&self) -> Display {
                let $el = self;
                Display::from_css(&style_value($html, "display"))
            }

            fn set_display(&self, display: Display) -> Result<()> {
                let $el = self;
                set_style_value($html, "display", display.as_css())
            }

            fn animation_play_state(&self) -> AnimationPlayState {
                let $el = self;
                AnimationPlayState::from_css(&style_value($html, "animation-play-state"))
            }

            fn set_animation_play_state(&self, state: AnimationPlayState) -> Result<()> {
                let $el = self;
                set_style_value($html, "animation-play-state", state.as_css())
            }
        }
    };
}

/// Any styled element
#[derive(Debug, Clone)]
pub struct WebElement(HtmlElement);

styled_via!(WebElement, el => &el.0);

/// A clickable element
#[derive(Debug, Clone)]
pub struct WebTrigger(HtmlElement);

impl Trigger for WebTrigger {
    fn id(&self) -> String {
        self.0.id()
    }

    fn on_click(&self, handler: ClickHandler) -> Result<()> {
        let trigger_id = self.0.id();
        let cb = Closure::<dyn Fn(web_sys::Event)>::new(move |_event: web_sys::Event| {
            handler(&ClickEvent::new(trigger_id.clone()));
        });
        self.0
            .add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())?;
        cb.forget();
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WebVideo(HtmlVideoElement);

styled_via!(WebVideo, el => el.0.unchecked_ref::<HtmlElement>());

impl VideoSurface for WebVideo {
    type Stream = MediaStream;

    fn set_src_object(&self, stream: &MediaStream) {
        self.0.set_src_object(Some(stream));
    }

    fn has_src_object(&self) -> bool {
        self.0.src_object().is_some()
    }

    fn ready_state(&self) -> ReadyState {
        ReadyState::from_u16(self.0.ready_state())
    }

    fn play(&self) -> Result<()> {
        // the returned promise only reports autoplay policy rejections
        let _ = self.0.play()?;
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.0.pause()?;
        Ok(())
    }

    fn media_state(&self) -> MediaState {
        if self.0.paused() {
            MediaState::Paused
        } else {
            MediaState::Playing
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebCanvas(HtmlCanvasElement);

styled_via!(WebCanvas, el => el.0.unchecked_ref::<HtmlElement>());

pub struct WebContext(CanvasRenderingContext2d);

impl DrawingContext for WebContext {
    type Source = WebVideo;

    fn draw_frame(&self, source: &WebVideo, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        self.0
            .draw_image_with_html_video_element_and_dw_and_dh(&source.0, x, y, width, height)
            .map_err(|e| Error::RenderError(Error::from(e).to_string()))
    }
}

impl RasterSurface for WebCanvas {
    type Source = WebVideo;
    type Context = WebContext;

    fn width(&self) -> u32 {
        self.0.width()
    }

    fn height(&self) -> u32 {
        self.0.height()
    }

    fn context_2d(&self) -> Option<WebContext> {
        self.0
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            .map(WebContext)
    }

    fn to_data_url(&self, mime: &str) -> Result<String> {
        self.0
            .to_data_url_with_type(mime)
            .map_err(|e| Error::EncodeError(Error::from(e).to_string()))
    }
}

/// The live browser page
pub struct WebPlatform {
    window: Window,
    document: Document,
}

impl WebPlatform {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| Error::PlatformError("no window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| Error::PlatformError("no document".to_string()))?;
        Ok(Self { window, document })
    }

    fn lookup<T: JsCast>(&self, id: &str) -> Option<T> {
        self.document.get_element_by_id(id)?.dyn_into::<T>().ok()
    }
}

impl Platform for WebPlatform {
    type Stream = MediaStream;
    type Element = WebElement;
    type Trigger = WebTrigger;
    type Video = WebVideo;
    type Canvas = WebCanvas;

    fn element(&self, id: &str) -> Option<WebElement> {
        self.lookup::<HtmlElement>(id).map(WebElement)
    }

    fn trigger(&self, id: &str) -> Option<WebTrigger> {
        self.lookup::<HtmlElement>(id).map(WebTrigger)
    }

    fn video(&self, id: &str) -> Option<WebVideo> {
        self.lookup::<HtmlVideoElement>(id).map(WebVideo)
    }

    fn canvas(&self, id: &str) -> Option<WebCanvas> {
        self.lookup::<HtmlCanvasElement>(id).map(WebCanvas)
    }

    fn get_user_media(&self, constraints: &MediaConstraints) -> LocalBoxFuture<'static, Result<MediaStream>> {
        let request = (|| -> Result<js_sys::Promise> {
            let devices = self.window.navigator().media_devices()?;
            let c = MediaStreamConstraints::new();
            c.set_video(&JsValue::from_bool(constraints.video));
            c.set_audio(&JsValue::from_bool(constraints.audio));
            Ok(devices.get_user_media_with_constraints(&c)?)
        })();

        async move {
            let promise = request.map_err(|e| Error::CameraAccess(e.to_string()))?;
            let stream = JsFuture::from(promise)
                .await
                .map_err(|e| Error::CameraAccess(Error::from(e).to_string()))?;
            stream
                .dyn_into::<MediaStream>()
                .map_err(|_| Error::CameraAccess("getUserMedia did not yield a MediaStream".to_string()))
        }
        .boxed_local()
    }

    fn trigger_download(&self, request: &DownloadRequest) -> Result<()> {
        let body = self
            .document
            .body()
            .ok_or_else(|| Error::DownloadError("document has no body".to_string()))?;
        let link: HtmlAnchorElement = self
            .document
            .create_element("a")?
            .dyn_into()
            .map_err(|_| Error::DownloadError("could not create anchor".to_string()))?;
        link.set_href(&request.href);
        link.set_download(&request.filename);

        body.append_child(&link)?;
        link.click();
        body.remove_child(&link)?;
        Ok(())
    }

    fn alert(&self, message: &str) {
        if let Err(e) = self.window.alert_with_message(message) {
            error!("alert failed: {}", Error::from(e));
        }
    }
}

/// Page entry point: install the panic hook and console logger, wire the
/// page from the default configuration, and start the camera request.
#[wasm_bindgen(start)]
pub fn start() -> std::result::Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let platform = Rc::new(WebPlatform::new().map_err(|e| JsValue::from_str(&e.to_string()))?);
    let app = App::init(platform, PageConfig::default()).map_err(|e| JsValue::from_str(&e.to_string()))?;
    info!("snapcam wired: {:?}", app.status());

    wasm_bindgen_futures::spawn_local(async move {
        let outcome = app.camera_task().await;
        info!("camera: {:?}", outcome);
    });
    Ok(())
}
