//! End-to-end page behaviour over the headless platform

#![cfg(feature = "headless")]

use std::rc::Rc;

use chrono::NaiveDate;
use futures::executor::{block_on, LocalPool};
use futures::task::LocalSpawnExt;
use snapcam::platform::headless::{HeadlessPage, HeadlessStream, PageBuilder};
use snapcam::platform::{AnimationPlayState, Display, MediaState, Platform, StyledElement, VideoSurface};
use snapcam::{App, CameraOutcome, DecorationConfig, FeatureState, PageConfig, View};

const TODAY: (i32, u32, u32) = (2026, 10, 16);

fn page_with(builder: PageBuilder) -> Rc<HeadlessPage> {
    let page = Rc::new(builder.build());
    page.set_today(NaiveDate::from_ymd_opt(TODAY.0, TODAY.1, TODAY.2).unwrap());
    page
}

fn live_app(page: &Rc<HeadlessPage>, stream: HeadlessStream) -> App<HeadlessPage> {
    page.grant_camera(stream);
    let app = App::init(page.clone(), PageConfig::default()).expect("init");
    assert_eq!(block_on(app.camera_task()), CameraOutcome::Attached);
    app
}

#[test]
fn capture_freezes_frame_into_canvas() {
    let page = page_with(PageBuilder::standard().canvas("canvas", 32, 24));
    let app = live_app(&page, HeadlessStream::new(320, 240).solid([200, 40, 90, 255]));

    assert_eq!(page.click("capture"), 1);

    let video = page.video("video").unwrap();
    let canvas = page.canvas("canvas").unwrap();
    assert_eq!(video.display(), Display::None);
    assert_eq!(canvas.display(), Display::Block);
    assert_eq!(video.media_state(), MediaState::Paused);
    assert!(canvas.snapshot().pixels().all(|p| p.0 == [200, 40, 90, 255]));
    assert_eq!(app.capture().unwrap().view(), View::Captured);
}

#[test]
fn save_after_capture_downloads_dated_png_and_goes_live() {
    let page = page_with(PageBuilder::standard());
    let app = live_app(&page, HeadlessStream::new(640, 480));

    page.click("capture");
    assert_eq!(page.click("save"), 1);

    let downloads = page.downloads();
    assert_eq!(downloads.len(), 1);
    assert_eq!(downloads[0].filename, "webcam-capture-2026-10-16.png");
    assert!(downloads[0].image.is_png());
    assert_eq!(page.attached_anchors(), 0);

    let ctx = app.capture().unwrap();
    assert_eq!(ctx.view(), View::Live);
    assert_eq!(page.video("video").unwrap().media_state(), MediaState::Playing);
    assert!(page.video("video").unwrap().display().is_visible());
    assert!(!page.canvas("canvas").unwrap().display().is_visible());
}

#[test]
fn any_missing_capture_element_leaves_triggers_inert() {
    for missing in ["video", "canvas", "capture", "save"] {
        let page = page_with(PageBuilder::standard().without(missing));
        page.grant_camera(HeadlessStream::new(64, 48));
        let app = App::init(page.clone(), PageConfig::default()).unwrap();
        block_on(app.camera_task());

        assert_eq!(
            app.status().capture,
            FeatureState::Disabled { missing: vec![missing.to_string()] },
            "removing {}",
            missing
        );
        assert_eq!(page.click("capture"), 0);
        assert_eq!(page.click("save"), 0);
        assert!(page.downloads().is_empty());
        if let Some(canvas) = page.canvas("canvas") {
            assert_eq!(canvas.display(), Display::None);
        }
        if let Some(video) = page.video("video") {
            assert!(video.display().is_visible());
        }

        // the decoration group is unaffected
        assert_eq!(page.click("add-circle"), 1);
        assert_eq!(page.element("circle").unwrap().display(), Display::Block);
    }
}

#[test]
fn canvas_without_context_disables_capture() {
    let page = page_with(PageBuilder::standard().canvas_without_context("canvas", 10, 10));
    let app = live_app(&page, HeadlessStream::new(64, 48));
    assert!(!app.status().capture.is_enabled());
    assert_eq!(page.listener_count("capture"), 0);
}

#[test]
fn decoration_trigger_reveals_and_animates() {
    let page = page_with(PageBuilder::standard());
    let _app = App::init(page.clone(), PageConfig::default()).unwrap();
    let circle = page.element("circle").unwrap();
    assert_eq!(circle.display(), Display::None);

    page.click("add-circle");
    assert_eq!(circle.display(), Display::Block);
    assert_eq!(circle.animation_play_state(), AnimationPlayState::Running);

    page.click("add-circle");
    assert_eq!(circle.display(), Display::Block);
    assert_eq!(circle.animation_play_state(), AnimationPlayState::Running);
}

#[test]
fn unmapped_decoration_changes_nothing() {
    // the trigger exists but its target element does not
    let page = page_with(PageBuilder::standard().without("circle").element("star").trigger("add-star"));
    let mut config = PageConfig::default();
    config.decorations.push(DecorationConfig {
        name: "ghost".to_string(),
        element_id: "ghost".to_string(),
        trigger_id: "add-star".to_string(),
    });
    let app = App::init(page.clone(), config).unwrap();
    assert!(app.decorations().is_empty());

    assert_eq!(page.click("add-circle"), 1);
    assert_eq!(page.click("add-star"), 1);
    let star = page.element("star").unwrap();
    assert_eq!(star.display(), Display::Unset);
    assert_eq!(star.animation_play_state(), AnimationPlayState::Unset);
    assert_eq!(page.video("video").unwrap().display(), Display::Unset);
}

#[test]
fn camera_denial_alerts_once_and_disables_nothing_else() {
    let page = page_with(PageBuilder::standard());
    page.deny_camera("NotAllowedError: Permission denied");
    let app = App::init(page.clone(), PageConfig::default()).unwrap();

    let outcome = block_on(app.camera_task());
    assert!(matches!(outcome, CameraOutcome::Failed(_)));
    assert!(!page.video("video").unwrap().has_src_object());
    assert_eq!(page.alerts(), vec!["Could not access the camera. Check permissions.".to_string()]);

    assert!(app.status().capture.is_enabled());
    page.click("add-circle");
    assert_eq!(page.element("circle").unwrap().display(), Display::Block);

    // capture is guarded until a frame exists; save still works
    page.click("capture");
    assert_eq!(app.capture().unwrap().capture_count(), 0);
    page.click("save");
    assert_eq!(page.downloads().len(), 1);
    assert_eq!(page.alerts().len(), 1);
}

#[test]
fn unanswered_prompt_never_resolves() {
    let page = page_with(PageBuilder::standard());
    let app = App::init(page.clone(), PageConfig::default()).unwrap();

    let done = Rc::new(std::cell::Cell::new(false));
    let mut pool = LocalPool::new();
    let flag = done.clone();
    let task = app.camera_task();
    pool.spawner()
        .spawn_local(async move {
            task.await;
            flag.set(true);
        })
        .unwrap();
    pool.run_until_stalled();

    assert!(!done.get());
    assert_eq!(page.media_requests().len(), 1);
    assert!(page.alerts().is_empty());
    assert!(!page.video("video").unwrap().has_src_object());

    page.click("capture");
    assert_eq!(app.capture().unwrap().view(), View::Live);
}

#[test]
fn save_without_capture_exports_blank_canvas() {
    let page = page_with(PageBuilder::standard().canvas("canvas", 3, 2));
    let _app = live_app(&page, HeadlessStream::new(30, 20).solid([255, 255, 255, 255]));

    assert_eq!(page.click("save"), 1);
    let saved = page.downloads();
    assert_eq!(saved.len(), 1);
    let decoded = image::load_from_memory(&saved[0].image.bytes).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (3, 2));
    assert!(decoded.pixels().all(|p| p.0[3] == 0));
}

#[test]
fn stalled_stream_blocks_capture_until_ready() {
    let page = page_with(PageBuilder::standard().canvas("canvas", 4, 4));
    let app = live_app(&page, HeadlessStream::new(8, 8).solid([1, 2, 3, 255]).stalled());

    page.click("capture");
    let ctx = app.capture().unwrap();
    assert_eq!(ctx.capture_count(), 0);
    assert_eq!(ctx.view(), View::Live);

    // first frame decoded
    page.video("video").unwrap().set_src_object(&HeadlessStream::new(8, 8).solid([1, 2, 3, 255]));
    page.click("capture");
    assert_eq!(ctx.capture_count(), 1);
    assert_eq!(page.canvas("canvas").unwrap().pixel(3, 3), Some([1, 2, 3, 255]));
}

#[test]
fn configured_ids_and_prefix_are_honoured() {
    let page = page_with(
        PageBuilder::new()
            .video("cam")
            .canvas("still", 8, 8)
            .trigger("snap")
            .trigger("keep")
            .hidden_element("heart")
            .trigger("show-heart"),
    );
    let config = PageConfig::from_json(
        r#"{
            "ids": { "video": "cam", "canvas": "still", "capture": "snap", "save": "keep" },
            "decorations": [ { "name": "heart", "element_id": "heart", "trigger_id": "show-heart" } ],
            "filename_prefix": "booth"
        }"#,
    )
    .unwrap();
    page.grant_camera(HeadlessStream::new(16, 16));
    let app = App::init(page.clone(), config).unwrap();
    block_on(app.camera_task());

    page.click("snap");
    page.click("keep");
    page.click("show-heart");

    assert_eq!(page.downloads()[0].filename, "booth-2026-10-16.png");
    assert_eq!(page.element("heart").unwrap().display(), Display::Block);
    assert!(app.overlay().is_none());
}
