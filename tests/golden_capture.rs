#![cfg(feature = "headless")]

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use chrono::NaiveDate;
use futures::executor::block_on;
use snapcam::platform::headless::{HeadlessStream, PageBuilder};
use snapcam::{App, PageConfig};

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("tests/goldens/expected");
    p.push(name);
    p
}

#[test]
fn golden_gradient_capture_matches_fixture() {
    let page = Rc::new(PageBuilder::standard().canvas("canvas", 32, 24).build());
    page.set_today(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    page.grant_camera(HeadlessStream::new(64, 48));
    let app = App::init(page.clone(), PageConfig::default()).expect("init");
    block_on(app.camera_task());

    page.click("capture");
    page.click("save");

    let downloads = page.downloads();
    let saved = downloads.first().expect("one download");
    assert_eq!(saved.filename, "webcam-capture-2026-01-01.png");
    assert_eq!(&saved.image.bytes[0..8], b"\x89PNG\r\n\x1a\n");

    // nearest-neighbour halving keeps the gradient's corners
    let decoded = image::load_from_memory(&saved.image.bytes).expect("decode").to_rgba8();
    assert_eq!(decoded.dimensions(), (32, 24));
    let near = decoded.get_pixel(0, 0).0;
    assert!(near[0] < 10 && near[1] < 10 && near[2] == 128, "near corner {:?}", near);
    let far = decoded.get_pixel(31, 23).0;
    assert!(far[0] > 240 && far[1] > 240, "far corner {:?}", far);

    let digest = saved.sha256_hex();
    let expected_path = golden_path("capture_gradient.sha256");
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all("tests/goldens/expected").ok();
        fs::write(&expected_path, &digest).expect("write golden");
        println!("Updated golden: {:?}", expected_path);
        return;
    }

    if !expected_path.exists() {
        println!(
            "No golden at {:?}; run with UPDATE_GOLDENS=1 to create it. Skipping.",
            expected_path
        );
        return;
    }

    let exp = fs::read_to_string(&expected_path).expect("unable to read golden");
    assert_eq!(digest, exp.trim());
}
