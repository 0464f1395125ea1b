//! Export: encode the canvas as PNG and hand it to the download mechanism

use crate::capture::{CaptureContext, View};
use crate::platform::{ClickEvent, DownloadRequest, Platform, RasterSurface, VideoSurface};
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::NaiveDate;
use log::info;

pub const PNG_MIME: &str = "image/png";

/// `<prefix>-<YYYY-MM-DD>.png`
pub fn capture_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}.png", prefix, date.format("%Y-%m-%d"))
}

/// Bytes carried by a base64 `data:` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { mime: mime.into(), bytes }
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    /// Parse a `data:` URL. `data:,` (what a zero-sized canvas yields) is an
    /// empty payload.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| Error::EncodeError("not a data: URL".to_string()))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::EncodeError("data: URL has no payload separator".to_string()))?;

        let (mime, is_base64) = match meta.strip_suffix(";base64") {
            Some(mime) => (mime, true),
            None => (meta, false),
        };
        let mime = if mime.is_empty() { "text/plain" } else { mime };

        let bytes = if is_base64 {
            STANDARD
                .decode(payload)
                .map_err(|e| Error::EncodeError(format!("invalid base64 payload: {}", e)))?
        } else {
            payload.as_bytes().to_vec()
        };
        Ok(Self::new(mime, bytes))
    }

    pub fn is_png(&self) -> bool {
        self.mime == PNG_MIME && self.bytes.starts_with(b"\x89PNG\r\n\x1a\n")
    }
}

/// Result of a save trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub filename: String,
    /// Length of the encoded `data:` URL handed to the download
    pub data_url_len: usize,
}

/// Save trigger: encode the canvas, download it under today's file name,
/// then resume the live view.
///
/// Saving before any capture exports the canvas as it is (blank when never
/// drawn to).
pub fn on_save<P: Platform>(platform: &P, ctx: &CaptureContext<P>, event: &ClickEvent) -> Result<SaveOutcome> {
    let config = ctx.config();
    let href = ctx.canvas.to_data_url(PNG_MIME)?;
    let filename = capture_filename(&config.filename_prefix, platform.today(config.date_basis));

    let data_url_len = href.len();
    platform.trigger_download(&DownloadRequest {
        filename: filename.clone(),
        href,
    })?;
    info!("Photo saved as {} (via '{}')", filename, event.trigger_id);

    ctx.video.play()?;
    ctx.show(View::Live)?;

    Ok(SaveOutcome { filename, data_url_len })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(capture_filename("webcam-capture", date), "webcam-capture-2026-03-07.png");
    }

    #[test]
    fn data_url_parses_base64_payload() {
        let img = EncodedImage::new(PNG_MIME, b"\x89PNG\r\n\x1a\nrest".to_vec());
        let url = img.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));
        let parsed = EncodedImage::from_data_url(&url).unwrap();
        assert_eq!(parsed, img);
        assert!(parsed.is_png());
    }

    #[test]
    fn empty_canvas_url_is_empty_payload() {
        let parsed = EncodedImage::from_data_url("data:,").unwrap();
        assert_eq!(parsed.mime, "text/plain");
        assert!(parsed.bytes.is_empty());
        assert!(!parsed.is_png());
    }

    #[test]
    fn malformed_urls_are_rejected() {
        assert!(EncodedImage::from_data_url("https://example.com/a.png").is_err());
        assert!(EncodedImage::from_data_url("data:image/png;base64").is_err());
        assert!(EncodedImage::from_data_url("data:image/png;base64,@@@").is_err());
    }
}
