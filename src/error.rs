//! Error types for the capture page

use thiserror::Error;

/// Result type alias for page operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while wiring or driving the page
#[derive(Error, Debug)]
pub enum Error {
    /// One or more elements a feature group depends on are absent
    #[error("Missing required elements: {}", .0.join(", "))]
    MissingElements(Vec<String>),

    /// The camera stream could not be obtained
    #[error("Camera access failed: {0}")]
    CameraAccess(String),

    /// Capture was attempted before the stream produced a frame
    #[error("Video stream is not ready (ready state {0})")]
    StreamNotReady(u16),

    /// Drawing into the raster surface failed
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Encoding the raster surface failed
    #[error("Encoding failed: {0}")]
    EncodeError(String),

    /// Triggering the client-side download failed
    #[error("Download failed: {0}")]
    DownloadError(String),

    /// The platform raised an exception (DOM/JS error text)
    #[error("Platform error: {0}")]
    PlatformError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

#[cfg(all(feature = "web", target_arch = "wasm32"))]
impl From<wasm_bindgen::JsValue> for Error {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        let text = value
            .as_string()
            .or_else(|| {
                js_sys::JSON::stringify(&value)
                    .ok()
                    .and_then(|s| s.as_string())
            })
            .unwrap_or_else(|| format!("{:?}", value));
        Error::PlatformError(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_elements_lists_every_id() {
        let err = Error::MissingElements(vec!["video".into(), "save".into()]);
        assert_eq!(err.to_string(), "Missing required elements: video, save");
    }

    #[test]
    fn json_errors_become_config_errors() {
        let err: Error = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
