//! Camera source: request the live stream once and bind it to the video

use crate::platform::{MediaConstraints, Platform, VideoSurface};
use log::{error, info, warn};
use std::rc::Rc;

/// How the one-shot camera request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraOutcome {
    /// The stream is bound to the video element
    Attached,
    /// Permission was granted but there is no video element to show it
    NoVideoElement,
    /// The request was rejected; the user has been alerted
    Failed(String),
}

/// Request a stream and bind it, or log and alert on failure. No retry.
///
/// The returned future completes when the platform answers the permission
/// prompt; if it never answers, the future stays pending and nothing else
/// on the page is affected.
pub async fn start_camera<P: Platform>(
    platform: Rc<P>,
    video: Option<P::Video>,
    constraints: MediaConstraints,
    alert_message: String,
) -> CameraOutcome {
    let request = platform.get_user_media(&constraints);
    match request.await {
        Ok(stream) => match video {
            Some(video) => {
                video.set_src_object(&stream);
                info!("Camera stream attached");
                CameraOutcome::Attached
            }
            None => {
                warn!("Camera stream granted but there is no video element to show it");
                CameraOutcome::NoVideoElement
            }
        },
        Err(e) => {
            error!("Error accessing webcam: {}", e);
            platform.alert(&alert_message);
            CameraOutcome::Failed(e.to_string())
        }
    }
}
