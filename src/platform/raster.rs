/// Raster surface (canvas) and its 2-D drawing context

use crate::platform::dom::StyledElement;
use crate::Result;

/// A 2-D drawing context bound to one raster surface
pub trait DrawingContext {
    /// What can be drawn as a frame (the video element)
    type Source;

    /// Draw the source's current frame scaled into the given rectangle
    fn draw_frame(&self, source: &Self::Source, x: f64, y: f64, width: f64, height: f64) -> Result<()>;
}

/// A fixed-size pixel buffer displayed on the page
pub trait RasterSurface: StyledElement {
    type Source;
    type Context: DrawingContext<Source = Self::Source>;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// The surface's 2-D context, or `None` if the platform cannot provide one
    fn context_2d(&self) -> Option<Self::Context>;

    /// Serialize the current pixels as a `data:` URL of the given type
    fn to_data_url(&self, mime: &str) -> Result<String>;
}
