//! Request executor: fetch a URL and hand back a decoded, CPU-readable image.
//!
//! Loading follows a two-step layout: the loader pulls raw bytes from the
//! network or disk, the decoder turns them into RGBA8 pixels on the blocking
//! pool.

use std::sync::Arc;

use image::{ColorType, DynamicImage};

use crate::error::FetchError;
use decode::Decoded;

pub mod decode;
pub mod http;

pub use decode::{decode_image, normalize_pixels};
pub use http::HttpExecutor;

/// Result type for fetch operations
pub type Result<T> = std::result::Result<T, FetchError>;

/// A decoded image ready for display and color extraction
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// The URL (or path) the image was loaded from
    pub source: Arc<str>,

    /// Pixels, always stored as 8-bit RGBA
    pub pixels: Arc<DynamicImage>,

    /// Pixel layout the decoder produced before normalization
    pub decoded_as: ColorType,

    /// Size of the fetched payload in bytes
    pub byte_len: usize,
}

impl LoadedImage {
    /// Wrap a decoded image, normalizing its pixel layout on the calling
    /// thread.
    pub fn new(
        source: impl Into<Arc<str>>,
        image: DynamicImage,
        byte_len: usize,
    ) -> Self {
        let decoded_as = image.color();
        Self::from_decoded(
            source,
            Decoded {
                pixels: normalize_pixels(image),
                decoded_as,
            },
            byte_len,
        )
    }

    pub(crate) fn from_decoded(
        source: impl Into<Arc<str>>,
        decoded: Decoded,
        byte_len: usize,
    ) -> Self {
        Self {
            source: source.into(),
            pixels: Arc::new(decoded.pixels),
            decoded_as: decoded.decoded_as,
            byte_len,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Whether the decoder output had to be converted to RGBA8
    pub fn was_normalized(&self) -> bool {
        self.decoded_as != ColorType::Rgba8
    }
}

/// Backend that turns a URL into a decoded image.
///
/// Callers never pass blank URLs. Implementations must not block the calling
/// task; decode work belongs on the blocking pool.
#[async_trait::async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Fetch and decode the image at `url`
    async fn execute(&self, url: &str) -> Result<LoadedImage>;
}

#[async_trait::async_trait]
impl<T: RequestExecutor + ?Sized> RequestExecutor for Arc<T> {
    async fn execute(&self, url: &str) -> Result<LoadedImage> {
        (**self).execute(url).await
    }
}
