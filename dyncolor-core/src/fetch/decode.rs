//! Image decoding and pixel normalization

use std::io::Cursor;

use image::{ColorType, DynamicImage, ImageReader};

use super::Result;
use crate::error::FetchError;

/// Decode raw bytes, sniffing the format from the content.
pub fn decode_image(data: &[u8]) -> Result<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| FetchError::Decode(e.to_string()))?;

    if reader.format().is_none() {
        return Err(FetchError::Decode(
            "unrecognized image format".to_string(),
        ));
    }

    reader
        .decode()
        .map_err(|e| FetchError::Decode(e.to_string()))
}

/// Convert any decoded layout (16-bit, float, gray, RGB) to 8-bit RGBA so
/// pixels can be sampled directly.
pub fn normalize_pixels(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgba8(_) => image,
        other => {
            tracing::debug!(
                from = ?other.color(),
                "normalizing pixels to rgba8"
            );
            DynamicImage::ImageRgba8(other.to_rgba8())
        }
    }
}

/// Decoded pixels, already normalized to RGBA8
#[derive(Debug)]
pub(crate) struct Decoded {
    pub pixels: DynamicImage,
    /// Layout the decoder produced before normalization
    pub decoded_as: ColorType,
}

/// Decode and normalize on the blocking pool so the runtime threads stay
/// free.
pub(crate) async fn decode_blocking(data: Vec<u8>) -> Result<Decoded> {
    tokio::task::spawn_blocking(move || {
        let image = decode_image(&data)?;
        let decoded_as = image.color();
        Ok(Decoded {
            pixels: normalize_pixels(image),
            decoded_as,
        })
    })
    .await
    .map_err(|e| FetchError::Decode(e.to_string()))?
}
