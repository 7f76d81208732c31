//! Seed color extraction

use image::DynamicImage;

use super::Rgb;
use super::hsluv::HsluvColor;

/// Gray used when an image has no opaque pixels
pub const FALLBACK_SEED: Rgb = Rgb([128, 128, 128]);

const SAMPLE_EDGE: u32 = 128;
const HUE_BUCKETS: usize = 36;
/// Below this saturation a pixel has no meaningful hue
const MIN_CHROMA: f32 = 12.0;

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    weight: f32,
    r: u64,
    g: u64,
    b: u64,
    count: u64,
}

impl Bucket {
    fn add(&mut self, [r, g, b]: [u8; 3], weight: f32) {
        self.weight += weight;
        self.r += r as u64;
        self.g += g as u64;
        self.b += b as u64;
        self.count += 1;
    }

    fn mean(&self) -> Option<Rgb> {
        (self.count > 0).then(|| {
            Rgb([
                (self.r / self.count) as u8,
                (self.g / self.count) as u8,
                (self.b / self.count) as u8,
            ])
        })
    }
}

/// Pick the dominant color of an image.
///
/// Opaque pixels are voted into hue buckets weighted by saturation; the
/// winning bucket's mean color is the seed. Images without chromatic pixels
/// fall back to the plain average, fully transparent ones to gray.
pub fn extract_seed(image: &DynamicImage) -> Rgb {
    let sampled = if image.width() > SAMPLE_EDGE || image.height() > SAMPLE_EDGE
    {
        image.thumbnail(SAMPLE_EDGE, SAMPLE_EDGE)
    } else {
        image.clone()
    };
    let rgba = sampled.to_rgba8();

    let mut buckets = [Bucket::default(); HUE_BUCKETS];
    let mut overall = Bucket::default();

    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        if a <= 128 {
            // Only count non-transparent pixels
            continue;
        }

        overall.add([r, g, b], 1.0);

        let hsl = HsluvColor::from_rgb(Rgb([r, g, b]));
        if hsl.saturation < MIN_CHROMA
            || hsl.lightness < 8.0
            || hsl.lightness > 95.0
        {
            continue;
        }

        let index = ((hsl.hue / 360.0) * HUE_BUCKETS as f32) as usize;
        buckets[index.min(HUE_BUCKETS - 1)].add([r, g, b], hsl.saturation);
    }

    let dominant = buckets
        .iter()
        .filter(|bucket| bucket.count > 0)
        .max_by(|a, b| a.weight.total_cmp(&b.weight));

    dominant
        .and_then(Bucket::mean)
        .or_else(|| overall.mean())
        .unwrap_or(FALLBACK_SEED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    #[test]
    fn solid_color_is_its_own_seed() {
        let img = ImageBuffer::from_pixel(10, 10, Rgba([200u8, 40, 40, 255]));
        let seed = extract_seed(&DynamicImage::ImageRgba8(img));
        assert_eq!(seed, Rgb([200, 40, 40]));
    }

    #[test]
    fn saturated_minority_beats_gray_majority() {
        let img = ImageBuffer::from_fn(20, 20, |x, _| {
            if x < 4 {
                Rgba([20u8, 90, 220, 255])
            } else {
                Rgba([120u8, 120, 120, 255])
            }
        });
        let seed = extract_seed(&DynamicImage::ImageRgba8(img));
        assert_eq!(seed, Rgb([20, 90, 220]));
    }

    #[test]
    fn gray_image_uses_average() {
        let img = ImageBuffer::from_pixel(8, 8, Rgba([60u8, 60, 60, 255]));
        assert_eq!(
            extract_seed(&DynamicImage::ImageRgba8(img)),
            Rgb([60, 60, 60])
        );
    }

    #[test]
    fn transparent_image_falls_back_to_gray() {
        let img = ImageBuffer::from_pixel(8, 8, Rgba([255u8, 0, 0, 0]));
        assert_eq!(extract_seed(&DynamicImage::ImageRgba8(img)), FALLBACK_SEED);
    }

    #[test]
    fn large_images_are_downsampled() {
        let img =
            ImageBuffer::from_pixel(1000, 600, Rgba([30u8, 160, 90, 255]));
        let seed = extract_seed(&DynamicImage::ImageRgba8(img));
        // Resampling a flat image keeps the color within rounding
        let Rgb([r, g, b]) = seed;
        assert!(r.abs_diff(30) <= 1);
        assert!(g.abs_diff(160) <= 1);
        assert!(b.abs_diff(90) <= 1);
    }
}
