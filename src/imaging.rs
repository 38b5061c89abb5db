//! Rendition generation — decode, normalize, downscale, JPEG encode.
//!
//! Pure Rust via the `image` crate; no external binaries. One operation:
//! [`render`] takes a source photo and a target width and writes a
//! JPEG-encoded copy.
//!
//! Color policy: output must always be JPEG-encodable, so images with an
//! alpha channel are flattened onto a white background and everything else
//! is converted to 8-bit RGB. Lossy, but deterministic.
//!
//! Scaling policy: downscale only. A source at or below the target width is
//! re-encoded at its native size; the target height is
//! `round(height * target_width / width)`, preserving aspect ratio.
//! Resampling is Lanczos3.
//!
//! The output keeps the source filename — including a `.png` extension on
//! what is now JPEG data. The published site links renditions by source
//! filename, so this mismatch is load-bearing and deliberately not fixed.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbImage};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Final dimensions of a written rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Decode `source`, normalize to opaque RGB, scale down to at most
/// `target_width`, and write a JPEG at `quality` to `output`.
pub fn render(
    source: &Path,
    output: &Path,
    target_width: u32,
    quality: u8,
) -> Result<Dimensions, ImagingError> {
    let img = ImageReader::open(source)?
        .decode()
        .map_err(|e| ImagingError::Decode {
            path: source.to_path_buf(),
            source: e,
        })?;

    let rgb = flatten_to_rgb(img);
    let scaled = scale_down(rgb, target_width);
    let dims = Dimensions {
        width: scaled.width(),
        height: scaled.height(),
    };

    let file = std::fs::File::create(output)?;
    let writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(writer, quality)
        .encode_image(&scaled)
        .map_err(|e| ImagingError::Encode {
            path: output.to_path_buf(),
            source: e,
        })?;
    Ok(dims)
}

/// Normalize any decoded image to opaque 8-bit RGB.
///
/// Images carrying alpha are composited onto white; everything else is a
/// direct conversion. (Palette PNGs decode to RGB/RGBA upstream, so the
/// white-background path covers them too.)
fn flatten_to_rgb(img: DynamicImage) -> RgbImage {
    if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        let mut flat = RgbImage::from_pixel(rgba.width(), rgba.height(), image::Rgb([255, 255, 255]));
        for (x, y, pixel) in rgba.enumerate_pixels() {
            let alpha = pixel[3] as u16;
            let blend = |fg: u8| -> u8 {
                ((fg as u16 * alpha + 255 * (255 - alpha)) / 255) as u8
            };
            flat.put_pixel(x, y, image::Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
        }
        flat
    } else {
        img.to_rgb8()
    }
}

/// Downscale to `target_width` when the image is wider; never upscale.
fn scale_down(img: RgbImage, target_width: u32) -> RgbImage {
    let (width, height) = img.dimensions();
    if width <= target_width {
        return img;
    }
    let target_height = scaled_height(width, height, target_width);
    image::imageops::resize(&img, target_width, target_height, FilterType::Lanczos3)
}

/// `round(height * target_width / width)`, clamped to at least one pixel.
fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    let scaled = (height as f64 * target_width as f64 / width as f64).round() as u32;
    scaled.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageEncoder, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        JpegEncoder::new_with_quality(BufWriter::new(file), 90)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    fn write_test_rgba_png(path: &Path, width: u32, height: u32, alpha: u8) {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 100, 50, alpha]));
        img.save(path).unwrap();
    }

    #[test]
    fn wide_source_is_downscaled() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("wide.jpg");
        write_test_jpeg(&source, 800, 600);

        let output = tmp.path().join("out.jpg");
        let dims = render(&source, &output, 400, 85).unwrap();
        assert_eq!(dims, Dimensions { width: 400, height: 300 });

        let (w, h) = image::image_dimensions(&output).unwrap();
        assert_eq!((w, h), (400, 300));
    }

    #[test]
    fn narrow_source_is_not_upscaled() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("narrow.jpg");
        write_test_jpeg(&source, 300, 200);

        let output = tmp.path().join("out.jpg");
        let dims = render(&source, &output, 1600, 85).unwrap();
        assert_eq!(dims, Dimensions { width: 300, height: 200 });
    }

    #[test]
    fn source_exactly_at_target_is_untouched() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("exact.jpg");
        write_test_jpeg(&source, 400, 500);

        let output = tmp.path().join("out.jpg");
        let dims = render(&source, &output, 400, 85).unwrap();
        assert_eq!(dims, Dimensions { width: 400, height: 500 });
    }

    #[test]
    fn height_is_rounded_not_truncated() {
        // 1000x667 at target 400: 667 * 0.4 = 266.8 -> 267
        assert_eq!(scaled_height(1000, 667, 400), 267);
        // Truncation would give 266.
    }

    #[test]
    fn tiny_target_never_yields_zero_height() {
        assert_eq!(scaled_height(10_000, 10, 100), 1);
    }

    #[test]
    fn alpha_png_flattened_to_white_jpeg() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("translucent.png");
        write_test_rgba_png(&source, 50, 50, 0);

        // Output keeps the .png name even though the bytes are JPEG.
        let output = tmp.path().join("translucent-out.png");
        render(&source, &output, 400, 85).unwrap();

        let decoded = ImageReader::open(&output)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
            .to_rgb8();
        // Fully transparent source pixels become white (within JPEG tolerance).
        let pixel = decoded.get_pixel(25, 25);
        assert!(pixel[0] > 245 && pixel[1] > 245 && pixel[2] > 245, "{pixel:?}");
    }

    #[test]
    fn opaque_png_colors_preserved() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("opaque.png");
        write_test_rgba_png(&source, 40, 40, 255);

        let output = tmp.path().join("out.png");
        render(&source, &output, 400, 95).unwrap();

        let decoded = ImageReader::open(&output)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
            .to_rgb8();
        let pixel = decoded.get_pixel(20, 20);
        assert!(pixel[0].abs_diff(200) < 12, "{pixel:?}");
        assert!(pixel[1].abs_diff(100) < 12, "{pixel:?}");
        assert!(pixel[2].abs_diff(50) < 12, "{pixel:?}");
    }

    #[test]
    fn undecodable_source_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("garbage.jpg");
        std::fs::write(&source, b"not an image").unwrap();

        let output = tmp.path().join("out.jpg");
        let result = render(&source, &output, 400, 85);
        assert!(matches!(result, Err(ImagingError::Decode { .. })));
    }

    #[test]
    fn missing_source_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = render(
            &tmp.path().join("absent.jpg"),
            &tmp.path().join("out.jpg"),
            400,
            85,
        );
        assert!(result.is_err());
    }
}
