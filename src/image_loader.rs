//! Decoding helpers for `ImageSource` implementations.
//!
//! The loader engine never decodes anything itself; these functions are what
//! a filesystem or network source typically calls from inside its fetch
//! methods. All of them are blocking and belong on a worker thread.

use crate::error::Result;
use crate::picture::Picture;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Cursor, Seek, Write};
use std::path::Path;

/// Power-of-two downscale factor so that a `width` x `height` image fits in
/// `max_width` x `max_height`. Never less than 1.
pub fn sample_factor(width: u32, height: u32, max_width: u32, max_height: u32) -> u32 {
    if max_width == 0 || max_height == 0 {
        return 1;
    }
    let scale = f64::max(
        height as f64 / max_height as f64,
        width as f64 / max_width as f64,
    );
    if scale <= 1.0 {
        return 1;
    }
    let exponent = scale.log2().ceil() as u32;
    1u32.checked_shl(exponent).unwrap_or(u32::MAX)
}

/// Decodes and applies the EXIF orientation, optionally downscaling first.
fn decode<R: BufRead + Seek>(
    reader: ImageReader<R>,
    bounds: Option<(u32, u32)>,
) -> Result<Picture> {
    let mut decoder = reader.with_guessed_format()?.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;

    if let Some((max_width, max_height)) = bounds {
        let factor = sample_factor(image.width(), image.height(), max_width, max_height);
        if factor > 1 {
            let width = (image.width() / factor).max(1);
            let height = (image.height() / factor).max(1);
            image = image.resize_exact(width, height, FilterType::Triangle);
        }
    }

    image.apply_orientation(orientation);
    Ok(Picture::new(image))
}

/// Decodes a thumbnail as-is (no scaling), correcting its orientation.
pub fn decode_thumbnail(data: &[u8]) -> Result<Picture> {
    decode(ImageReader::new(Cursor::new(data)), None)
}

/// Reads a thumbnail file, correcting its orientation.
pub fn load_thumbnail(path: &Path) -> Result<Picture> {
    decode(ImageReader::open(path)?, None)
}

/// Decodes a full-size image, scaled down by a power of two so that it is no
/// larger than needed for `max_width` x `max_height`.
pub fn decode_full(data: &[u8], max_width: u32, max_height: u32) -> Result<Picture> {
    decode(
        ImageReader::new(Cursor::new(data)),
        Some((max_width, max_height)),
    )
}

/// File variant of [`decode_full`].
pub fn load_full(path: &Path, max_width: u32, max_height: u32) -> Result<Picture> {
    decode(ImageReader::open(path)?, Some((max_width, max_height)))
}

/// Shrinks `picture` so its longest side is at most `max_pixels`, keeping the
/// aspect ratio. Pictures already small enough are returned unchanged.
pub fn make_thumbnail(picture: &Picture, max_pixels: u32) -> Picture {
    if picture.width() <= max_pixels && picture.height() <= max_pixels {
        return picture.clone();
    }
    Picture::new(picture.image().thumbnail(max_pixels, max_pixels))
}

fn is_jpeg_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg"))
        .unwrap_or(false)
}

/// JPEG-encodes `image` at `quality` (1-100). JPEG has no alpha channel, so
/// the picture is flattened to RGB first.
fn encode_jpeg<W: Write>(image: &DynamicImage, quality: u8, writer: W) -> Result<()> {
    let encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
    image.to_rgb8().write_with_encoder(encoder)?;
    Ok(())
}

/// Builds a thumbnail from the full image at `full_path` and writes it to
/// `thumb_path`. Returns the thumbnail.
///
/// With `force_base2` the full image is only ever divided by a power of two,
/// so the result may be smaller than `max_pixels` but is cheaper to produce.
/// `quality` applies when `thumb_path` names a JPEG file; other formats are
/// chosen by extension and written with their defaults.
pub fn create_thumbnail_from_full(
    full_path: &Path,
    thumb_path: &Path,
    max_pixels: u32,
    force_base2: bool,
    quality: u8,
) -> Result<Picture> {
    let thumbnail = if force_base2 {
        load_full(full_path, max_pixels, max_pixels)?
    } else {
        make_thumbnail(&load_thumbnail(full_path)?, max_pixels)
    };

    if let Some(parent) = thumb_path.parent() {
        fs::create_dir_all(parent)?;
    }

    if is_jpeg_path(thumb_path) {
        let mut file = BufWriter::new(File::create(thumb_path)?);
        encode_jpeg(thumbnail.image(), quality, &mut file)?;
        file.flush()?;
    } else {
        thumbnail.image().save(thumb_path)?;
    }

    log::debug!(
        "Created thumbnail {} ({}x{})",
        thumb_path.display(),
        thumbnail.width(),
        thumbnail.height()
    );
    Ok(thumbnail)
}

/// Reads the thumbnail at `path` and returns it re-encoded as JPEG bytes.
pub fn thumbnail_bytes(path: &Path, quality: u8) -> Result<Vec<u8>> {
    let thumbnail = load_thumbnail(path)?;
    let mut bytes = Vec::with_capacity(thumbnail.width() as usize * thumbnail.height() as usize);
    encode_jpeg(thumbnail.image(), quality, &mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn sample_factor_rounds_up_to_power_of_two() {
        assert_eq!(sample_factor(100, 100, 200, 200), 1);
        assert_eq!(sample_factor(200, 200, 200, 200), 1);
        assert_eq!(sample_factor(300, 100, 200, 200), 2);
        assert_eq!(sample_factor(4000, 3000, 1920, 1080), 4);
        assert_eq!(sample_factor(100, 100, 0, 50), 1);
    }

    #[test]
    fn decode_thumbnail_keeps_size() {
        let picture = decode_thumbnail(&png_bytes(40, 20)).unwrap();
        assert_eq!((picture.width(), picture.height()), (40, 20));
    }

    #[test]
    fn decode_full_downscales() {
        let picture = decode_full(&png_bytes(64, 32), 16, 16).unwrap();
        assert_eq!((picture.width(), picture.height()), (16, 8));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_thumbnail(b"not an image").is_err());
    }

    #[test]
    fn make_thumbnail_preserves_aspect() {
        let picture = decode_thumbnail(&png_bytes(400, 200)).unwrap();
        let thumb = make_thumbnail(&picture, 100);
        assert_eq!((thumb.width(), thumb.height()), (100, 50));

        let small = make_thumbnail(&thumb, 500);
        assert!(small.ptr_eq(&thumb));
    }

    #[test]
    fn thumbnail_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let full_path = dir.path().join("full.png");
        let thumb_path = dir.path().join("thumbs").join("full.jpg");
        fs::write(&full_path, png_bytes(300, 150)).unwrap();

        let thumb = create_thumbnail_from_full(&full_path, &thumb_path, 60, false, 90).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (60, 30));

        let reloaded = load_thumbnail(&thumb_path).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (60, 30));
    }

    fn noisy_png(path: &Path, width: u32, height: u32) {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 ^ y * 13) as u8, (x * y) as u8, (x + y * 3) as u8, 255])
        })
        .save(path)
        .unwrap();
    }

    #[test]
    fn base2_thumbnail_halves_only() {
        let dir = tempfile::tempdir().unwrap();
        let full_path = dir.path().join("full.png");
        noisy_png(&full_path, 256, 128);

        let exact_path = dir.path().join("a.png");
        let exact = create_thumbnail_from_full(&full_path, &exact_path, 100, false, 90).unwrap();
        assert_eq!((exact.width(), exact.height()), (100, 50));

        let base2_path = dir.path().join("b.png");
        let base2 = create_thumbnail_from_full(&full_path, &base2_path, 100, true, 90).unwrap();
        assert_eq!((base2.width(), base2.height()), (64, 32));
        assert!(base2.width().is_power_of_two() && base2.height().is_power_of_two());
    }

    #[test]
    fn jpeg_thumbnail_honours_quality() {
        let dir = tempfile::tempdir().unwrap();
        let full_path = dir.path().join("full.png");
        noisy_png(&full_path, 128, 128);

        let low = dir.path().join("low.jpg");
        let high = dir.path().join("high.jpg");
        create_thumbnail_from_full(&full_path, &low, 128, false, 10).unwrap();
        create_thumbnail_from_full(&full_path, &high, 128, false, 95).unwrap();

        let low_size = fs::metadata(&low).unwrap().len();
        let high_size = fs::metadata(&high).unwrap().len();
        assert!(low_size < high_size, "{} >= {}", low_size, high_size);
    }

    #[test]
    fn thumbnail_bytes_are_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thumb.png");
        noisy_png(&path, 64, 48);

        let low = thumbnail_bytes(&path, 10).unwrap();
        let high = thumbnail_bytes(&path, 95).unwrap();
        assert_eq!(image::guess_format(&high).unwrap(), ImageFormat::Jpeg);
        assert!(low.len() < high.len());

        let decoded = decode_thumbnail(&high).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn thumbnail_bytes_of_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(thumbnail_bytes(&dir.path().join("gone.png"), 80).is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_full(&dir.path().join("nope.png"), 10, 10).unwrap_err();
        assert!(matches!(err, crate::error::LoaderError::Io(_)));
    }
}
