//! Image processing
//!
//! Uploads are decoded, shrunk to fit a bounding box and re-encoded as JPEG.
//! Everything here is synchronous and runs on the worker pool.

use std::io::Cursor;

use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, ImageReader};

use crate::prelude::*;

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];
const JPEG_QUALITY: u8 = 85;

/// Decodes `buf`, shrinks it to fit `max_width` x `max_height` keeping the
/// aspect ratio, and re-encodes it as JPEG. Smaller images keep their size.
pub fn resize_to_jpeg_sync(
	buf: &[u8],
	max_width: u32,
	max_height: u32,
) -> Result<Vec<u8>, image::ImageError> {
	let now = std::time::Instant::now();
	let original = ImageReader::new(Cursor::new(buf)).with_guessed_format()?.decode()?;
	debug!("decoded {}x{} [{}ms]", original.width(), original.height(), now.elapsed().as_millis());

	let resized = if original.width() > max_width || original.height() > max_height {
		original.resize(max_width, max_height, FilterType::Lanczos3)
	} else {
		original
	};

	// JPEG has no alpha channel
	let rgb = resized.to_rgb8();
	let mut output = Cursor::new(Vec::new());
	rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY))?;
	Ok(output.into_inner())
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};

	fn png(width: u32, height: u32) -> Vec<u8> {
		let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, [10, 200, 30, 128].into()));
		let mut buf = Cursor::new(Vec::new());
		img.write_to(&mut buf, ImageFormat::Png).unwrap();
		buf.into_inner()
	}

	#[test]
	fn test_large_image_fits_square_box() {
		let jpeg = resize_to_jpeg_sync(&png(1600, 400), 800, 800).unwrap();
		let out = image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg).unwrap();
		assert_eq!(out.dimensions(), (800, 200));
	}

	#[test]
	fn test_tall_image_fits_wide_box() {
		let jpeg = resize_to_jpeg_sync(&png(1000, 1600), 1200, 800).unwrap();
		let out = image::load_from_memory(&jpeg).unwrap();
		assert_eq!(out.dimensions(), (500, 800));
	}

	#[test]
	fn test_small_image_kept_size() {
		let jpeg = resize_to_jpeg_sync(&png(120, 90), 800, 800).unwrap();
		let out = image::load_from_memory(&jpeg).unwrap();
		assert_eq!(out.dimensions(), (120, 90));
	}

	#[test]
	fn test_garbage_rejected() {
		assert!(resize_to_jpeg_sync(b"definitely not an image", 800, 800).is_err());
	}
}

// vim: ts=4
