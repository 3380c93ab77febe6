//! Thumbnail normalization
//!
//! Every stored thumbnail ends up as an RGB JPEG that fits the configured
//! bounding box. Images already inside the box keep their size.

use crate::error::{Result, StorageError};
use crate::storage::MediaStorage;
use chronicle_conf::ThumbnailSettings;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::io::Cursor;

/// Bounding box and encoder quality of a normalized thumbnail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSpec {
	pub max_width: u32,
	pub max_height: u32,
	pub quality: u8,
}

impl ThumbnailSpec {
	pub fn new(max_width: u32, max_height: u32, quality: u8) -> Self {
		Self {
			max_width,
			max_height,
			quality,
		}
	}
}

impl Default for ThumbnailSpec {
	fn default() -> Self {
		Self::from(&ThumbnailSettings::default())
	}
}

impl From<&ThumbnailSettings> for ThumbnailSpec {
	fn from(settings: &ThumbnailSettings) -> Self {
		Self::new(settings.max_width, settings.max_height, settings.quality)
	}
}

/// Encoded thumbnail and its final dimensions
#[derive(Debug, Clone)]
pub struct NormalizedImage {
	pub bytes: Vec<u8>,
	pub width: u32,
	pub height: u32,
}

/// Re-encode image content as a bounded RGB JPEG
///
/// # Examples
///
/// ```
/// use chronicle_storage::{ThumbnailSpec, normalize};
/// use image::{ImageBuffer, Rgb};
///
/// let img = ImageBuffer::from_fn(800, 400, |_, _| Rgb([10u8, 20, 30]));
/// let mut png = Vec::new();
/// img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png).unwrap();
///
/// let out = normalize(&png, ThumbnailSpec::new(400, 500, 90)).unwrap();
/// assert_eq!((out.width, out.height), (400, 200));
/// ```
pub fn normalize(content: &[u8], spec: ThumbnailSpec) -> Result<NormalizedImage> {
	let mut decoder = ImageReader::new(Cursor::new(content))
		.with_guessed_format()?
		.into_decoder()?;
	let orientation = decoder.orientation()?;
	let mut img = DynamicImage::from_decoder(decoder)?;
	img.apply_orientation(orientation);

	// Downscale only
	if img.width() > spec.max_width || img.height() > spec.max_height {
		img = img.resize(spec.max_width, spec.max_height, FilterType::Lanczos3);
	}

	let rgb = img.to_rgb8();
	let mut bytes = Vec::new();
	JpegEncoder::new_with_quality(&mut bytes, spec.quality)
		.encode_image(&rgb)
		.map_err(|e| StorageError::InvalidImage(format!("Failed to encode image: {}", e)))?;

	Ok(NormalizedImage {
		bytes,
		width: rgb.width(),
		height: rgb.height(),
	})
}

/// Normalize a stored file and return the path of the JPEG that replaces it
///
/// The result always carries a `.jpg` extension; the original file is
/// removed when the extension had to change. Decoding and encoding run on
/// the blocking thread pool.
pub async fn normalize_stored(
	storage: &MediaStorage,
	relative: &str,
	spec: ThumbnailSpec,
) -> Result<String> {
	let original = storage.read(relative).await?;
	let normalized = tokio::task::spawn_blocking(move || normalize(&original, spec))
		.await
		.map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

	let target = match relative.rsplit_once('.') {
		Some((stem, ext)) if ext.eq_ignore_ascii_case("jpg") => format!("{stem}.{ext}"),
		Some((stem, _)) => format!("{stem}.jpg"),
		None => format!("{relative}.jpg"),
	};
	// A renamed thumbnail must not clobber a neighbouring upload
	let target = match target.rsplit_once('/') {
		Some((folder, name)) if target != relative => storage.available_name(folder, name).await?,
		_ => target.clone(),
	};

	storage.overwrite(&target, &normalized.bytes).await?;
	if target != relative {
		storage.delete(relative).await?;
	}

	tracing::info!(
		source = %relative,
		target = %target,
		width = normalized.width,
		height = normalized.height,
		"normalized thumbnail"
	);
	Ok(target)
}
