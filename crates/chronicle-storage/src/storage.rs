//! Filesystem media storage
//!
//! Paths handed out by this module are relative to the media root and use
//! forward slashes, so they can be stored in the database and joined onto
//! the media URL unchanged.

use crate::error::{Result, StorageError};
use chrono::{DateTime, Utc};
use chronicle_conf::MediaSettings;
use rand::Rng;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Upload folder of record thumbnails
pub const THUMBNAIL_UPLOAD_TO: &str = "images/thumbnails";

/// Extensions accepted for image uploads (compared case-insensitively)
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "webp", "jpeg", "gif"];

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const MAX_NAME_ATTEMPTS: usize = 10;

/// Media storage rooted at a directory
///
/// # Examples
///
/// ```
/// use chronicle_storage::MediaStorage;
///
/// let storage = MediaStorage::new("/var/www/media", "/media/");
/// assert_eq!(
///     storage.url("images/thumbnails/2024/01/02/a.jpg"),
///     "/media/images/thumbnails/2024/01/02/a.jpg"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct MediaStorage {
	root: PathBuf,
	base_url: String,
}

impl MediaStorage {
	pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
		Self {
			root: root.into(),
			base_url: base_url.into(),
		}
	}

	pub fn from_settings(settings: &MediaSettings) -> Self {
		Self::new(settings.root.clone(), settings.url.clone())
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Relative folder `{upload_to}/YYYY/MM/DD` for the given instant
	///
	/// # Examples
	///
	/// ```
	/// use chronicle_storage::MediaStorage;
	/// use chrono::{TimeZone, Utc};
	///
	/// let at = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
	/// assert_eq!(
	///     MediaStorage::dated_folder("images/thumbnails", at),
	///     "images/thumbnails/2024/03/09"
	/// );
	/// ```
	pub fn dated_folder(upload_to: &str, at: DateTime<Utc>) -> String {
		format!(
			"{}/{}",
			upload_to.trim_end_matches('/'),
			at.format("%Y/%m/%d")
		)
	}

	/// Reject names whose extension is not an accepted image type
	pub fn validate_image_extension(file_name: &str) -> Result<()> {
		let extension = Path::new(file_name)
			.extension()
			.and_then(|ext| ext.to_str())
			.map(str::to_ascii_lowercase)
			.unwrap_or_default();
		if ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
			Ok(())
		} else {
			Err(StorageError::InvalidExtension(extension))
		}
	}

	/// Reduce a client-supplied file name to a safe final path component
	pub fn sanitize_name(file_name: &str) -> Result<String> {
		let base = file_name
			.rsplit(['/', '\\'])
			.next()
			.unwrap_or_default()
			.trim();
		let cleaned: String = base
			.chars()
			.map(|ch| {
				if ch.is_alphanumeric() || matches!(ch, '.' | '-' | '_') {
					ch
				} else {
					'_'
				}
			})
			.collect();
		let cleaned = cleaned.trim_start_matches('.').to_string();
		if cleaned.is_empty() {
			return Err(StorageError::InvalidPath(file_name.to_string()));
		}
		Ok(cleaned)
	}

	/// Save content under `{upload_to}/YYYY/MM/DD/` and return its relative path
	///
	/// An existing file is never overwritten: a random suffix is added to the
	/// stem until the name is free.
	pub async fn save(
		&self,
		upload_to: &str,
		file_name: &str,
		content: &[u8],
		at: DateTime<Utc>,
	) -> Result<String> {
		let name = Self::sanitize_name(file_name)?;
		let folder = Self::dated_folder(upload_to, at);
		let relative = self.available_name(&folder, &name).await?;
		self.overwrite(&relative, content).await?;

		tracing::debug!(path = %relative, bytes = content.len(), "stored media file");
		Ok(relative)
	}

	/// Write content at a relative path, replacing any previous file
	pub async fn overwrite(&self, relative: &str, content: &[u8]) -> Result<()> {
		let absolute = self.path(relative)?;
		if let Some(parent) = absolute.parent() {
			fs::create_dir_all(parent).await?;
		}
		fs::write(absolute, content).await?;
		Ok(())
	}

	pub async fn read(&self, relative: &str) -> Result<Vec<u8>> {
		Ok(fs::read(self.path(relative)?).await?)
	}

	pub async fn exists(&self, relative: &str) -> Result<bool> {
		Ok(fs::try_exists(self.path(relative)?).await?)
	}

	/// Remove a stored file; a missing file is not an error
	pub async fn delete(&self, relative: &str) -> Result<()> {
		match fs::remove_file(self.path(relative)?).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}

	/// Absolute path of a relative media path
	///
	/// Absolute inputs and `..` components are rejected.
	pub fn path(&self, relative: &str) -> Result<PathBuf> {
		let candidate = Path::new(relative);
		let escapes = candidate
			.components()
			.any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
		if relative.is_empty() || escapes {
			return Err(StorageError::InvalidPath(relative.to_string()));
		}
		Ok(self.root.join(candidate))
	}

	/// Public URL of a relative media path
	pub fn url(&self, relative: &str) -> String {
		format!(
			"{}/{}",
			self.base_url.trim_end_matches('/'),
			relative.trim_start_matches('/')
		)
	}

	pub(crate) async fn available_name(&self, folder: &str, name: &str) -> Result<String> {
		let candidate = format!("{folder}/{name}");
		if !self.exists(&candidate).await? {
			return Ok(candidate);
		}

		let (stem, extension) = match name.rsplit_once('.') {
			Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
			_ => (name, None),
		};
		for _ in 0..MAX_NAME_ATTEMPTS {
			let suffix = random_suffix(7);
			let candidate = match extension {
				Some(ext) => format!("{folder}/{stem}_{suffix}.{ext}"),
				None => format!("{folder}/{stem}_{suffix}"),
			};
			if !self.exists(&candidate).await? {
				return Ok(candidate);
			}
		}
		Err(StorageError::InvalidPath(format!(
			"no free name for {folder}/{name}"
		)))
	}
}

/// Random lowercase alphanumeric string
pub(crate) fn random_suffix(len: usize) -> String {
	let mut rng = rand::thread_rng();
	(0..len)
		.map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
		.collect()
}
