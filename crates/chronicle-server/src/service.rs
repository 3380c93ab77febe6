//! Record save path
//!
//! Uploads are stored, then normalized into a bounded JPEG before the record
//! row points at them. A thumbnail is removed again when it fails to decode
//! or when the record write that would reference it fails.

use crate::error::ViewError;
use crate::payload::{RecordPayload, ThumbnailUpload};
use chronicle_db::{Record, TrackedRecord, User, records};
use chronicle_storage::{MediaStorage, THUMBNAIL_UPLOAD_TO, ThumbnailSpec, normalize_stored};
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct RecordService {
	pool: SqlitePool,
	storage: MediaStorage,
	thumbnails: ThumbnailSpec,
}

impl RecordService {
	pub fn new(pool: SqlitePool, storage: MediaStorage, thumbnails: ThumbnailSpec) -> Self {
		Self {
			pool,
			storage,
			thumbnails,
		}
	}

	pub fn storage(&self) -> &MediaStorage {
		&self.storage
	}

	/// Store an upload and normalize it into the thumbnail it becomes
	///
	/// The raw upload is removed again when it does not decode.
	async fn store_thumbnail(&self, upload: &ThumbnailUpload) -> Result<String, ViewError> {
		MediaStorage::validate_image_extension(&upload.filename)?;
		let content = upload.decode()?;
		let stored = self
			.storage
			.save(THUMBNAIL_UPLOAD_TO, &upload.filename, &content, chrono::Utc::now())
			.await?;

		match normalize_stored(&self.storage, &stored, self.thumbnails).await {
			Ok(normalized) => Ok(normalized),
			Err(e) => {
				self.discard(&stored).await;
				Err(e.into())
			}
		}
	}

	/// Remove a file no record points at
	async fn discard(&self, path: &str) {
		if let Err(e) = self.storage.delete(path).await {
			tracing::warn!(path = %path, error = %e, "could not remove orphaned media file");
		}
	}

	/// Create a record authored by `author`
	///
	/// The payload is checked before anything is written to the media root,
	/// and a stored thumbnail is removed again when the insert fails.
	pub async fn create(&self, author: &User, payload: RecordPayload) -> Result<Record, ViewError> {
		let upload = payload.upload().cloned();
		let mut new = payload.into_new_record()?;
		if let Some(upload) = upload {
			new.thumbnail = Some(self.store_thumbnail(&upload).await?);
		}

		let thumbnail = new.thumbnail.clone();
		match records::create_record(&self.pool, author, new).await {
			Ok(record) => Ok(record),
			Err(e) => {
				if let Some(path) = thumbnail {
					self.discard(&path).await;
				}
				Err(e.into())
			}
		}
	}

	/// Apply an update by `updater` to the record with `slug`
	///
	/// A new thumbnail is normalized only when it differs from the one the
	/// record was loaded with, and is removed again when the update fails.
	pub async fn update(
		&self,
		updater: &User,
		slug: &str,
		payload: RecordPayload,
	) -> Result<Record, ViewError> {
		let mut tracked = TrackedRecord::new(records::get_by_slug(&self.pool, slug).await?);

		let upload = payload.upload().cloned();
		let mut changes = payload.into_changes();
		if let Some(upload) = upload {
			changes.thumbnail = Some(Some(self.store_thumbnail(&upload).await?));
		}
		changes.apply_to(&mut tracked.record);

		let fresh = if tracked.thumbnail_changed() {
			tracked.record.thumbnail.clone()
		} else {
			None
		};
		match records::update_record(&self.pool, updater, slug, changes).await {
			Ok(record) => Ok(record),
			Err(e) => {
				if let Some(path) = fresh {
					self.discard(&path).await;
				}
				Err(e.into())
			}
		}
	}
}
