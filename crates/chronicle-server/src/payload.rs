//! Request and response bodies of the JSON API

use crate::error::ViewError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate, Utc};
use chronicle_db::{Comment, NewComment, NewRecord, Record, RecordChanges, Status};
use chronicle_storage::MediaStorage;
use chronicle_taggit::parse_tags;
use serde::{Deserialize, Deserializer, Serialize};

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`)
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
	T: Deserialize<'de>,
	D: Deserializer<'de>,
{
	Option::<T>::deserialize(deserializer).map(Some)
}

/// Uploaded image carried inline in a JSON body
#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailUpload {
	pub filename: String,
	pub content_base64: String,
}

impl ThumbnailUpload {
	pub fn decode(&self) -> Result<Vec<u8>, ViewError> {
		STANDARD
			.decode(self.content_base64.trim())
			.map_err(|e| ViewError::BadRequest(format!("thumbnail is not valid base64: {}", e)))
	}
}

/// Body of the record create and update endpoints
///
/// Every field is optional so the same shape serves partial updates.
/// `thumbnail: null` on update removes the current thumbnail.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecordPayload {
	pub title: Option<String>,
	pub slug: Option<String>,
	pub short_description: Option<String>,
	pub full_description: Option<String>,
	pub status: Option<Status>,
	#[serde(deserialize_with = "double_option")]
	pub date_happened: Option<Option<NaiveDate>>,
	#[serde(deserialize_with = "tag_list")]
	pub tags_places: Option<Vec<String>>,
	#[serde(deserialize_with = "tag_list")]
	pub tags_people: Option<Vec<String>>,
	#[serde(deserialize_with = "double_option")]
	pub thumbnail: Option<Option<ThumbnailUpload>>,
}

impl RecordPayload {
	/// Upload to store, if the payload carries one
	pub fn upload(&self) -> Option<&ThumbnailUpload> {
		self.thumbnail.as_ref().and_then(Option::as_ref)
	}

	/// Fields of a new record; the thumbnail is filled in by the caller
	pub fn into_new_record(self) -> Result<NewRecord, ViewError> {
		let title = self
			.title
			.ok_or_else(|| ViewError::Unprocessable("title is required".to_string()))?;
		Ok(NewRecord {
			title,
			slug: self.slug.filter(|s| !s.is_empty()),
			short_description: self.short_description.unwrap_or_default(),
			full_description: self.full_description.unwrap_or_default(),
			thumbnail: None,
			status: self.status.unwrap_or_default(),
			date_happened: self.date_happened.flatten(),
			tags_places: self.tags_places.unwrap_or_default(),
			tags_people: self.tags_people.unwrap_or_default(),
		})
	}

	/// Field changes of an update; the thumbnail is filled in by the caller
	pub fn into_changes(self) -> RecordChanges {
		RecordChanges {
			title: self.title,
			slug: self.slug.filter(|s| !s.is_empty()),
			short_description: self.short_description,
			full_description: self.full_description,
			thumbnail: match self.thumbnail {
				Some(None) => Some(None),
				_ => None,
			},
			status: self.status,
			date_happened: self.date_happened,
			tags_places: self.tags_places,
			tags_people: self.tags_people,
		}
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagInput {
	List(Vec<String>),
	Text(String),
}

/// Tags arrive as a JSON list or as comma-separated text, as typed into a
/// tag field
fn tag_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
	D: Deserializer<'de>,
{
	match Option::<TagInput>::deserialize(deserializer)? {
		None => Ok(None),
		Some(TagInput::List(tags)) => Ok(Some(tags)),
		Some(TagInput::Text(text)) => parse_tags(&text)
			.map(Some)
			.map_err(serde::de::Error::custom),
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdField {
	Number(i64),
	Text(String),
}

/// Parent ids arrive as JSON numbers or as form strings; blank means none
fn parent_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
	D: Deserializer<'de>,
{
	match Option::<IdField>::deserialize(deserializer)? {
		None => Ok(None),
		Some(IdField::Number(id)) => Ok(Some(id)),
		Some(IdField::Text(text)) if text.trim().is_empty() => Ok(None),
		Some(IdField::Text(text)) => text
			.trim()
			.parse()
			.map(Some)
			.map_err(|_| serde::de::Error::custom(format!("invalid parent id '{}'", text))),
	}
}

/// Body of the comment endpoint, JSON or form encoded
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentPayload {
	#[serde(default, deserialize_with = "parent_id")]
	pub parent: Option<i64>,
	#[serde(default)]
	pub content: String,
}

impl From<CommentPayload> for NewComment {
	fn from(payload: CommentPayload) -> Self {
		NewComment {
			parent: payload.parent,
			content: payload.content,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordView {
	pub id: i64,
	pub title: String,
	pub slug: String,
	pub url: String,
	pub short_description: String,
	pub full_description: String,
	pub thumbnail: Option<String>,
	pub thumbnail_url: Option<String>,
	pub status: Status,
	pub date_happened: Option<NaiveDate>,
	pub author: String,
	pub updaters: Vec<String>,
	pub tags_places: Vec<String>,
	pub tags_people: Vec<String>,
	pub time_create: DateTime<Utc>,
	pub time_update: DateTime<Utc>,
}

impl RecordView {
	pub fn new(record: Record, storage: &MediaStorage) -> Self {
		Self {
			id: record.id,
			url: format!("/records/{}/", record.slug),
			thumbnail_url: record.thumbnail.as_deref().map(|path| storage.url(path)),
			title: record.title,
			slug: record.slug,
			short_description: record.short_description,
			full_description: record.full_description,
			thumbnail: record.thumbnail,
			status: record.status,
			date_happened: record.date_happened,
			author: record.author.username,
			updaters: record.updaters.into_iter().map(|u| u.username).collect(),
			tags_places: record.tags_places,
			tags_people: record.tags_people,
			time_create: record.time_create,
			time_update: record.time_update,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
	pub id: i64,
	pub record_id: i64,
	pub author: String,
	pub parent: Option<i64>,
	pub content: String,
	pub depth: i64,
	pub sort_key: String,
	pub time_create: DateTime<Utc>,
}

impl From<Comment> for CommentView {
	fn from(comment: Comment) -> Self {
		Self {
			id: comment.id,
			record_id: comment.record_id,
			author: comment.author.username,
			parent: comment.parent_id,
			content: comment.content,
			depth: comment.depth,
			sort_key: comment.sort_key,
			time_create: comment.time_create,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn test_absent_and_null_are_distinct() {
		// Arrange
		let absent: RecordPayload = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
		let null: RecordPayload =
			serde_json::from_str(r#"{"date_happened": null, "thumbnail": null}"#).unwrap();

		// Act
		let absent = absent.into_changes();
		let null = null.into_changes();

		// Assert
		assert_eq!(absent.date_happened, None);
		assert_eq!(absent.thumbnail, None);
		assert_eq!(null.date_happened, Some(None));
		assert_eq!(null.thumbnail, Some(None));
	}

	#[test]
	fn test_new_record_requires_title() {
		let payload = RecordPayload::default();
		assert!(matches!(
			payload.into_new_record(),
			Err(ViewError::Unprocessable(_))
		));
	}

	#[rstest]
	#[case(r#"{"tags_people": ["Ada", "Bob"]}"#, Some(vec!["Ada", "Bob"]))]
	#[case(r#"{"tags_people": "Bob, Ada,, Bob"}"#, Some(vec!["Ada", "Bob"]))]
	#[case(r#"{"tags_people": ""}"#, Some(vec![]))]
	#[case(r#"{"tags_people": null}"#, None)]
	#[case(r#"{}"#, None)]
	fn test_tags_from_list_or_text(#[case] body: &str, #[case] expected: Option<Vec<&str>>) {
		let payload: RecordPayload = serde_json::from_str(body).unwrap();
		let expected = expected.map(|tags| tags.into_iter().map(String::from).collect::<Vec<_>>());
		assert_eq!(payload.tags_people, expected);
	}

	#[test]
	fn test_unknown_fields_are_rejected() {
		let result = serde_json::from_str::<RecordPayload>(r#"{"titel": "typo"}"#);
		assert!(result.is_err());
	}

	#[rstest]
	#[case(r#"{"content": "hi"}"#, None)]
	#[case(r#"{"content": "hi", "parent": null}"#, None)]
	#[case(r#"{"content": "hi", "parent": 7}"#, Some(7))]
	#[case(r#"{"content": "hi", "parent": "7"}"#, Some(7))]
	#[case(r#"{"content": "hi", "parent": ""}"#, None)]
	fn test_comment_parent_from_json(#[case] body: &str, #[case] parent: Option<i64>) {
		let payload: CommentPayload = serde_json::from_str(body).unwrap();
		assert_eq!(payload.parent, parent);
	}

	#[rstest]
	#[case("content=hi&parent=", None)]
	#[case("content=hi&parent=3", Some(3))]
	#[case("content=hi", None)]
	fn test_comment_parent_from_form(#[case] body: &str, #[case] parent: Option<i64>) {
		let payload: CommentPayload = serde_urlencoded::from_str(body).unwrap();
		assert_eq!(payload.parent, parent);
	}

	#[test]
	fn test_invalid_parent_is_rejected() {
		let result = serde_urlencoded::from_str::<CommentPayload>("content=hi&parent=abc");
		assert!(result.is_err());
	}

	#[test]
	fn test_upload_decodes_base64() {
		let upload = ThumbnailUpload {
			filename: "a.png".into(),
			content_base64: STANDARD.encode(b"bytes"),
		};
		assert_eq!(upload.decode().unwrap(), b"bytes");
	}
}
