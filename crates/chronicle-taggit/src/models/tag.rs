use super::namespace::TagNamespace;
use crate::error::Result;
use crate::parse::normalize_tag_name;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a tag name, in characters
pub const MAX_TAG_NAME_LENGTH: usize = 100;

/// Tag entity
///
/// `id` is `None` until the tag has been stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
	pub id: Option<i64>,
	pub namespace: TagNamespace,
	pub name: String,
	pub slug: String,
	pub created_at: DateTime<Utc>,
}

impl Tag {
	/// Create a tag with an explicit slug
	///
	/// # Examples
	///
	/// ```rust
	/// use chronicle_taggit::{Tag, TagNamespace};
	///
	/// let tag = Tag::new(TagNamespace::Places, "Paris", "paris-fr");
	/// assert_eq!(tag.slug, "paris-fr");
	/// assert!(tag.id.is_none());
	/// ```
	pub fn new(namespace: TagNamespace, name: impl Into<String>, slug: impl Into<String>) -> Self {
		Self {
			id: None,
			namespace,
			name: name.into(),
			slug: slug.into(),
			created_at: Utc::now(),
		}
	}

	/// Create a tag from a raw name, normalizing it and deriving the slug
	///
	/// # Examples
	///
	/// ```rust
	/// use chronicle_taggit::{Tag, TagNamespace};
	///
	/// let tag = Tag::from_name(TagNamespace::People, "  Marie Curie ").unwrap();
	/// assert_eq!(tag.name, "Marie Curie");
	/// assert_eq!(tag.slug, "marie-curie");
	/// ```
	pub fn from_name(namespace: TagNamespace, raw: &str) -> Result<Self> {
		let name = normalize_tag_name(raw)?;
		let slug = slug::slugify(&name);
		Ok(Self::new(namespace, name, slug))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::TaggitError;
	use rstest::rstest;

	#[rstest]
	#[case("Rust", "rust")]
	#[case("Café Society", "cafe-society")]
	#[case("web development", "web-development")]
	fn test_from_name_derives_slug(#[case] name: &str, #[case] expected_slug: &str) {
		// Arrange & Act
		let tag = Tag::from_name(TagNamespace::Places, name).unwrap();

		// Assert
		assert_eq!(tag.name, name);
		assert_eq!(tag.slug, expected_slug);
	}

	#[test]
	fn test_from_name_rejects_blank() {
		let result = Tag::from_name(TagNamespace::People, "   ");
		assert!(matches!(result, Err(TaggitError::EmptyTagName)));
	}
}
