//! Tag name normalization and parsing of free-text tag input

use crate::error::{Result, TaggitError};
use crate::models::MAX_TAG_NAME_LENGTH;

/// Trim a raw tag name and validate it
///
/// Case is preserved: tag lookups are case-sensitive.
pub fn normalize_tag_name(raw: &str) -> Result<String> {
	let name = raw.trim();
	if name.is_empty() {
		return Err(TaggitError::EmptyTagName);
	}
	if name.contains(',') || name.chars().any(char::is_control) {
		return Err(TaggitError::InvalidCharacters(name.to_string()));
	}
	let len = name.chars().count();
	if len > MAX_TAG_NAME_LENGTH {
		return Err(TaggitError::TagNameTooLong {
			max: MAX_TAG_NAME_LENGTH,
			len,
		});
	}
	Ok(name.to_string())
}

/// Parse comma-separated tag input into a sorted, de-duplicated list
///
/// Blank entries are skipped, the way a form field with a trailing comma
/// is expected to behave.
///
/// # Examples
///
/// ```rust
/// use chronicle_taggit::parse_tags;
///
/// let tags = parse_tags("Paris, Berlin,, Paris ").unwrap();
/// assert_eq!(tags, vec!["Berlin".to_string(), "Paris".to_string()]);
/// ```
pub fn parse_tags(input: &str) -> Result<Vec<String>> {
	let mut tags = input
		.split(',')
		.filter(|part| !part.trim().is_empty())
		.map(normalize_tag_name)
		.collect::<Result<Vec<_>>>()?;
	tags.sort();
	tags.dedup();
	Ok(tags)
}
