use crate::error::{Result, TaggitError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tag category of a record
///
/// A tag name is unique within its namespace only, so "Paris" may exist
/// both as a place and as a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagNamespace {
	/// Places where the recorded event happened
	Places,
	/// People involved in the recorded event
	People,
}

impl TagNamespace {
	/// Stable identifier stored in the `tags.namespace` column
	pub fn as_str(&self) -> &'static str {
		match self {
			TagNamespace::Places => "places",
			TagNamespace::People => "people",
		}
	}
}

impl fmt::Display for TagNamespace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for TagNamespace {
	type Err = TaggitError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"places" => Ok(TagNamespace::Places),
			"people" => Ok(TagNamespace::People),
			other => Err(TaggitError::UnknownNamespace(other.to_string())),
		}
	}
}
