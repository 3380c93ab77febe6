//! # chronicle-taggit
//!
//! Namespaced tagging for chronicle records, inspired by django-taggit.
//!
//! A record carries two independent tag sets: the places an event happened
//! in and the people involved. Both share the [`Tag`] model and are told
//! apart by [`TagNamespace`].
//!
//! ## Quick Start
//!
//! ```rust
//! use chronicle_taggit::{Tag, TagNamespace};
//!
//! let tag = Tag::from_name(TagNamespace::People, "Ada Lovelace").unwrap();
//! assert_eq!(tag.slug, "ada-lovelace");
//! assert_eq!(tag.namespace.as_str(), "people");
//! ```

pub mod error;
pub mod models;
pub mod parse;

pub use error::{Result, TaggitError};
pub use models::{MAX_TAG_NAME_LENGTH, Tag, TagNamespace, Taggable};
pub use parse::{normalize_tag_name, parse_tags};

/// Prelude module for convenient imports
pub mod prelude {
	pub use crate::error::{Result, TaggitError};
	pub use crate::models::{Tag, TagNamespace, Taggable};
	pub use crate::parse::parse_tags;
}
