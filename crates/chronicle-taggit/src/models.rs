//! Model definitions for the taggit system
//!
//! - `Tag`: tag entity with namespace, name and slug
//! - `TagNamespace`: the two independent tag categories of a record
//! - `Taggable`: trait for models that carry tags

pub mod namespace;
pub mod tag;
pub mod taggable;

pub use namespace::TagNamespace;
pub use tag::{MAX_TAG_NAME_LENGTH, Tag};
pub use taggable::Taggable;
