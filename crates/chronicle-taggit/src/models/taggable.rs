//! Taggable trait definition

use super::namespace::TagNamespace;

/// Trait for models that can be tagged
///
/// The object identifier is the primary key stored in the link table, and
/// `tag_names` exposes the current tag set of a namespace.
///
/// # Examples
///
/// ```rust
/// use chronicle_taggit::{TagNamespace, Taggable};
///
/// struct Photo {
///     id: i64,
///     people: Vec<String>,
/// }
///
/// impl Taggable for Photo {
///     fn object_id(&self) -> i64 {
///         self.id
///     }
///
///     fn tag_names(&self, namespace: TagNamespace) -> &[String] {
///         match namespace {
///             TagNamespace::People => &self.people,
///             TagNamespace::Places => &[],
///         }
///     }
/// }
///
/// let photo = Photo { id: 7, people: vec!["Ada".into()] };
/// assert!(photo.has_tag(TagNamespace::People, "Ada"));
/// assert!(!photo.has_tag(TagNamespace::Places, "Ada"));
/// ```
pub trait Taggable {
	/// Returns the primary key of this instance
	fn object_id(&self) -> i64;

	/// Returns the tag names of this instance in the given namespace
	fn tag_names(&self, namespace: TagNamespace) -> &[String];

	/// Whether the instance carries a tag with exactly this name
	fn has_tag(&self, namespace: TagNamespace, name: &str) -> bool {
		self.tag_names(namespace).iter().any(|t| t == name)
	}
}
