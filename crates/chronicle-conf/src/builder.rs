//! Settings builder merging sources by priority

use crate::error::Result;
use crate::settings::Settings;
use crate::sources::{ConfigSource, DefaultSource, merge};
use serde_json::{Map, Value};

/// Builder assembling [`Settings`] from prioritized sources
///
/// Built-in defaults are always the lowest layer.
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self {
			sources: vec![Box::new(DefaultSource)],
		}
	}

	pub fn add_source(mut self, source: impl ConfigSource + 'static) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Merge all sources, deserialize and validate
	pub fn build(mut self) -> Result<Settings> {
		self.sources.sort_by_key(|source| source.priority());

		let mut merged = Map::new();
		for source in &self.sources {
			tracing::debug!(source = %source.description(), "loading settings source");
			merge(&mut merged, source.load()?);
		}

		let settings: Settings = serde_json::from_value(Value::Object(merged))?;
		settings.validate()?;
		Ok(settings)
	}
}

impl Default for SettingsBuilder {
	fn default() -> Self {
		Self::new()
	}
}
