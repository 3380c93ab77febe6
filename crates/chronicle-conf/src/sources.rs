//! Configuration sources for the layered settings system
//!
//! Each source yields a JSON object tree; [`SettingsBuilder`](crate::SettingsBuilder)
//! merges them by priority and deserializes the result.

use crate::error::{ConfError, Result};
use crate::settings::Settings;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync {
	/// Load configuration from this source
	fn load(&self) -> Result<Map<String, Value>>;

	/// Get the priority of this source (higher = more important)
	fn priority(&self) -> u8;

	/// Get a description of this source
	fn description(&self) -> String;
}

/// Built-in defaults
pub struct DefaultSource;

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<Map<String, Value>> {
		match serde_json::to_value(Settings::default())? {
			Value::Object(map) => Ok(map),
			_ => Ok(Map::new()),
		}
	}

	fn priority(&self) -> u8 {
		0
	}

	fn description(&self) -> String {
		"Built-in defaults".to_string()
	}
}

/// TOML file source
///
/// A missing file is treated as empty when the source is optional.
pub struct TomlFileSource {
	path: PathBuf,
	required: bool,
}

impl TomlFileSource {
	pub fn new(path: impl AsRef<Path>) -> Self {
		Self {
			path: path.as_ref().to_path_buf(),
			required: true,
		}
	}

	/// Create a source that silently yields nothing when the file is absent
	pub fn optional(path: impl AsRef<Path>) -> Self {
		Self {
			path: path.as_ref().to_path_buf(),
			required: false,
		}
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> Result<Map<String, Value>> {
		if !self.required && !self.path.exists() {
			return Ok(Map::new());
		}

		let content = fs::read_to_string(&self.path).map_err(|source| ConfError::Io {
			path: self.path.display().to_string(),
			source,
		})?;
		let table: toml::Table = toml::from_str(&content)?;
		match serde_json::to_value(table)? {
			Value::Object(map) => Ok(map),
			_ => Ok(Map::new()),
		}
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Environment variable source
///
/// `CHRONICLE_SERVER__PORT=9000` becomes `{"server": {"port": 9000}}`.
pub struct EnvSource {
	prefix: String,
	vars: Option<Vec<(String, String)>>,
}

impl EnvSource {
	/// Default prefix of recognized variables
	pub const DEFAULT_PREFIX: &'static str = "CHRONICLE_";

	/// Read the process environment
	pub fn new() -> Self {
		Self {
			prefix: Self::DEFAULT_PREFIX.to_string(),
			vars: None,
		}
	}

	/// Read a fixed set of variables instead of the process environment
	pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
		Self {
			prefix: Self::DEFAULT_PREFIX.to_string(),
			vars: Some(vars.into_iter().collect()),
		}
	}

	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = prefix.into();
		self
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<Map<String, Value>> {
		let vars: Vec<(String, String)> = match &self.vars {
			Some(vars) => vars.clone(),
			None => std::env::vars().collect(),
		};

		let mut config = Map::new();
		for (key, value) in vars {
			let Some(clean_key) = key.strip_prefix(&self.prefix) else {
				continue;
			};
			let path: Vec<String> = clean_key
				.split("__")
				.filter(|part| !part.is_empty())
				.map(str::to_lowercase)
				.collect();
			if path.is_empty() {
				continue;
			}
			insert_path(&mut config, &path, parse_scalar(&value));
		}
		Ok(config)
	}

	fn priority(&self) -> u8 {
		100 // Highest priority
	}

	fn description(&self) -> String {
		format!("Environment variables (prefix: {})", self.prefix)
	}
}

fn parse_scalar(value: &str) -> Value {
	if let Ok(num) = value.parse::<i64>() {
		Value::Number(num.into())
	} else if let Ok(b) = value.parse::<bool>() {
		Value::Bool(b)
	} else {
		Value::String(value.to_string())
	}
}

fn insert_path(map: &mut Map<String, Value>, path: &[String], value: Value) {
	let (head, rest) = match path.split_first() {
		Some(split) => split,
		None => return,
	};
	if rest.is_empty() {
		map.insert(head.clone(), value);
		return;
	}
	let entry = map
		.entry(head.clone())
		.or_insert_with(|| Value::Object(Map::new()));
	if !entry.is_object() {
		*entry = Value::Object(Map::new());
	}
	if let Value::Object(child) = entry {
		insert_path(child, rest, value);
	}
}

/// Recursively merge `overlay` into `base`, overlay winning on conflicts
pub(crate) fn merge(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
	for (key, value) in overlay {
		match (base.get_mut(&key), value) {
			(Some(Value::Object(existing)), Value::Object(incoming)) => merge(existing, incoming),
			(_, value) => {
				base.insert(key, value);
			}
		}
	}
}
