//! Integration tests for layered settings loading

use chronicle_conf::{ConfError, EnvSource, SettingsBuilder, TomlFileSource};
use rstest::rstest;
use std::io::Write;

fn write_toml(content: &str) -> tempfile::NamedTempFile {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	file.write_all(content.as_bytes()).unwrap();
	file
}

/// Test a TOML file overrides defaults while keeping the rest
#[test]
fn test_toml_overrides_defaults() {
	// Arrange
	let file = write_toml(
		r#"
[thumbnails]
max_width = 200

[media]
url = "https://cdn.example.com/media/"
"#,
	);

	// Act
	let settings = SettingsBuilder::new()
		.add_source(TomlFileSource::new(file.path()))
		.build()
		.unwrap();

	// Assert
	assert_eq!(settings.thumbnails.max_width, 200);
	assert_eq!(settings.thumbnails.max_height, 500);
	assert_eq!(settings.media.url, "https://cdn.example.com/media/");
	assert_eq!(settings.server.port, 8000);
}

/// Test the environment wins over the file regardless of insertion order
#[test]
fn test_env_beats_file() {
	// Arrange
	let file = write_toml("[server]\nport = 7000\n");

	// Act
	let settings = SettingsBuilder::new()
		.add_source(EnvSource::from_vars([(
			"CHRONICLE_SERVER__PORT".to_string(),
			"9100".to_string(),
		)]))
		.add_source(TomlFileSource::new(file.path()))
		.build()
		.unwrap();

	// Assert
	assert_eq!(settings.server.port, 9100);
}

/// Test a missing optional file is ignored and a missing required one fails
#[rstest]
#[case(false, true)]
#[case(true, false)]
fn test_missing_file(#[case] required: bool, #[case] expect_ok: bool) {
	// Arrange
	let path = std::env::temp_dir().join("chronicle-missing-settings-file.toml");
	let source = if required {
		TomlFileSource::new(&path)
	} else {
		TomlFileSource::optional(&path)
	};

	// Act
	let result = SettingsBuilder::new().add_source(source).build();

	// Assert
	assert_eq!(result.is_ok(), expect_ok);
	if let Err(err) = result {
		assert!(matches!(err, ConfError::Io { .. }));
	}
}

/// Test validation runs after merging
#[test]
fn test_invalid_quality_is_rejected() {
	let result = SettingsBuilder::new()
		.add_source(EnvSource::from_vars([(
			"CHRONICLE_THUMBNAILS__QUALITY".to_string(),
			"0".to_string(),
		)]))
		.build();

	assert!(matches!(result, Err(ConfError::Invalid { .. })));
}
