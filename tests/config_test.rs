//! Tests for layered settings loading

use std::path::PathBuf;

use tempfile::TempDir;

use bpcli::application::ApplicationError;
use bpcli::config::Settings;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("bpcli.toml");
    std::fs::write(&path, content).expect("write config");
    path
}

#[test]
fn given_config_file_when_loading_then_values_override_defaults() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("store.json");
    let path = write_config(
        &temp,
        &format!(
            "data_file = {:?}\nlist_count = 5\n\n[components]\nmessages = false\n",
            data.display().to_string()
        ),
    );

    let settings = Settings::load(Some(&path)).unwrap();

    assert_eq!(settings.data_file, data);
    assert_eq!(settings.list_count, 5);
    assert_eq!(settings.generate_count, 20);
    assert!(settings.components.signups);
    assert!(!settings.components.messages);
}

#[test]
fn given_missing_config_file_when_loading_then_config_error() {
    let temp = TempDir::new().unwrap();

    let err = Settings::load(Some(&temp.path().join("absent.toml"))).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
}

#[test]
fn given_malformed_config_when_loading_then_config_error() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, "list_count = \"many\"\n");

    let err = Settings::load(Some(&path)).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
}

#[test]
fn given_settings_when_rendering_toml_then_reloadable() {
    let temp = TempDir::new().unwrap();
    let path = write_config(&temp, "generate_count = 7\n");
    let settings = Settings::load(Some(&path)).unwrap();

    let rendered = settings.to_toml().unwrap();
    let reloaded_path = write_config(&temp, &rendered);
    let reloaded = Settings::load(Some(&reloaded_path)).unwrap();

    assert!(rendered.contains("generate_count = 7"));
    assert_eq!(reloaded, settings);
}
