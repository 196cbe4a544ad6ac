use std::path::Path;

use super::{Config, ConfigError};
use crate::paths::DirectoryLayout;

fn temp_layout() -> DirectoryLayout {
    DirectoryLayout::new(std::env::temp_dir().join(format!(
        "pilgrim-config-{}",
        uuid::Uuid::now_v7()
    )))
}

#[test]
fn missing_file_is_created_with_defaults() {
    let layout = temp_layout();
    let config = Config::load_or_create(&layout).expect("config should load");

    assert!(layout.config_path().exists());
    assert_eq!(config.database.kind, "sqlite");
    assert_eq!(
        config.database.url,
        layout.default_database_path().display().to_string()
    );
    assert_eq!(config.auto_open_diary(), None);
    assert!(!config.settings.diary.auto_open_on_creation);

    let _ = std::fs::remove_dir_all(layout.home());
}

#[test]
fn saved_settings_survive_reload() {
    let layout = temp_layout();
    let mut config = Config::load_or_create(&layout).expect("config should load");
    config.settings.diary.auto_open_diary_on_startup = "porto".to_string();
    config.settings.diary.auto_open_on_creation = true;
    config.save(&layout.config_path()).expect("config should save");

    let reloaded = Config::load_or_create(&layout).expect("config should reload");
    assert_eq!(reloaded, config);
    assert_eq!(reloaded.auto_open_diary(), Some("porto"));

    let _ = std::fs::remove_dir_all(layout.home());
}

#[test]
fn partial_file_falls_back_to_defaults() {
    let raw = r#"
[settings.diary]
auto_open_on_creation = true
"#;
    let config = Config::from_toml(raw, Path::new("config.toml")).expect("partial config");
    assert!(config.settings.diary.auto_open_on_creation);
    assert_eq!(config.database.kind, "sqlite");
    assert!(config.database.url.is_empty());
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = Config::from_toml("[database\nurl = 3", Path::new("config.toml"))
        .expect_err("malformed toml should fail");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn unknown_database_types_are_rejected() {
    let raw = r#"
[database]
url = "postgres://localhost/pilgrim"
type = "postgres"
"#;
    let err = Config::from_toml(raw, Path::new("config.toml")).expect_err("postgres rejected");
    assert!(matches!(err, ConfigError::UnsupportedDatabase(kind) if kind == "postgres"));
}

#[test]
fn memory_database_type_is_accepted() {
    let raw = r#"
[database]
type = "memory"
"#;
    let config = Config::from_toml(raw, Path::new("config.toml")).expect("memory accepted");
    assert_eq!(config.database.kind, "memory");
    assert!(config.database.url.is_empty());
}
