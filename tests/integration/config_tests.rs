use drivedupe::config::{Config, ConfigError};
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("drivedupe.toml");
    fs::write(
        &config_path,
        r#"
hash_algorithm = "quickXorHash"
tasks_per_advance = 64
worker_threads = 8
requeue_failed = false
checkpoint_dir = "/srv/drivedupe"
"#,
    )
    .unwrap();

    let config = Config::load_from_path(Some(&config_path)).unwrap();
    assert_eq!(config.hash_algorithm, "quickXorHash");
    assert_eq!(config.tasks_per_advance, 64);
    assert_eq!(config.worker_threads, 8);
    assert!(!config.requeue_failed);
    assert_eq!(config.checkpoint_dir, Some(PathBuf::from("/srv/drivedupe")));
}

#[test]
fn test_config_partial_file_keeps_defaults() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("drivedupe.toml");
    fs::write(&config_path, "worker_threads = 4\n").unwrap();

    let config = Config::load_from_path(Some(&config_path)).unwrap();
    assert_eq!(config.worker_threads, 4);
    assert_eq!(config.hash_algorithm, "sha1Hash");
    assert_eq!(config.tasks_per_advance, 32);
}

#[test]
fn test_config_missing_file_uses_defaults() {
    let temp_dir = tempdir().unwrap();
    let absent = temp_dir.path().join("absent.toml");
    let config = Config::load_from_path(Some(&absent)).unwrap();
    assert_eq!(config.tasks_per_advance, Config::default().tasks_per_advance);
}

#[test]
fn test_config_rejects_zero_tasks() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("drivedupe.toml");
    fs::write(&config_path, "tasks_per_advance = 0\n").unwrap();

    let err = Config::load_from_path(Some(&config_path)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "tasks_per_advance", .. }));
}

#[test]
fn test_config_wrong_type_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("drivedupe.toml");
    let content = "worker_threads = \"many\"\n";
    fs::write(&config_path, content).unwrap();

    let err = Config::load_from_path(Some(&config_path)).unwrap_err();
    assert!(matches!(err, ConfigError::Extract(_)));
}

#[test]
fn test_config_env_overrides_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("drivedupe.toml");
    fs::write(&config_path, "budget_secs = 30\n").unwrap();

    std::env::set_var("DRIVEDUPE_BUDGET_SECS", "90");
    let config = Config::load_from_path(Some(&config_path));
    std::env::remove_var("DRIVEDUPE_BUDGET_SECS");

    let config = config.unwrap();
    assert_eq!(config.budget_secs, Some(90));
    assert_eq!(config.budget(), Some(std::time::Duration::from_secs(90)));
}

#[test]
fn test_config_save_toml() {
    let config = Config {
        worker_threads: 2,
        checkpoint_dir: Some(PathBuf::from("/tmp/dd")),
        ..Config::default()
    };
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("nested").join("drivedupe.toml");
    config.save_to(&path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("worker_threads = 2"));
    assert!(content.contains("hash_algorithm = \"sha1Hash\""));
    assert!(!content.contains("budget_secs"));

    let reread: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::string(&content))
        .extract()
        .unwrap();
    assert_eq!(reread, config);
}
