use super::config_summary;
use super::load_existing_config as load_existing_config_impl;
use crate::config::Config;
use tempfile::TempDir;

#[test]
fn load_existing_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = load_existing_config_impl(temp_dir.path()).expect("config loaded successfully");

    assert_eq!(config.base_dir, temp_dir.path());
    assert!(!config.ollama.host.is_empty());
    assert!(config.ollama.port > 0);
    assert!(!config.ollama.model.is_empty());
    assert!(config.ollama.batch_size > 0);
}

#[test]
fn unreadable_config_falls_back_to_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(temp_dir.path().join("config.toml"), "[ollama\n").expect("should write");

    let config = load_existing_config_impl(temp_dir.path()).expect("config loaded successfully");
    assert_eq!(config.ollama, Config::default().ollama);
}

#[test]
fn summary_lists_every_section() {
    let summary = config_summary(&Config::default());

    assert!(summary.contains("Ollama Settings:"));
    assert!(summary.contains("  Embedding Model: nomic-embed-text:latest"));
    assert!(summary.contains("  Semantic Weight: 0.7"));
    assert!(summary.contains("  BM25 Weight: 0.3"));
    assert!(summary.contains("  Chunk Size: 1500"));
}
