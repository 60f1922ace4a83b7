use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.model, "nomic-embed-text:latest");
    assert_eq!(config.ollama.batch_size, 16);
    assert_eq!(config.ollama.max_tokens, 500);
    assert_eq!(config.retrieval.top_k, 5);
    assert_eq!(config.retrieval.answer_top_k, 3);
    assert_eq!(config.retrieval.semantic_weight, 0.7);
    assert_eq!(config.retrieval.bm25_weight, 0.3);
    assert_eq!(config.chunking.chunk_size, 1500);
    assert!(config.validate().is_ok());
}

#[test]
fn config_validation() {
    let config = Config::default();

    let mut invalid_config = config.clone();
    invalid_config.ollama.protocol = "ftp".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.completion_model = "  ".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.batch_size = 1001;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.temperature = f32::NAN;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.retrieval.top_k = 0;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidTopK(0))
    ));

    let mut invalid_config = config.clone();
    invalid_config.retrieval.bm25_weight = -0.1;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidWeight("bm25_weight", _))
    ));

    let mut invalid_config = config.clone();
    invalid_config.retrieval.semantic_weight = 0.0;
    invalid_config.retrieval.bm25_weight = 0.0;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::ZeroWeights)
    ));

    let mut invalid_config = config.clone();
    invalid_config.chunking.chunk_overlap = 1500;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::OverlapTooLarge(1500, 1500))
    ));

    let mut invalid_config = config;
    invalid_config.chunking.chunk_size = 50;
    assert!(invalid_config.validate().is_err());
}

#[test]
fn ollama_url_generation() {
    let config = Config::default();
    let url = config
        .ollama_url()
        .expect("should generate ollama_url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn partial_toml_uses_defaults() {
    let parsed: Config = toml::from_str(
        r#"
        [ollama]
        host = "gpu-box"

        [retrieval]
        top_k = 8
        "#,
    )
    .expect("should parse partial toml");

    assert_eq!(parsed.ollama.host, "gpu-box");
    assert_eq!(parsed.ollama.port, 11434);
    assert_eq!(parsed.retrieval.top_k, 8);
    assert_eq!(parsed.retrieval.bm25_weight, 0.3);
    assert_eq!(parsed.chunking, ChunkingConfig::default());
}

#[test]
fn setter_validation() {
    let mut config = OllamaConfig::default();

    assert!(config.set_protocol("https".to_string()).is_ok());
    assert!(config.set_host("example.com".to_string()).is_ok());
    assert!(config.set_port(8080).is_ok());
    assert!(config.set_model("new-model".to_string()).is_ok());
    assert!(config.set_completion_model("mistral".to_string()).is_ok());
    assert!(config.set_batch_size(128).is_ok());
    assert!(config.set_temperature(0.7).is_ok());

    assert!(config.set_protocol("HTTP".to_string()).is_err());
    assert!(config.set_port(0).is_err());
    assert!(config.set_model(String::new()).is_err());
    assert!(config.set_batch_size(0).is_err());
    assert!(config.set_temperature(3.0).is_err());
    assert_eq!(config.temperature, 0.7);
    assert_eq!(config.completion_model, "mistral");
}

#[test]
fn retrieval_setters_and_params() {
    let mut retrieval = RetrievalConfig::default();

    assert!(retrieval.set_weights(0.5, 0.5).is_ok());
    assert!(retrieval.set_weights(1.5, 0.5).is_err());
    assert!(retrieval.set_top_k(10).is_ok());
    assert!(retrieval.set_top_k(0).is_err());

    let search = retrieval.search_params();
    assert_eq!(search.top_k, 10);
    assert_eq!(search.semantic_weight, 0.5);
    assert_eq!(retrieval.answer_params().top_k, 3);
    assert_eq!(retrieval.answer_params().bm25_weight, 0.5);
}

#[test]
fn load_missing_config_returns_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("should load defaults");

    assert_eq!(config.base_dir, temp_dir.path());
    assert_eq!(config.ollama, OllamaConfig::default());
    assert_eq!(config.database_path(), temp_dir.path().join("chunks.db"));
    assert_eq!(config.sessions_dir(), temp_dir.path().join("chat_history"));
}

#[test]
fn save_then_load() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config::load(temp_dir.path().join("nested")).expect("should load defaults");
    config.ollama.host = "remote.ollama.com".to_string();
    config.retrieval.answer_top_k = 4;

    config.save().expect("should save");
    assert!(temp_dir.path().join("nested/config.toml").exists());

    let loaded = Config::load(temp_dir.path().join("nested")).expect("should load saved");
    assert_eq!(loaded, config);
}

#[test]
fn invalid_file_fails_to_load() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[retrieval]\ntop_k = 0\n",
    )
    .expect("should write config");

    assert!(Config::load(temp_dir.path()).is_err());
}
