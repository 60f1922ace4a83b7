use super::*;

#[test]
fn client_configuration() {
    let config = OllamaConfig {
        protocol: "http".to_string(),
        host: "test-host".to_string(),
        port: 1234,
        model: "test-model".to_string(),
        completion_model: "test-llm".to_string(),
        batch_size: 128,
        temperature: 0.5,
        max_tokens: 42,
        timeout_seconds: 10,
    };
    let client = OllamaClient::new(&config).expect("Failed to create client");

    assert_eq!(client.model, "test-model");
    assert_eq!(client.completion_model, "test-llm");
    assert_eq!(client.max_tokens, 42);
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn client_builder_methods() {
    let client = OllamaClient::new(&OllamaConfig::default())
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(5)
        .with_backoff_unit(Duration::from_millis(1));

    assert_eq!(client.retry_attempts, 5);
    assert_eq!(client.backoff_unit, Duration::from_millis(1));

    let client = client.with_retry_attempts(0);
    assert_eq!(client.retry_attempts, 1);
}

#[test]
fn generate_request_shape() {
    let request = GenerateRequest {
        model: "llama3.2",
        prompt: "Question?",
        stream: false,
        options: GenerateOptions {
            temperature: 0.25,
            num_predict: 500,
        },
    };

    let json = serde_json::to_value(&request).expect("should serialize");
    assert_eq!(json["model"], "llama3.2");
    assert_eq!(json["prompt"], "Question?");
    assert_eq!(json["stream"], false);
    assert_eq!(json["options"]["num_predict"], 500);
    assert_eq!(json["options"]["temperature"], 0.25);
}

#[test]
fn embed_request_uses_input_field() {
    let texts = vec!["a".to_string(), "b".to_string()];
    let request = EmbedRequest {
        model: "nomic-embed-text:latest",
        input: &texts,
    };

    let json = serde_json::to_value(&request).expect("should serialize");
    assert_eq!(json["input"], serde_json::json!(["a", "b"]));
}

#[test]
fn empty_batch_needs_no_server() {
    let client = OllamaClient::new(&OllamaConfig::default()).expect("Failed to create client");
    let embeddings = client
        .generate_embeddings(&[])
        .expect("empty input should succeed");
    assert!(embeddings.is_empty());
}
