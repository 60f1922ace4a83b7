use super::*;

fn texts(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

#[test]
fn from_parts_keeps_order_and_dimension() {
    let store = ChunkStore::from_parts(
        texts(&["first chunk", "second chunk"]),
        vec![vec![1.0, 0.0], vec![0.0, 1.0]],
    )
    .expect("should build store");

    assert_eq!(store.len(), 2);
    assert_eq!(store.dimension(), 2);
    assert_eq!(store.chunks()[0].text, "first chunk");
    assert_eq!(store.chunks()[1].embedding, vec![0.0, 1.0]);
    assert!(!store.is_empty());
}

#[test]
fn length_mismatch_is_rejected() {
    let result = ChunkStore::from_parts(texts(&["a", "b", "c"]), vec![vec![1.0], vec![1.0]]);
    assert!(matches!(result, Err(QaError::DimensionMismatch(_))));
}

#[test]
fn non_finite_components_are_rejected() {
    for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
        let result = ChunkStore::from_parts(
            texts(&["good", "bad"]),
            vec![vec![1.0, 0.0], vec![bad, 1.0]],
        );
        match result {
            Err(QaError::DimensionMismatch(message)) => assert!(message.contains("embedding 1")),
            other => panic!("expected a dimension mismatch, got {:?}", other),
        }
    }
}

#[test]
fn inconsistent_dimensions_are_rejected() {
    let result = ChunkStore::from_parts(
        texts(&["a", "b"]),
        vec![vec![1.0, 0.0, 0.0], vec![1.0, 0.0]],
    );
    assert!(matches!(result, Err(QaError::DimensionMismatch(_))));

    let result = ChunkStore::from_parts(texts(&["a"]), vec![Vec::new()]);
    assert!(matches!(result, Err(QaError::DimensionMismatch(_))));
}

#[test]
fn blank_chunks_are_filtered_with_their_embeddings() {
    let store = ChunkStore::from_parts(
        texts(&["  ", "kept text", "\n\t"]),
        vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]],
    )
    .expect("should build store");

    assert_eq!(store.len(), 1);
    assert_eq!(store.chunks()[0].text, "kept text");
    assert_eq!(store.chunks()[0].embedding, vec![2.0, 2.0]);
}

#[test]
fn filtering_everything_yields_empty_store() {
    let store = ChunkStore::from_parts(texts(&["", "   "]), vec![vec![1.0], vec![2.0]])
        .expect("should build store");

    assert!(store.is_empty());
    assert_eq!(store.dimension(), 0);
}

#[test]
fn failed_load_keeps_previous_corpus() {
    let mut store = ChunkStore::from_parts(texts(&["original"]), vec![vec![0.5, 0.5]])
        .expect("should build store");

    let result = store.load(texts(&["new", "corpus"]), vec![vec![1.0, 0.0]]);
    assert!(result.is_err());
    assert_eq!(store.len(), 1);
    assert_eq!(store.chunks()[0].text, "original");

    store
        .load(texts(&["replacement"]), vec![vec![1.0, 0.0, 0.0]])
        .expect("should load replacement");
    assert_eq!(store.len(), 1);
    assert_eq!(store.dimension(), 3);
    assert_eq!(store.chunks()[0].text, "replacement");
}

#[test]
fn empty_input_is_an_empty_store() {
    let store = ChunkStore::from_parts(Vec::new(), Vec::new()).expect("should build store");
    assert!(store.is_empty());
    assert_eq!(store.lexical_index().document_count(), 0);
}
