use super::*;

const QUERY: &str = "What is the capital of France?";

fn capitals_store() -> ChunkStore {
    ChunkStore::from_parts(
        vec![
            "Paris is the capital of France.".to_string(),
            "The Eiffel Tower is in Paris.".to_string(),
            "Berlin is the capital of Germany.".to_string(),
        ],
        vec![
            vec![0.9, 0.1, 0.0],
            vec![0.8, 0.2, 0.0],
            vec![0.1, 0.0, 0.9],
        ],
    )
    .expect("should build store")
}

fn indices(results: &[ScoredChunk]) -> Vec<usize> {
    results.iter().map(|r| r.index).collect()
}

#[test]
fn capital_of_france_ranks_paris_first() {
    let store = capitals_store();
    let params = RankParams::default().with_top_k(2).with_weights(0.7, 0.3);

    let results = rank(&store, QUERY, &[1.0, 0.0, 0.0], &params).expect("should rank");

    assert_eq!(indices(&results), vec![0, 1]);
    assert!(results[0].combined_score > results[1].combined_score);
    assert!(results[0].lexical_score > 0.0);
    assert!(results[0].semantic_score > results[1].semantic_score);
}

#[test]
fn ranking_is_deterministic() {
    let store = capitals_store();
    let params = RankParams::default();
    let first = rank(&store, QUERY, &[1.0, 0.0, 0.0], &params).expect("should rank");

    for _ in 0..10 {
        let again = rank(&store, QUERY, &[1.0, 0.0, 0.0], &params).expect("should rank");
        assert_eq!(first, again);
    }
}

#[test]
fn equal_combined_scores_keep_index_order() {
    let store = ChunkStore::from_parts(
        vec![
            "same text".to_string(),
            "unrelated words".to_string(),
            "same text".to_string(),
        ],
        vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]],
    )
    .expect("should build store");

    let results = rank(&store, "same", &[1.0, 0.0], &RankParams::default()).expect("should rank");

    assert_eq!(indices(&results), vec![0, 2, 1]);
    assert_eq!(results[0].combined_score, results[1].combined_score);
}

#[test]
fn weights_shift_the_ranking() {
    let store = capitals_store();
    // The embedding favours the Berlin chunk while the words favour Paris
    let query_embedding = [0.1, 0.0, 0.9];

    let semantic_only = RankParams::default().with_top_k(1).with_weights(1.0, 0.0);
    let lexical_only = RankParams::default().with_top_k(1).with_weights(0.0, 1.0);

    let results = rank(&store, QUERY, &query_embedding, &semantic_only).expect("should rank");
    assert_eq!(indices(&results), vec![2]);

    let results = rank(&store, QUERY, &query_embedding, &lexical_only).expect("should rank");
    assert_eq!(indices(&results), vec![0]);
}

#[test]
fn chunk_outside_semantic_candidates_scores_zero_for_that_half() {
    let mut texts: Vec<String> = (0..29).map(|i| format!("filler text number {}", i)).collect();
    texts.push("a unique zebra sighting".to_string());
    let mut embeddings: Vec<Vec<f32>> = (0..29).map(|i| vec![1.0, i as f32 * 0.01]).collect();
    embeddings.push(vec![-1.0, 0.0]);
    let store = ChunkStore::from_parts(texts, embeddings).expect("should build store");

    let params = RankParams::default().with_top_k(1).with_weights(0.0, 1.0);
    let results = rank(&store, "zebra", &[1.0, 0.0], &params).expect("should rank");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].index, 29);
    assert_eq!(results[0].semantic_score, 0.0);
    assert!(results[0].lexical_score > 0.0);
    assert!((results[0].combined_score - 1.0).abs() < 1e-6);
}

#[test]
fn top_k_truncates() {
    let store = capitals_store();
    let params = RankParams::default().with_top_k(1);
    let results = rank(&store, QUERY, &[1.0, 0.0, 0.0], &params).expect("should rank");
    assert_eq!(results.len(), 1);

    let params = RankParams::default().with_top_k(10);
    let results = rank(&store, QUERY, &[1.0, 0.0, 0.0], &params).expect("should rank");
    assert_eq!(results.len(), 3);
}

#[test]
fn invalid_parameters_are_rejected() {
    let store = capitals_store();
    let embedding = [1.0, 0.0, 0.0];

    let zero_k = RankParams::default().with_top_k(0);
    assert!(matches!(
        rank(&store, QUERY, &embedding, &zero_k),
        Err(QaError::InvalidParameters(_))
    ));

    let negative = RankParams::default().with_weights(-0.1, 0.3);
    assert!(matches!(
        rank(&store, QUERY, &embedding, &negative),
        Err(QaError::InvalidParameters(_))
    ));

    let nan = RankParams::default().with_weights(0.7, f32::NAN);
    assert!(nan.validate().is_err());
}

#[test]
fn empty_store_searches_to_no_documents() {
    let outcome = search(&ChunkStore::new(), QUERY, &[1.0], &RankParams::default())
        .expect("should search");

    assert_eq!(outcome, RetrievalOutcome::NoDocuments);
    assert!(outcome.passages().is_empty());
    assert!(
        rank(&ChunkStore::new(), QUERY, &[1.0], &RankParams::default())
            .expect("should rank")
            .is_empty()
    );
}

#[test]
fn non_prose_chunks_are_dropped_after_ranking() {
    let store = ChunkStore::from_parts(
        vec![
            "OCRPageObject(index=0, markdown='capital of France', images=[])".to_string(),
            "Paris is the capital of France.".to_string(),
        ],
        vec![vec![1.0, 0.0], vec![0.9, 0.1]],
    )
    .expect("should build store");

    let outcome = search(&store, QUERY, &[1.0, 0.0], &RankParams::default()).expect("should search");

    let passages = outcome.passages();
    assert_eq!(passages.len(), 1);
    assert_eq!(passages[0].index, 1);
}

#[test]
fn filtering_everything_reports_no_relevant_passages() {
    let store = ChunkStore::from_parts(
        vec![
            "dimensions=OCRPageDimensions(dpi=200, height=2200, width=1700)".to_string(),
            "image_annotation=None".to_string(),
        ],
        vec![vec![1.0, 0.0], vec![0.0, 1.0]],
    )
    .expect("should build store");

    let outcome = search(&store, "dimensions", &[1.0, 0.0], &RankParams::default())
        .expect("should search");

    assert_eq!(outcome, RetrievalOutcome::NoRelevantPassages);
    assert!(outcome.into_passages().is_empty());
}

#[test]
fn marker_detection() {
    assert!(contains_non_prose_marker("pages=[OCRPageObject(index=1)]"));
    assert!(contains_non_prose_marker("image_annotation=None"));
    assert!(!contains_non_prose_marker("A regular sentence about dimensions."));
}
