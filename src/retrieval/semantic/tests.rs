use super::*;

fn store(embeddings: Vec<Vec<f32>>) -> ChunkStore {
    let chunks = (0..embeddings.len())
        .map(|i| format!("chunk {}", i))
        .collect();
    ChunkStore::from_parts(chunks, embeddings).expect("should build store")
}

#[test]
fn cosine_of_identical_and_orthogonal_vectors() {
    let same = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
    assert!((same - 1.0).abs() < 1e-5);

    let orthogonal = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]);
    assert!(orthogonal.abs() < 1e-6);

    let opposite = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
    assert!((opposite + 1.0).abs() < 1e-5);
}

#[test]
fn zero_vectors_score_zero() {
    let score = cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]);
    assert_eq!(score, 0.0);
    assert!(!cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]).is_nan());
}

#[test]
fn ranks_by_descending_similarity() {
    let store = store(vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.7, 0.7]]);
    let ranking = rank(&[1.0, 0.0], &store, 3).expect("should rank");

    let order: Vec<usize> = ranking.iter().map(|(index, _)| *index).collect();
    assert_eq!(order, vec![1, 2, 0]);
}

#[test]
fn ties_break_by_ascending_index() {
    let store = store(vec![
        vec![1.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 0.0],
    ]);
    let ranking = rank(&[1.0, 0.0], &store, 4).expect("should rank");

    let order: Vec<usize> = ranking.iter().map(|(index, _)| *index).collect();
    assert_eq!(order, vec![0, 2, 3, 1]);
}

#[test]
fn partial_selection_matches_full_sort() {
    let embeddings: Vec<Vec<f32>> = (0..50)
        .map(|i| {
            let angle = (i % 7) as f32 * 0.3;
            vec![angle.cos(), angle.sin()]
        })
        .collect();
    let store = store(embeddings);
    let query = [1.0, 0.2];

    let full = rank(&query, &store, store.len()).expect("should rank");
    let partial = rank(&query, &store, 5).expect("should rank");

    assert_eq!(partial.len(), 5);
    assert_eq!(partial.as_slice(), &full[..5]);
}

#[test]
fn k_larger_than_corpus_returns_everything() {
    let store = store(vec![vec![1.0], vec![2.0]]);
    let ranking = rank(&[1.0], &store, 10).expect("should rank");
    assert_eq!(ranking.len(), 2);
}

#[test]
fn empty_store_returns_empty_ranking() {
    let ranking = rank(&[1.0, 0.0, 0.0], &ChunkStore::new(), 5).expect("should rank");
    assert!(ranking.is_empty());
}

#[test]
fn query_dimension_mismatch_is_an_error() {
    let store = store(vec![vec![1.0, 0.0]]);
    let result = rank(&[1.0, 0.0, 0.0], &store, 1);
    assert!(matches!(result, Err(QaError::DimensionMismatch(_))));
}
