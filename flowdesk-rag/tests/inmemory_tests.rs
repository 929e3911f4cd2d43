//! Property tests for in-memory vector index search ordering.

use flowdesk_rag::document::{Chunk, Document, Metadata};
use flowdesk_rag::inmemory::InMemoryVectorIndex;
use flowdesk_rag::vectorstore::{IndexEntry, VectorIndex};
use flowdesk_rag::RagError;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

fn entries(vectors: Vec<Vec<f32>>) -> Vec<IndexEntry> {
    let doc = Document::new("source", Metadata::new());
    vectors
        .into_iter()
        .enumerate()
        .map(|(i, v)| IndexEntry::new(Chunk::new(format!("chunk {i}"), &doc, i), v))
        .collect()
}

/// Searching returns results in descending score order, and the number of
/// results is `min(top_k, stored)`.
mod prop_inmemory_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            vectors in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let stored = vectors.len();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let index = InMemoryVectorIndex::new();
                index.insert(entries(vectors)).await.unwrap();
                index.search(&query, top_k).await.unwrap()
            });

            prop_assert_eq!(results.len(), top_k.min(stored));
            for pair in results.windows(2) {
                prop_assert!(
                    pair[0].score >= pair[1].score,
                    "results not in descending order: {} < {}",
                    pair[0].score,
                    pair[1].score
                );
            }
        }
    }
}

/// Entries with identical vectors score identically and come back in
/// insertion order.
mod prop_inmemory_tie_order {
    use super::*;

    const DIM: usize = 8;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn equal_scores_keep_insertion_order(
            vector in arb_normalized_embedding(DIM),
            copies in 2usize..12,
            top_k in 1usize..16,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let index = InMemoryVectorIndex::new();
                index.insert(entries(vec![vector.clone(); copies])).await.unwrap();
                index.search(&vector, top_k).await.unwrap()
            });

            let order: Vec<usize> = results.iter().map(|r| r.chunk.index).collect();
            let expected: Vec<usize> = (0..copies.min(top_k)).collect();
            prop_assert_eq!(order, expected);
        }
    }
}

#[tokio::test]
async fn search_after_reset_is_empty_index() {
    let index = InMemoryVectorIndex::new();
    index.insert(entries(vec![vec![1.0, 0.0], vec![0.0, 1.0]])).await.unwrap();
    assert_eq!(index.stats().await.chunk_count, 2);

    index.reset().await;
    assert!(matches!(index.search(&[1.0, 0.0], 1).await, Err(RagError::EmptyIndex)));

    // A fresh index may take a new dimensionality.
    index.insert(entries(vec![vec![1.0, 0.0, 0.0]])).await.unwrap();
    assert_eq!(index.stats().await.dimensions, Some(3));
}
