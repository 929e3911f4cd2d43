//! Property tests for the overlapping text splitter.

use flowdesk_rag::chunking::split_text;
use proptest::prelude::*;

/// Text drawn from words, sentence ends, paragraph breaks and multi-byte characters.
fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            "[a-z]{1,12}",
            Just(" ".to_string()),
            Just(". ".to_string()),
            Just("! ".to_string()),
            Just("\n\n".to_string()),
            Just("é".to_string()),
            Just("日本".to_string()),
        ],
        0..120,
    )
    .prop_map(|parts| parts.concat())
}

/// `(chunk_size, overlap)` with `overlap < chunk_size`.
fn arb_params() -> impl Strategy<Value = (usize, usize)> {
    (1usize..80).prop_flat_map(|size| (Just(size), 0..size))
}

mod prop_split_text {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn chunks_never_exceed_max_size(text in arb_text(), (size, overlap) in arb_params()) {
            for chunk in split_text(&text, size, overlap).unwrap() {
                prop_assert!(chunk.chars().count() <= size, "chunk {chunk:?} exceeds {size}");
            }
        }

        #[test]
        fn consecutive_chunks_share_exactly_the_overlap(
            text in arb_text(),
            (size, overlap) in arb_params(),
        ) {
            let chunks: Vec<&str> = split_text(&text, size, overlap).unwrap().collect();
            for pair in chunks.windows(2) {
                let prev: Vec<char> = pair[0].chars().collect();
                let next: Vec<char> = pair[1].chars().collect();
                prop_assert!(prev.len() > overlap);
                prop_assert_eq!(&prev[prev.len() - overlap..], &next[..overlap]);
            }
        }

        #[test]
        fn dropping_overlaps_reassembles_the_text(
            text in arb_text(),
            (size, overlap) in arb_params(),
        ) {
            let chunks: Vec<&str> = split_text(&text, size, overlap).unwrap().collect();
            let mut rebuilt = String::new();
            for (i, chunk) in chunks.iter().enumerate() {
                let skip = if i == 0 { 0 } else { overlap };
                rebuilt.extend(chunk.chars().skip(skip));
            }
            prop_assert_eq!(rebuilt, text);
        }

        #[test]
        fn short_text_is_a_single_chunk(text in arb_text()) {
            let len = text.chars().count();
            let chunks: Vec<&str> = split_text(&text, len.max(1), 0).unwrap().collect();
            if text.is_empty() {
                prop_assert!(chunks.is_empty());
            } else {
                prop_assert_eq!(chunks, vec![text.as_str()]);
            }
        }
    }
}

#[test]
fn default_sizes_split_long_prose() {
    let sentence = "Retrieval augmented generation grounds answers in documents. ";
    let text = sentence.repeat(40);
    let chunks: Vec<&str> = split_text(&text, 1000, 200).unwrap().collect();

    assert!(chunks.len() > 2);
    // Every cut but the last lands after a sentence end.
    for chunk in &chunks[..chunks.len() - 1] {
        assert!(chunk.ends_with(". "), "unexpected cut in {chunk:?}");
    }
}
