//! Property and boundary tests for recursive chunking.

use docqa_rag::{Chunker, Document, Fragment, RecursiveChunker};
use proptest::prelude::*;

fn texts(chunk_size: usize, text: &str) -> Vec<String> {
    RecursiveChunker::new(chunk_size).split(text).map(|f| f.text.to_string()).collect()
}

/// Rebuild the source from fragments plus the whitespace gaps between them.
fn reconstruct(text: &str, fragments: &[Fragment<'_>]) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for fragment in fragments {
        let gap = text.get(cursor..fragment.offset)?;
        if !gap.chars().all(char::is_whitespace) {
            return None;
        }
        out.push_str(gap);
        out.push_str(fragment.text);
        cursor = fragment.end();
    }
    let tail = text.get(cursor..)?;
    if !tail.chars().all(char::is_whitespace) {
        return None;
    }
    out.push_str(tail);
    Some(out)
}

mod prop_chunking {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn fragments_cover_source_and_respect_size(
            text in "[a-zA-Zé .!?\n]{0,400}",
            chunk_size in 1usize..60,
        ) {
            let fragments: Vec<Fragment<'_>> =
                RecursiveChunker::new(chunk_size).split(&text).collect();

            for fragment in &fragments {
                prop_assert!(!fragment.text.is_empty());
                prop_assert!(fragment.text.chars().count() <= chunk_size);
                prop_assert_eq!(fragment.text, fragment.text.trim());
                prop_assert_eq!(&text[fragment.offset..fragment.end()], fragment.text);
            }

            for pair in fragments.windows(2) {
                prop_assert!(pair[0].end() <= pair[1].offset, "fragments overlap");
            }

            prop_assert_eq!(reconstruct(&text, &fragments), Some(text.clone()));
        }

        #[test]
        fn production_size_bound_holds(text in "[a-z ,.\n]{0,3000}") {
            for fragment in RecursiveChunker::new(1000).split(&text) {
                prop_assert!(fragment.text.chars().count() <= 1000);
            }
        }
    }
}

#[test]
fn paragraphs_split_at_small_size() {
    assert_eq!(texts(2, "A.\n\nB.\n\nC."), vec!["A.", "B.", "C."]);
}

#[test]
fn text_of_exactly_chunk_size_is_one_fragment() {
    let text = "abcde fghij";
    assert_eq!(texts(11, text), vec![text]);
}

#[test]
fn one_character_over_splits_on_word_boundary() {
    assert_eq!(texts(10, "abcde fghij"), vec!["abcde", "fghij"]);
}

#[test]
fn small_pieces_are_merged_greedily() {
    assert_eq!(texts(7, "a b c d e f g h"), vec!["a b c d", "e f g h"]);
}

#[test]
fn unbreakable_run_is_hard_cut() {
    assert_eq!(texts(4, "abcdefghij"), vec!["abcd", "efgh", "ij"]);
}

#[test]
fn multibyte_text_is_cut_on_char_boundaries() {
    let out = texts(3, "привет мир");
    assert_eq!(out, vec!["при", "вет", "мир"]);
    assert!(out.iter().all(|s| s.chars().count() <= 3));
}

#[test]
fn empty_and_blank_input_yield_nothing() {
    assert!(texts(10, "").is_empty());
    assert!(texts(10, "  \n\n \t").is_empty());
}

#[test]
fn split_is_restartable_by_clone() {
    let text = "First paragraph here.\n\nSecond one follows.\n\nThird.";
    let splits = RecursiveChunker::new(25).split(text);
    let first: Vec<_> = splits.clone().collect();
    let second: Vec<_> = splits.collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[test]
fn chunker_assigns_ids_offsets_and_metadata() {
    let mut document = Document::new("faq", "Opening hours.\n\nReturn policy.");
    document.metadata.insert("source".to_string(), "faq.txt".to_string());

    let chunks = RecursiveChunker::new(15).chunk(&document);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].id, "faq_0");
    assert_eq!(chunks[1].id, "faq_1");
    assert_eq!(chunks[1].offset, 16);
    assert_eq!(chunks[1].text, "Return policy.");
    assert_eq!(chunks[1].metadata.get("chunk_index").map(String::as_str), Some("1"));
    assert_eq!(chunks[1].metadata.get("source").map(String::as_str), Some("faq.txt"));
    assert!(chunks.iter().all(|c| c.document_id == "faq" && c.embedding.is_empty()));
}
