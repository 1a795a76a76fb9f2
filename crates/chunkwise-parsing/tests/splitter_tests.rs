//! Budget and ordering guarantees of the chunk splitter

use chunkwise_parsing::test_utils::WordCounter;
use chunkwise_parsing::{ChunkSplitter, TiktokenCounter, TokenCounter, TokenCounterRef};
use std::sync::Arc;

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sample_document() -> String {
    let mut doc = String::new();
    for i in 0..12 {
        doc.push_str(&format!(
            "Section {i} opens with a short claim. It then elaborates on the claim with \
             supporting detail, a counterpoint, and a brief conclusion. "
        ));
        if i % 4 == 0 {
            // A run-on paragraph that forces sentence-level splitting
            doc.push_str(&"Long sentences keep going and going without a break. ".repeat(30));
        }
        doc.push_str("\n\n");
    }
    // A pathological token with no spaces at all
    doc.push_str(&"x".repeat(600));
    doc
}

fn assert_budget_and_order(counter: TokenCounterRef, budget: usize) {
    let document = sample_document();
    let chunks = ChunkSplitter::new(Arc::clone(&counter))
        .split(&document, budget)
        .expect("split should succeed");

    assert!(!chunks.is_empty());
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.index, i);
        let actual = counter.count(&chunk.text);
        assert_eq!(chunk.token_count, actual, "chunk {i} token count is stale");
        assert!(actual <= budget, "chunk {i} has {actual} tokens, budget {budget}");
        assert!(!chunk.text.trim().is_empty(), "chunk {i} is blank");
    }

    // Every non-blank paragraph reappears in order once the chunks are rejoined
    let rejoined = normalize(
        &chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" "),
    );
    let mut cursor = 0;
    for paragraph in document.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        // Hard-split words gain a space at chunk seams, so compare a prefix
        let prefix: String = normalize(paragraph).chars().take(40).collect();
        let found = rejoined
            .get(cursor..)
            .and_then(|rest| rest.find(&prefix))
            .unwrap_or_else(|| panic!("paragraph starting {prefix:?} missing or out of order"));
        cursor += found + prefix.len();
    }
}

#[test]
fn test_word_counter_chunks_respect_budget_and_order() {
    assert_budget_and_order(Arc::new(WordCounter::new()), 40);
}

#[test]
fn test_tiktoken_chunks_respect_budget_and_order() {
    let counter = TiktokenCounter::new("gpt-3.5-turbo", 4000).expect("tokenizer");
    assert_budget_and_order(Arc::new(counter), 64);
}

#[test]
fn test_tiktoken_tiny_budget_still_fits() {
    let counter: TokenCounterRef =
        Arc::new(TiktokenCounter::new("gpt-4", 8000).expect("tokenizer"));
    let chunks = ChunkSplitter::new(Arc::clone(&counter))
        .split("Supercalifragilisticexpialidocious antidisestablishmentarianism", 2)
        .expect("split");

    assert!(chunks.len() > 2);
    for chunk in &chunks {
        assert!(counter.count(&chunk.text) <= 2);
    }
}

#[test]
fn test_three_paragraphs_of_fifty_tokens_with_budget_twenty() {
    let para = |words: usize, tag: &str| {
        (0..words)
            .map(|i| format!("{tag}{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    };
    let document = format!("{}\n\n{}\n\n{}", para(15, "a"), para(15, "b"), para(20, "c"));

    let counter: TokenCounterRef = Arc::new(WordCounter::new());
    assert_eq!(counter.count(&document), 50);

    let chunks = ChunkSplitter::new(counter).split(&document, 20).expect("split");
    let counts: Vec<_> = chunks.iter().map(|c| c.token_count).collect();
    assert_eq!(counts, vec![15, 15, 20]);
}

#[test]
fn test_splitting_is_deterministic() {
    let splitter = ChunkSplitter::new(Arc::new(WordCounter::new()));
    let document = sample_document();
    assert_eq!(
        splitter.split(&document, 25).expect("split"),
        splitter.split(&document, 25).expect("split")
    );
}
